//! Model Readiness State
//!
//! Tri-state-plus-failure readiness for the loaded store. The store
//! reference is published exactly once; afterwards every query path does
//! a cheap read of the same `Arc`.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::warn;

use crate::error::{LoadError, QueryError};
use crate::vocab::VectorStore;

/// Lifecycle of the model.
#[derive(Clone)]
pub enum LoadPhase {
    NotStarted,
    Loading,
    Ready(Arc<VectorStore>),
    Failed(Arc<LoadError>),
}

impl LoadPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadPhase::NotStarted => "not_started",
            LoadPhase::Loading => "loading",
            LoadPhase::Ready(_) => "ready",
            LoadPhase::Failed(_) => "failed",
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, LoadPhase::Ready(_) | LoadPhase::Failed(_))
    }
}

/// Shared readiness cell. Handlers read it on every request; the loader
/// writes it twice at most (`Loading`, then one terminal phase).
pub struct ModelState {
    phase: RwLock<LoadPhase>,
}

impl Default for ModelState {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelState {
    pub fn new() -> Self {
        Self {
            phase: RwLock::new(LoadPhase::NotStarted),
        }
    }

    /// Mark the state as loading. Returns false if a load already began;
    /// loading happens at most once per process.
    pub fn begin_loading(&self) -> bool {
        let mut phase = self.phase.write();
        if matches!(*phase, LoadPhase::NotStarted) {
            *phase = LoadPhase::Loading;
            true
        } else {
            warn!(phase = phase.as_str(), "ignoring duplicate load request");
            false
        }
    }

    /// Publish the loaded store. One-shot: a terminal phase never changes.
    pub fn publish(&self, store: VectorStore) {
        let mut phase = self.phase.write();
        if phase.is_terminal() {
            warn!(phase = phase.as_str(), "ignoring publish after terminal phase");
            return;
        }
        *phase = LoadPhase::Ready(Arc::new(store));
    }

    /// Record a failed load. One-shot, same as `publish`.
    pub fn fail(&self, error: LoadError) {
        let mut phase = self.phase.write();
        if phase.is_terminal() {
            warn!(phase = phase.as_str(), "ignoring failure after terminal phase");
            return;
        }
        *phase = LoadPhase::Failed(Arc::new(error));
    }

    /// The store, or `Unavailable` for every non-ready phase. A failed
    /// load keeps answering `Unavailable` so queries fail predictably.
    pub fn store(&self) -> Result<Arc<VectorStore>, QueryError> {
        match &*self.phase.read() {
            LoadPhase::Ready(store) => Ok(store.clone()),
            _ => Err(QueryError::Unavailable),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.phase.read(), LoadPhase::Ready(_))
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_store() -> VectorStore {
        VectorStore::from_rows(vec!["cat".to_string()], vec![1.0, 0.0], 2).unwrap()
    }

    #[test]
    fn test_unavailable_before_publish() {
        let state = ModelState::new();
        assert!(!state.is_ready());
        assert_eq!(state.store().unwrap_err(), QueryError::Unavailable);

        state.begin_loading();
        assert!(!state.is_ready());
        assert_eq!(state.store().unwrap_err(), QueryError::Unavailable);
    }

    #[test]
    fn test_publish_makes_ready() {
        let state = ModelState::new();
        state.begin_loading();
        state.publish(tiny_store());

        assert!(state.is_ready());
        let store = state.store().unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(state.phase().as_str(), "ready");
    }

    #[test]
    fn test_failed_load_stays_unavailable() {
        let state = ModelState::new();
        state.begin_loading();
        state.fail(LoadError::EmptyVocabulary);

        assert!(!state.is_ready());
        assert_eq!(state.store().unwrap_err(), QueryError::Unavailable);
        assert_eq!(state.phase().as_str(), "failed");
    }

    #[test]
    fn test_publish_is_one_shot() {
        let state = ModelState::new();
        state.begin_loading();
        state.publish(tiny_store());

        // A late failure must not displace the published store.
        state.fail(LoadError::EmptyVocabulary);
        assert!(state.is_ready());
    }

    #[test]
    fn test_begin_loading_once() {
        let state = ModelState::new();
        assert!(state.begin_loading());
        assert!(!state.begin_loading());
    }
}

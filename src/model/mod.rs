//! Model Module
//!
//! Readiness state, load orchestration, and artifact fetching.

mod fetch;
mod state;

pub use fetch::{FetchConfig, FetchError, ModelFetcher};
pub use state::{LoadPhase, ModelState};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info};

use crate::error::LoadError;
use crate::vocab::{load_npy, load_text, VectorStore};

/// Where a model is loaded from.
#[derive(Debug, Clone)]
pub enum ModelSource {
    /// Vocabulary index file + NumPy vector matrix.
    Npy { vocab: PathBuf, vectors: PathBuf },
    /// Single GloVe text file.
    Text { path: PathBuf },
}

impl ModelSource {
    /// Blocking parse of the source files.
    pub fn load(&self) -> Result<VectorStore, LoadError> {
        match self {
            ModelSource::Npy { vocab, vectors } => load_npy(vocab, vectors),
            ModelSource::Text { path } => load_text(path),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ModelSource::Npy { vocab, vectors } => {
                format!("{} + {}", vocab.display(), vectors.display())
            }
            ModelSource::Text { path } => path.display().to_string(),
        }
    }
}

/// Load `source` on a blocking task and publish the outcome into `state`.
///
/// Loading is not cancellable; it runs to `Ready` or `Failed`. The caller
/// chooses whether to await this before serving traffic or to spawn it
/// and serve `Unavailable` responses until it finishes.
pub async fn load_model(state: Arc<ModelState>, source: ModelSource) {
    if !state.begin_loading() {
        return;
    }

    info!(source = %source.describe(), "loading model");
    let started = Instant::now();

    let result = tokio::task::spawn_blocking(move || source.load()).await;

    match result {
        Ok(Ok(store)) => {
            info!(
                vocabulary = store.len(),
                dimension = store.dimension(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "model loaded"
            );
            state.publish(store);
        }
        Ok(Err(err)) => {
            error!(error = %err, "model load failed");
            state.fail(err);
        }
        Err(join_err) => {
            error!(error = %join_err, "model load task panicked");
            state.fail(LoadError::Malformed(format!(
                "load task aborted: {}",
                join_err
            )));
        }
    }
}

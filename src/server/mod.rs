//! Server Module
//!
//! HTTP server for the embedding API.

mod config;
mod routes;

pub use config::Config;
pub use routes::{build_router, AppState};

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::model::{self, ModelSource, ModelState};

/// Embedding API server.
///
/// Owns the composition root: the readiness cell, the metrics and health
/// registries, and the router. The model loads once, either before the
/// listener starts (`preload`) or in the background while early requests
/// get unavailable responses.
pub struct Server {
    config: Config,
    model: Arc<ModelState>,
}

impl Server {
    /// Create a new server with the given configuration
    pub fn new(config: Config) -> Self {
        Self {
            config,
            model: Arc::new(ModelState::new()),
        }
    }

    /// Run the server, loading the model from `source`.
    pub async fn run(self, source: ModelSource) -> std::io::Result<()> {
        let addr = format!("{}:{}", self.config.bind, self.config.port);

        if self.config.preload {
            model::load_model(self.model.clone(), source).await;
        } else {
            tokio::spawn(model::load_model(self.model.clone(), source));
        }

        let state = AppState::new(self.config.clone(), self.model.clone());
        let router = build_router(state);

        let listener = TcpListener::bind(&addr).await?;
        info!("lexivec server listening on {}", addr);

        axum::serve(listener, router).await
    }

    /// Get the model state (for testing)
    pub fn model(&self) -> Arc<ModelState> {
        self.model.clone()
    }
}

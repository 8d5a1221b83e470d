//! Model Fetcher
//!
//! Downloads model artifacts into a local cache directory before the
//! loader runs. Retries are bounded with a fixed backoff; readiness is
//! not touched here, the caller decides what a failed fetch means.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("server answered {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("giving up on {url} after {attempts} attempts")]
    Exhausted { url: String, attempts: u32 },
}

/// Fetcher configuration.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Base URL the artifact file names are appended to.
    pub base_url: String,
    /// Local cache directory; present files are never re-downloaded.
    pub cache_dir: PathBuf,
    /// Artifact file names to fetch.
    pub files: Vec<String>,
    /// Download attempts per file.
    pub max_attempts: u32,
    /// Fixed pause between attempts.
    pub retry_backoff: Duration,
}

impl FetchConfig {
    pub fn new(base_url: impl Into<String>, files: Vec<String>) -> Self {
        Self {
            base_url: base_url.into(),
            cache_dir: PathBuf::from("./model_cache"),
            files,
            max_attempts: 3,
            retry_backoff: Duration::from_secs(2),
        }
    }

    pub fn with_cache_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }
}

/// Downloads model artifacts with bounded retries.
pub struct ModelFetcher {
    config: FetchConfig,
    client: reqwest::Client,
}

impl ModelFetcher {
    pub fn new(config: FetchConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Make every configured artifact available locally, downloading the
    /// missing ones. Returns the local paths in configuration order.
    pub async fn ensure_local(&self) -> Result<Vec<PathBuf>, FetchError> {
        let mut paths = Vec::with_capacity(self.config.files.len());
        for name in &self.config.files {
            paths.push(self.ensure_file(name).await?);
        }
        Ok(paths)
    }

    async fn ensure_file(&self, name: &str) -> Result<PathBuf, FetchError> {
        let dest = self.config.cache_dir.join(name);
        if dest.exists() {
            debug!(file = name, "artifact already cached");
            return Ok(dest);
        }

        tokio::fs::create_dir_all(&self.config.cache_dir).await?;

        let url = format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            name
        );

        let mut last_err = None;
        for attempt in 1..=self.config.max_attempts {
            match self.download(&url, &dest).await {
                Ok(()) => {
                    info!(file = name, attempt, "artifact downloaded");
                    return Ok(dest);
                }
                Err(err) => {
                    warn!(file = name, attempt, error = %err, "download failed");
                    last_err = Some(err);
                    if attempt < self.config.max_attempts {
                        tokio::time::sleep(self.config.retry_backoff).await;
                    }
                }
            }
        }

        Err(last_err.unwrap_or(FetchError::Exhausted {
            url,
            attempts: self.config.max_attempts,
        }))
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body: bytes::Bytes = response.bytes().await?;

        // Write through a temp name so a partial download never looks
        // like a cached artifact.
        let tmp = dest.with_extension("part");
        tokio::fs::write(&tmp, &body).await?;
        tokio::fs::rename(&tmp, dest).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_cached_files_skip_network() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("model.vocab"), "cat\n").unwrap();
        std::fs::write(dir.path().join("model.npy"), b"data").unwrap();

        // Unroutable base URL: any network attempt would fail.
        let config = FetchConfig::new(
            "http://127.0.0.1:1",
            vec!["model.vocab".to_string(), "model.npy".to_string()],
        )
        .with_cache_dir(dir.path());

        let fetcher = ModelFetcher::new(config);
        let paths = fetcher.ensure_local().await.unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths.iter().all(|p| p.exists()));
    }

    #[tokio::test]
    async fn test_unreachable_host_exhausts_attempts() {
        let dir = tempdir().unwrap();
        let config = FetchConfig::new("http://127.0.0.1:1", vec!["model.npy".to_string()])
            .with_cache_dir(dir.path())
            .with_max_attempts(2)
            .with_retry_backoff(Duration::ZERO);

        let fetcher = ModelFetcher::new(config);
        let result = fetcher.ensure_local().await;
        assert!(result.is_err());
        assert!(!dir.path().join("model.npy").exists());
    }
}

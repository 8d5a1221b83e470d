//! Error Taxonomy
//!
//! Closed error types for model loading and query handling.

use std::io;
use thiserror::Error;

/// Errors raised while loading a model from disk.
///
/// Any of these leaves the store absent; the service keeps answering
/// `Unavailable` to queries.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed model data: {0}")]
    Malformed(String),

    #[error("unsupported vector dtype '{0}' (expected '<f4' or '<f8')")]
    UnsupportedDtype(String),

    #[error("dimension mismatch at line {line}: expected {expected} components, got {got}")]
    DimensionMismatch {
        line: usize,
        expected: usize,
        got: usize,
    },

    #[error("vocabulary has {vocab} tokens but vector matrix has {rows} rows")]
    ShapeMismatch { vocab: usize, rows: usize },

    #[error("empty vocabulary")]
    EmptyVocabulary,
}

/// Per-request errors for lookup and similarity queries.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    /// Token absent from the vocabulary. Not fatal; surfaced per request.
    #[error("word '{0}' not found in vocabulary")]
    NotFound(String),

    /// Caller-supplied parameters rejected before computation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Store not loaded (still loading, or load failed). Transient from
    /// the caller's point of view.
    #[error("model is not available")]
    Unavailable,
}

//! LEXIVEC - Word Embedding Vector Server
//!
//! Serves pre-computed word-embedding vectors and their nearest
//! neighbors over HTTP: an immutable in-memory vocabulary-to-vector
//! store with O(1) lookup, and cosine-similarity top-N ranking in
//! O(V log N).

pub mod error;
pub mod metrics;
pub mod model;
pub mod observability;
pub mod rank;
pub mod server;
pub mod vocab;

pub use error::{LoadError, QueryError};
pub use metrics::Metrics;
pub use model::{FetchConfig, LoadPhase, ModelFetcher, ModelSource, ModelState};
pub use observability::HealthCheck;
pub use rank::{cosine_similarity, most_similar, most_similar_to_vector, SimilarityResult};
pub use server::{Config, Server};
pub use vocab::VectorStore;

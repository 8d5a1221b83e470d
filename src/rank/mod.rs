//! Ranking Module
//!
//! Cosine similarity math and top-N nearest-neighbor selection.

mod ranker;
mod similarity;

pub use ranker::{most_similar, most_similar_to_vector, SimilarityResult};
pub use similarity::{cosine_similarity, dot_product, magnitude};

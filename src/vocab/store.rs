//! Vocabulary Vector Store
//!
//! Token -> vector mapping built once at load time and never mutated.
//! Queries are plain reads; an `Arc<VectorStore>` is shared across
//! threads without locking.

use hashbrown::HashMap;
use tracing::warn;

use crate::error::LoadError;

/// Normalize a token: trim surrounding whitespace and case-fold.
///
/// Applied once to every token at load time and once per query, so
/// `lookup("CAT")` and `lookup(" cat ")` hit the same entry as
/// `lookup("cat")`.
pub fn normalize_token(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Immutable store of word-embedding vectors.
///
/// Vectors live in one row-major `f32` matrix; tokens keep their row
/// order from the source file, which is the stable iteration order used
/// for deterministic tie-breaking in ranking.
#[derive(Debug)]
pub struct VectorStore {
    /// Row index -> normalized token.
    tokens: Vec<Box<str>>,
    /// Normalized token -> row index.
    index: HashMap<Box<str>, u32>,
    /// Row-major matrix, `tokens.len() * dimension` entries.
    data: Vec<f32>,
    /// Precomputed L2 norm per row.
    norms: Vec<f32>,
    dimension: usize,
}

impl VectorStore {
    /// Build a store from parallel token and vector data.
    ///
    /// `data` must hold exactly `tokens.len() * dimension` values in row
    /// order. Duplicate tokens after normalization keep their first row.
    pub fn from_rows(
        tokens: Vec<String>,
        data: Vec<f32>,
        dimension: usize,
    ) -> Result<Self, LoadError> {
        if dimension == 0 {
            return Err(LoadError::Malformed(
                "vector dimension must be positive".to_string(),
            ));
        }
        if tokens.is_empty() {
            return Err(LoadError::EmptyVocabulary);
        }
        if data.len() % dimension != 0 {
            return Err(LoadError::Malformed(format!(
                "vector matrix of {} values is not a multiple of dimension {}",
                data.len(),
                dimension
            )));
        }
        let rows = data.len() / dimension;
        if rows != tokens.len() {
            return Err(LoadError::ShapeMismatch {
                vocab: tokens.len(),
                rows,
            });
        }

        let mut normalized: Vec<Box<str>> = Vec::with_capacity(tokens.len());
        let mut index: HashMap<Box<str>, u32> = HashMap::with_capacity(tokens.len());
        for (row, raw) in tokens.into_iter().enumerate() {
            let token: Box<str> = normalize_token(&raw).into_boxed_str();
            if !index.contains_key(&token) {
                index.insert(token.clone(), row as u32);
            } else {
                warn!(token = %token, row, "duplicate token after normalization, keeping first");
            }
            normalized.push(token);
        }

        let norms = data
            .chunks_exact(dimension)
            .map(|row| row.iter().map(|x| x * x).sum::<f32>().sqrt())
            .collect();

        Ok(Self {
            tokens: normalized,
            index,
            data,
            norms,
            dimension,
        })
    }

    /// Look up a token's vector. Returns `None` for out-of-vocabulary
    /// tokens; normalization is applied here.
    pub fn lookup(&self, token: &str) -> Option<&[f32]> {
        self.resolve(token).map(|row| self.row(row))
    }

    /// Check whether a token is in the vocabulary.
    pub fn contains(&self, token: &str) -> bool {
        self.resolve(token).is_some()
    }

    /// Vector dimensionality (fixed for the store's lifetime).
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Vocabulary cardinality.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Resolve a token to its row index.
    pub(crate) fn resolve(&self, token: &str) -> Option<usize> {
        let normalized = normalize_token(token);
        self.index.get(normalized.as_str()).map(|&row| row as usize)
    }

    pub(crate) fn row(&self, row: usize) -> &[f32] {
        let start = row * self.dimension;
        &self.data[start..start + self.dimension]
    }

    pub(crate) fn norm(&self, row: usize) -> f32 {
        self.norms[row]
    }

    pub(crate) fn token_at(&self, row: usize) -> &str {
        &self.tokens[row]
    }
}

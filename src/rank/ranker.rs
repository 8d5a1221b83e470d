//! Similarity Ranker
//!
//! Top-N nearest-neighbor selection over a [`VectorStore`] under cosine
//! similarity. Selection runs in O(V log N) with a bounded heap instead
//! of sorting the whole vocabulary.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::error::QueryError;
use crate::rank::similarity::{cosine_from_parts, dot_product, magnitude};
use crate::vocab::{normalize_token, VectorStore};

/// One ranked neighbor: a token and its cosine similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityResult {
    pub token: String,
    pub similarity: f32,
}

/// A scored row while selection is in flight.
///
/// Ordering is inverted so the weakest kept candidate sits on top of the
/// max-heap and can be evicted in O(log N). Ties order by row: the
/// earlier row is the stronger candidate, which keeps output
/// deterministic across calls and processes for an identical load order.
struct Candidate {
    similarity: f32,
    row: usize,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .similarity
            .total_cmp(&self.similarity)
            .then_with(|| self.row.cmp(&other.row))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

/// Rank the `top_n` tokens most similar to `query_token`.
///
/// The query token itself is excluded from the results. Returns
/// [`QueryError::NotFound`] for out-of-vocabulary tokens and
/// [`QueryError::InvalidInput`] for `top_n == 0`. Fewer than `top_n`
/// candidates is not an error; all available results come back.
pub fn most_similar(
    store: &VectorStore,
    query_token: &str,
    top_n: usize,
) -> Result<Vec<SimilarityResult>, QueryError> {
    let row = store
        .resolve(query_token)
        .ok_or_else(|| QueryError::NotFound(normalize_token(query_token)))?;

    rank(store, store.row(row), store.norm(row), top_n, Some(row))
}

/// Rank the `top_n` tokens most similar to an arbitrary query vector.
///
/// The vector does not need to exist in the store, but its length must
/// equal `store.dimension()`. `exclude` removes one token from the
/// candidates (e.g. the token the vector was derived from); an excluded
/// token absent from the vocabulary excludes nothing.
pub fn most_similar_to_vector(
    store: &VectorStore,
    query: &[f32],
    top_n: usize,
    exclude: Option<&str>,
) -> Result<Vec<SimilarityResult>, QueryError> {
    if query.len() != store.dimension() {
        return Err(QueryError::InvalidInput(format!(
            "query vector has {} components, store dimension is {}",
            query.len(),
            store.dimension()
        )));
    }

    let excluded_row = exclude.and_then(|token| store.resolve(token));
    rank(store, query, magnitude(query), top_n, excluded_row)
}

fn rank(
    store: &VectorStore,
    query: &[f32],
    query_norm: f32,
    top_n: usize,
    excluded_row: Option<usize>,
) -> Result<Vec<SimilarityResult>, QueryError> {
    if top_n == 0 {
        return Err(QueryError::InvalidInput(
            "n must be a positive integer".to_string(),
        ));
    }

    // Capacity is capped by the vocabulary: an oversized n is valid and
    // must not drive the allocation.
    let mut heap: BinaryHeap<Candidate> = BinaryHeap::with_capacity(top_n.min(store.len()) + 1);

    for row in 0..store.len() {
        if excluded_row == Some(row) {
            continue;
        }

        let dot = dot_product(query, store.row(row));
        let similarity = cosine_from_parts(dot, query_norm, store.norm(row));
        let candidate = Candidate { similarity, row };

        if heap.len() < top_n {
            heap.push(candidate);
        } else if let Some(worst) = heap.peek() {
            // Smaller in this ordering means a stronger candidate.
            if candidate.cmp(worst) == Ordering::Less {
                heap.pop();
                heap.push(candidate);
            }
        }
    }

    // Ascending under the inverted ordering = strongest first.
    Ok(heap
        .into_sorted_vec()
        .into_iter()
        .map(|c| SimilarityResult {
            token: store.token_at(c.row).to_string(),
            similarity: c.similarity,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(entries: &[(&str, [f32; 2])]) -> VectorStore {
        let tokens = entries.iter().map(|(t, _)| t.to_string()).collect();
        let data = entries.iter().flat_map(|(_, v)| v.iter().copied()).collect();
        VectorStore::from_rows(tokens, data, 2).unwrap()
    }

    fn cat_dog_car() -> VectorStore {
        store(&[
            ("cat", [1.0, 0.0]),
            ("dog", [0.9, 0.1]),
            ("car", [0.0, 1.0]),
        ])
    }

    #[test]
    fn test_most_similar_basic() {
        let store = cat_dog_car();
        let results = most_similar(&store, "cat", 1).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].token, "dog");
        assert!((results[0].similarity - 0.9939).abs() < 1e-3);
    }

    #[test]
    fn test_most_similar_excludes_query_token() {
        let store = cat_dog_car();
        let results = most_similar(&store, "cat", 10).unwrap();
        assert!(results.iter().all(|r| r.token != "cat"));
    }

    #[test]
    fn test_most_similar_sorted_descending() {
        let store = cat_dog_car();
        let results = most_similar(&store, "cat", 10).unwrap();
        for pair in results.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
    }

    #[test]
    fn test_most_similar_result_length() {
        let store = cat_dog_car();
        assert_eq!(most_similar(&store, "cat", 1).unwrap().len(), 1);
        assert_eq!(most_similar(&store, "cat", 2).unwrap().len(), 2);
        // More than vocabulary - 1 available: return everything, no error.
        assert_eq!(most_similar(&store, "cat", 50).unwrap().len(), 2);
    }

    #[test]
    fn test_huge_n_returns_all_without_overallocating() {
        let store = cat_dog_car();
        let results = most_similar(&store, "cat", usize::MAX).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_most_similar_unknown_token() {
        let store = cat_dog_car();
        let result = most_similar(&store, "boat", 5);
        assert_eq!(result, Err(QueryError::NotFound("boat".to_string())));
    }

    #[test]
    fn test_most_similar_zero_n() {
        let store = cat_dog_car();
        assert!(matches!(
            most_similar(&store, "cat", 0),
            Err(QueryError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_most_similar_normalizes_query() {
        let store = cat_dog_car();
        let a = most_similar(&store, "CAT", 2).unwrap();
        let b = most_similar(&store, " cat ", 2).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_most_similar_deterministic() {
        let store = cat_dog_car();
        let a = most_similar(&store, "dog", 2).unwrap();
        let b = most_similar(&store, "dog", 2).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_tie_break_prefers_earlier_row() {
        // b and c share a direction; both tie against the query, and the
        // earlier row must win the cut at n = 2.
        let store = store(&[
            ("a", [1.0, 0.0]),
            ("b", [0.0, 1.0]),
            ("c", [0.0, 2.0]),
            ("d", [0.0, 3.0]),
        ]);
        let results = most_similar(&store, "a", 2).unwrap();
        assert_eq!(results[0].token, "b");
        assert_eq!(results[1].token, "c");
    }

    #[test]
    fn test_most_similar_to_vector() {
        let store = cat_dog_car();
        let results = most_similar_to_vector(&store, &[1.0, 0.0], 1, None).unwrap();
        assert_eq!(results[0].token, "cat");
        assert!((results[0].similarity - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_most_similar_to_vector_dimension_mismatch() {
        let store = cat_dog_car();
        let result = most_similar_to_vector(&store, &[1.0, 0.0, 0.0], 1, None);
        assert!(matches!(result, Err(QueryError::InvalidInput(_))));
    }

    #[test]
    fn test_most_similar_to_vector_with_exclude() {
        let store = cat_dog_car();
        let results = most_similar_to_vector(&store, &[1.0, 0.0], 2, Some("cat")).unwrap();
        assert!(results.iter().all(|r| r.token != "cat"));
        assert_eq!(results[0].token, "dog");
    }

    #[test]
    fn test_most_similar_to_vector_exclude_unknown_token() {
        let store = cat_dog_car();
        let results = most_similar_to_vector(&store, &[1.0, 0.0], 3, Some("boat")).unwrap();
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn test_zero_query_vector_is_deterministic() {
        let store = cat_dog_car();
        let results = most_similar_to_vector(&store, &[0.0, 0.0], 2, None).unwrap();
        // Every similarity is defined as 0.0; ties resolve in row order.
        assert_eq!(results[0].token, "cat");
        assert_eq!(results[1].token, "dog");
        assert!(results.iter().all(|r| r.similarity == 0.0));
    }
}

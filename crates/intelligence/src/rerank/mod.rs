//! Final-stage relevance scoring
//!
//! The orchestrator hands every stage-2 candidate to a [`Reranker`] in a single
//! batch, pairing the user's original query with each passage's original text.
//!
//! ```text
//! stage-2 candidates → score_batch(query, passages) → threshold → sort → top-k
//! ```
//!
//! Scoring is all-or-nothing: a failed call or a batch of the wrong size is an
//! error, never a partially ranked list.

pub mod api;
pub mod error;

pub use api::ApiReranker;
pub use error::RerankError;

/// Trait for scoring implementations.
///
/// The trait is object-safe for use as `Arc<dyn Reranker>`.
///
/// # Implementations
///
/// - `ApiReranker` calls a cross-encoder `/rerank` endpoint
pub trait Reranker: Send + Sync {
    /// Score the relevance of each passage to the query.
    ///
    /// Returns exactly one score per passage, in passage order.
    fn score_batch(&self, query: &str, passages: &[&str]) -> Result<Vec<f32>, RerankError>;

    /// Name for debugging and logging
    fn name(&self) -> &str {
        "reranker"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct LengthScorer;

    impl Reranker for LengthScorer {
        fn score_batch(&self, _query: &str, passages: &[&str]) -> Result<Vec<f32>, RerankError> {
            Ok(passages.iter().map(|p| p.chars().count() as f32).collect())
        }
    }

    #[test]
    fn test_reranker_is_object_safe() {
        let reranker: Arc<dyn Reranker> = Arc::new(LengthScorer);
        let scores = reranker.score_batch("q", &["ab", "abcd"]).unwrap();
        assert_eq!(scores, vec![2.0, 4.0]);
        assert_eq!(reranker.name(), "reranker");
    }
}

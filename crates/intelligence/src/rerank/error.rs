//! Error types for re-ranking

use cascade_core::CascadeError;
use thiserror::Error;

/// Errors that can occur during re-ranking
#[derive(Debug, Error)]
pub enum RerankError {
    /// HTTP request failed (network unreachable, connection refused, etc.)
    #[error("network error: {0}")]
    Network(String),
    /// Failed to parse scorer response into valid scores
    #[error("parse error: {0}")]
    Parse(String),
    /// Scorer request timed out
    #[error("rerank request timed out")]
    Timeout,
    /// Scorer returned a different number of scores than passages
    #[error("scorer returned {actual} scores for {expected} passages")]
    LengthMismatch {
        /// Passages sent
        expected: usize,
        /// Scores received
        actual: usize,
    },
    /// Required cargo feature is not enabled
    #[error("feature '{0}' not enabled")]
    FeatureDisabled(&'static str),
}

impl From<RerankError> for CascadeError {
    fn from(e: RerankError) -> Self {
        CascadeError::scorer(e.to_string())
    }
}

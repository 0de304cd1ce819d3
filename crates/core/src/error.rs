//! Error types for the cascade retrieval engine
//!
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//! Every failure that reaches a caller is a distinct, inspectable variant so that
//! "nothing relevant" (an empty `Ok`) is never confused with "system broken".

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for cascade operations
pub type CascadeResult<T> = std::result::Result<T, CascadeError>;

/// Error types for the cascade retrieval engine
#[derive(Debug, Error)]
pub enum CascadeError {
    /// No built or loadable index is installed
    #[error("Index unavailable: no index has been built or loaded")]
    IndexUnavailable,

    /// I/O or decoding failure on the persisted index file
    #[error("Persistence failure at {}: {source}", path.display())]
    Persistence {
        /// Location of the index file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// External scorer errored, timed out, or returned a malformed batch
    #[error("Rerank unavailable: {0}")]
    Scorer(String),

    /// Index build attempted with zero documents.
    ///
    /// Informational: builds still succeed with a valid empty index and only
    /// log this. Callers that want to refuse an empty corpus return it
    /// themselves.
    #[error("Empty corpus: index built with zero documents")]
    EmptyCorpus,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Malformed input (e.g. an unreadable corpus record)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl CascadeError {
    /// Build a persistence error for `path`
    pub fn persistence(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CascadeError::Persistence {
            path: path.into(),
            source,
        }
    }

    /// Build a scorer error from any displayable cause
    pub fn scorer(msg: impl Into<String>) -> Self {
        CascadeError::Scorer(msg.into())
    }

    /// Build a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        CascadeError::Config(msg.into())
    }

    /// Build an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        CascadeError::InvalidInput(msg.into())
    }

    /// True when the failure means the system is not ready to serve queries
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            CascadeError::IndexUnavailable | CascadeError::Persistence { .. } | CascadeError::Scorer(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display_index_unavailable() {
        let msg = CascadeError::IndexUnavailable.to_string();
        assert!(msg.contains("Index unavailable"));
    }

    #[test]
    fn test_error_display_persistence() {
        let err = CascadeError::persistence(
            "/tmp/cascade.idx",
            io::Error::new(io::ErrorKind::InvalidData, "bad index magic"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/tmp/cascade.idx"));
        assert!(msg.contains("bad index magic"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_error_display_scorer() {
        let msg = CascadeError::scorer("timed out after 10ms").to_string();
        assert!(msg.contains("Rerank unavailable"));
        assert!(msg.contains("timed out"));
    }

    #[test]
    fn test_error_display_config() {
        let msg = CascadeError::config("top_k_final must be at least 1").to_string();
        assert!(msg.contains("Invalid configuration"));
    }

    #[test]
    fn test_unavailable_classification() {
        assert!(CascadeError::IndexUnavailable.is_unavailable());
        assert!(CascadeError::scorer("x").is_unavailable());
        assert!(!CascadeError::EmptyCorpus.is_unavailable());
        assert!(!CascadeError::invalid_input("line 3").is_unavailable());
    }
}

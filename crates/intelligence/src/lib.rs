//! Cascade retrieval over a lexical index
//!
//! This crate provides:
//! - prf: ephemeral TF-IDF term weights over stage-1 candidates
//! - expand: weighted-repetition query expansion
//! - Reranker trait and ApiReranker (cross-encoder endpoint, `rerank` feature)
//! - CascadeRetriever: stage 1 → PRF → stage 2 → rerank → threshold/top-k
//!
//! # Usage
//!
//! ```ignore
//! use cascade_intelligence::{ApiReranker, CascadeRetriever};
//!
//! let retriever = CascadeRetriever::new(
//!     Arc::new(store),
//!     Arc::new(ApiReranker::from_config(&model)),
//!     normalizer,
//!     config,
//! )?;
//! let passages = retriever.retrieve("какое оружие у орков")?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cascade;
pub mod expand;
pub mod prf;
pub mod rerank;

// Re-export commonly used types
pub use cascade::{CascadeRetriever, CascadeStats, ScoredDocument};
pub use expand::{expand_query, repeat_counts};
pub use prf::{expansion_terms, TermWeightSnapshot, WeightedTerm};
pub use rerank::{ApiReranker, RerankError, Reranker};

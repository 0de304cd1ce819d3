//! Cascade - multi-stage passage retrieval
//!
//! Answers natural-language questions over a fixed corpus by running a
//! lexical search, expanding the query with pseudo-relevance feedback,
//! searching again, and reranking the survivors with an external scorer.
//!
//! # Quick Start
//!
//! ```ignore
//! use cascade::{CascadeConfig, CascadeRetriever, IndexStore};
//! use std::sync::Arc;
//!
//! let config = CascadeConfig::from_file_or_default("cascade.toml".as_ref())?;
//! let store = IndexStore::load_or_build(&config.index, || load_documents())?;
//! let normalizer = store.normalizer();
//! let retriever = CascadeRetriever::new(Arc::new(store), scorer, normalizer, config)?;
//!
//! for passage in retriever.retrieve("какое оружие у орков")? {
//!     println!("{:.3} {}", passage.score, passage.document.original_text);
//! }
//! ```
//!
//! # Architecture
//!
//! - `cascade-core`: documents, config, errors
//! - `cascade-search`: normalizer, BM25 index, persistence, index store
//! - `cascade-intelligence`: PRF, expansion, reranking, the orchestrator

pub use cascade_core::{
    CascadeConfig, CascadeError, CascadeResult, Document, IndexConfig, Language, Metadata,
    MetadataValue, ModelConfig,
};
pub use cascade_intelligence::{
    expand_query, expansion_terms, repeat_counts, ApiReranker, CascadeRetriever, CascadeStats,
    RerankError, Reranker, ScoredDocument, TermWeightSnapshot, WeightedTerm,
};
pub use cascade_search::{
    normalize, Bm25Params, IndexStore, InvertedIndex, LexicalHit, LexicalIndex, Normalizer,
};

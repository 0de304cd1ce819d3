//! Lexical retrieval for the cascade engine
//!
//! This crate provides:
//! - Normalizer: tokenization plus morphological reduction to lemmas
//! - InvertedIndex: BM25 ranking over a fixed corpus
//! - index_file: versioned on-disk format with atomic writes
//! - IndexStore: load-or-build and atomic rebuild of the live index
//! - LexicalIndex trait: the seam the orchestrator searches through
//!
//! # Usage
//!
//! ```ignore
//! use cascade_search::{IndexStore, LexicalIndex};
//!
//! let store = IndexStore::load_or_build(&config.index, || read_corpus(&path))?;
//! let terms = store.normalizer().normalize("оружие орков");
//! let hits = store.search(&terms, 50)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod index;
pub mod index_file;
pub mod normalizer;
pub mod scorer;
pub mod searchable;
pub mod store;

// Re-export commonly used types
pub use index::{InvertedIndex, LexicalHit, PostingEntry, PostingList};
pub use index_file::{load_index, write_index};
pub use normalizer::{normalize, NormalizedToken, Normalizer, MAX_NOISE_TOKEN_CHARS};
pub use scorer::Bm25Params;
pub use searchable::LexicalIndex;
pub use store::IndexStore;

//! Core types for the cascade retrieval engine
//!
//! This crate defines the foundational types shared by every layer:
//! - Document: Immutable unit of retrieval content
//! - MetadataValue: Opaque passthrough metadata
//! - CascadeError / CascadeResult: Error type hierarchy
//! - CascadeConfig: Retrieval tunables loaded from `cascade.toml`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod document;
pub mod error;

pub use config::{
    CascadeConfig, IndexConfig, Language, ModelConfig, CONFIG_FILE_NAME, DEFAULT_INDEX_PATH,
};
pub use document::{Document, Metadata, MetadataValue};
pub use error::{CascadeError, CascadeResult};

//! Document model
//!
//! A [`Document`] is the immutable unit of retrieval content. The core never
//! rewrites `original_text`; all normalization happens on derived copies inside
//! the index and the expansion stage.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Passthrough metadata attached to a document (title, source URL, article id).
///
/// Ordered map so serialized output is deterministic.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// A primitive metadata value.
///
/// Opaque to the retrieval core; carried from ingestion to the caller unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// Boolean flag
    Bool(bool),
    /// Signed integer
    Integer(i64),
    /// Floating point number
    Float(f64),
    /// UTF-8 string
    String(String),
}

impl MetadataValue {
    /// Borrow the string payload, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Bool(b) => write!(f, "{}", b),
            MetadataValue::Integer(i) => write!(f, "{}", i),
            MetadataValue::Float(x) => write!(f, "{}", x),
            MetadataValue::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        MetadataValue::String(s.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        MetadataValue::String(s)
    }
}

impl From<i64> for MetadataValue {
    fn from(i: i64) -> Self {
        MetadataValue::Integer(i)
    }
}

impl From<f64> for MetadataValue {
    fn from(x: f64) -> Self {
        MetadataValue::Float(x)
    }
}

impl From<bool> for MetadataValue {
    fn from(b: bool) -> Self {
        MetadataValue::Bool(b)
    }
}

// ============================================================================
// Document
// ============================================================================

/// Immutable unit of retrieval content.
///
/// `original_text` is what callers get back and what the reranker scores.
/// The normalized term sequence used for matching is derived at index build
/// time and never written back here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Opaque stable identifier assigned at ingestion
    pub id: String,
    /// Untouched source text
    #[serde(rename = "text")]
    pub original_text: String,
    /// Passthrough metadata
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: Metadata,
}

impl Document {
    /// Create a document with no metadata
    pub fn new(id: impl Into<String>, original_text: impl Into<String>) -> Self {
        Document {
            id: id.into(),
            original_text: original_text.into(),
            metadata: Metadata::new(),
        }
    }

    /// Builder: attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Title from metadata, when the ingestion layer supplied one
    pub fn title(&self) -> Option<&str> {
        self.metadata.get("title").and_then(MetadataValue::as_str)
    }
}

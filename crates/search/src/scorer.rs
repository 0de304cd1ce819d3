//! BM25 scoring parameters and formula
//!
//! For each query term t present in a document:
//! score += IDF(t) * (tf * (k1 + 1)) / (tf + k1 * (1 - b + b * dl/avgdl))
//!
//! Where:
//! - tf = term frequency in document
//! - dl = document length in normalized terms
//! - avgdl = average document length across the corpus
//! - k1 = term saturation parameter (default 1.2)
//! - b = length normalization parameter (default 0.75)

use cascade_core::IndexConfig;
use serde::{Deserialize, Serialize};

/// BM25 constants, fixed for the lifetime of an index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25Params {
    /// k1 parameter: term frequency saturation
    pub k1: f32,
    /// b parameter: length normalization
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Bm25Params { k1: 1.2, b: 0.75 }
    }
}

impl From<&IndexConfig> for Bm25Params {
    fn from(config: &IndexConfig) -> Self {
        Bm25Params {
            k1: config.k1,
            b: config.b,
        }
    }
}

impl Bm25Params {
    /// Create parameters with custom constants
    pub fn new(k1: f32, b: f32) -> Self {
        Bm25Params { k1, b }
    }

    /// Compute IDF for a term
    ///
    /// Uses standard IDF formula with smoothing:
    /// IDF(t) = ln((N - df + 0.5) / (df + 0.5) + 1)
    ///
    /// Always positive, so a matching term never lowers a score.
    pub fn idf(total_docs: usize, doc_freq: usize) -> f32 {
        let n = total_docs as f32;
        let df = doc_freq as f32;
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
    }

    /// Term-frequency component for one (term, document) pair.
    pub fn tf_component(&self, tf: u32, doc_len: u32, avg_doc_len: f32) -> f32 {
        let tf = tf as f32;
        let length_ratio = if avg_doc_len > 0.0 {
            doc_len as f32 / avg_doc_len
        } else {
            1.0
        };
        (tf * (self.k1 + 1.0)) / (tf + self.k1 * (1.0 - self.b + self.b * length_ratio))
    }

    /// Full BM25 contribution of one query term to one document.
    pub fn term_score(&self, idf: f32, tf: u32, doc_len: u32, avg_doc_len: f32) -> f32 {
        idf * self.tf_component(tf, doc_len, avg_doc_len)
    }
}

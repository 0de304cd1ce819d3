//! Inverted index with BM25 ranking
//!
//! This module provides:
//! - InvertedIndex built once from an ordered corpus
//! - Posting lists sorted by document position
//! - Corpus statistics (document count, average length)
//! - Ranked lookup over a bag of normalized query terms
//!
//! # Architectural Rules
//!
//! - Built once, then read-only. Rebuilding produces a new instance.
//! - Documents are stored verbatim; only term statistics are derived.

use crate::normalizer::Normalizer;
use crate::scorer::Bm25Params;
use cascade_core::{Document, Language};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

// ============================================================================
// PostingEntry
// ============================================================================

/// Entry in a posting list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingEntry {
    /// Position of the document in corpus insertion order
    pub doc: u32,
    /// Term frequency in this document
    pub tf: u32,
}

// ============================================================================
// PostingList
// ============================================================================

/// List of documents containing a term, ascending by position
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostingList {
    /// Document entries
    pub entries: Vec<PostingEntry>,
}

impl PostingList {
    /// Number of documents containing this term
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if posting list is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// LexicalHit
// ============================================================================

/// One ranked result of a lexical lookup
#[derive(Debug, Clone, PartialEq)]
pub struct LexicalHit {
    /// Position of the document in corpus insertion order
    pub position: u32,
    /// BM25 score (always positive)
    pub score: f32,
    /// The matched document, original text intact
    pub document: Document,
}

// ============================================================================
// InvertedIndex
// ============================================================================

/// Inverted index for BM25 keyword search
///
/// # Thread Safety
///
/// Immutable after `build`; share it behind an `Arc` for any number of
/// concurrent readers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvertedIndex {
    /// Analyzer language the postings were built with
    pub(crate) language: Language,
    /// Scoring constants
    pub(crate) params: Bm25Params,
    /// Documents in insertion order
    pub(crate) documents: Vec<Document>,
    /// Normalized length of each document
    pub(crate) doc_lengths: Vec<u32>,
    /// Sum of all document lengths
    pub(crate) total_doc_len: u64,
    /// Term -> PostingList mapping
    pub(crate) postings: BTreeMap<String, PostingList>,
}

impl InvertedIndex {
    /// Build an index from an ordered corpus.
    ///
    /// Deterministic for a given input sequence and normalizer. An empty corpus
    /// yields a valid empty index.
    pub fn build(documents: Vec<Document>, normalizer: &Normalizer, params: Bm25Params) -> Self {
        // Normalization is the expensive part; collect preserves corpus order.
        let normalized: Vec<Vec<String>> = documents
            .par_iter()
            .map(|doc| normalizer.normalize(&doc.original_text))
            .collect();

        let mut postings: BTreeMap<String, PostingList> = BTreeMap::new();
        let mut doc_lengths = Vec::with_capacity(documents.len());
        let mut total_doc_len = 0u64;

        for (pos, terms) in normalized.into_iter().enumerate() {
            let doc_len = terms.len() as u32;
            doc_lengths.push(doc_len);
            total_doc_len += doc_len as u64;

            // Count term frequencies
            let mut tf_map: HashMap<String, u32> = HashMap::new();
            for term in terms {
                *tf_map.entry(term).or_insert(0) += 1;
            }

            for (term, tf) in tf_map {
                postings.entry(term).or_default().entries.push(PostingEntry {
                    doc: pos as u32,
                    tf,
                });
            }
        }

        tracing::info!(
            target: "cascade::index",
            documents = documents.len(),
            terms = postings.len(),
            "Built lexical index"
        );

        InvertedIndex {
            language: normalizer.language(),
            params,
            documents,
            doc_lengths,
            total_doc_len,
            postings,
        }
    }

    /// Check the structural invariants of an index read from outside.
    ///
    /// Every document has a length, the length total matches, and every
    /// posting points at an existing document with a non-zero frequency,
    /// ascending by position.
    pub fn validate(&self) -> Result<(), String> {
        if self.doc_lengths.len() != self.documents.len() {
            return Err(format!(
                "{} document lengths for {} documents",
                self.doc_lengths.len(),
                self.documents.len()
            ));
        }
        let total: u64 = self.doc_lengths.iter().map(|&l| l as u64).sum();
        if total != self.total_doc_len {
            return Err(format!(
                "total document length {} does not match recorded {}",
                total, self.total_doc_len
            ));
        }
        for (term, list) in &self.postings {
            if list.is_empty() {
                return Err(format!("empty posting list for '{}'", term));
            }
            let mut previous: Option<u32> = None;
            for entry in &list.entries {
                if entry.doc as usize >= self.documents.len() {
                    return Err(format!(
                        "posting for '{}' points at document {} of {}",
                        term,
                        entry.doc,
                        self.documents.len()
                    ));
                }
                if entry.tf == 0 {
                    return Err(format!("zero term frequency for '{}'", term));
                }
                if previous.is_some_and(|p| p >= entry.doc) {
                    return Err(format!("postings for '{}' are not ascending", term));
                }
                previous = Some(entry.doc);
            }
        }
        Ok(())
    }

    // ========================================================================
    // Statistics
    // ========================================================================

    /// Total number of indexed documents
    pub fn total_docs(&self) -> usize {
        self.documents.len()
    }

    /// True if no documents are indexed
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Number of distinct terms
    pub fn term_count(&self) -> usize {
        self.postings.len()
    }

    /// Analyzer language the index was built with
    pub fn language(&self) -> Language {
        self.language
    }

    /// Scoring constants
    pub fn params(&self) -> Bm25Params {
        self.params
    }

    /// Document frequency for a term
    pub fn doc_freq(&self, term: &str) -> usize {
        self.postings.get(term).map(PostingList::len).unwrap_or(0)
    }

    /// Average normalized document length
    pub fn avg_doc_len(&self) -> f32 {
        if self.documents.is_empty() {
            return 0.0;
        }
        self.total_doc_len as f32 / self.documents.len() as f32
    }

    /// IDF of a term against this corpus
    pub fn idf(&self, term: &str) -> f32 {
        Bm25Params::idf(self.total_docs(), self.doc_freq(term))
    }

    /// Normalized length of the document at `position`
    pub fn doc_len(&self, position: u32) -> Option<u32> {
        self.doc_lengths.get(position as usize).copied()
    }

    /// Document at `position`
    pub fn document(&self, position: u32) -> Option<&Document> {
        self.documents.get(position as usize)
    }

    /// Posting list for a term
    pub fn postings(&self, term: &str) -> Option<&PostingList> {
        self.postings.get(term)
    }

    // ========================================================================
    // Query
    // ========================================================================

    /// Rank documents against a bag of normalized query terms.
    ///
    /// Repeated query terms contribute once per occurrence. Documents matching
    /// no term are excluded. Equal scores keep corpus insertion order. Returns
    /// at most `limit` hits.
    pub fn search(&self, query_terms: &[String], limit: usize) -> Vec<LexicalHit> {
        if limit == 0 || self.documents.is_empty() || query_terms.is_empty() {
            return vec![];
        }

        let avg_doc_len = self.avg_doc_len();
        let mut scores: HashMap<u32, f32> = HashMap::new();

        for term in query_terms {
            let Some(list) = self.postings.get(term) else {
                continue;
            };
            let idf = Bm25Params::idf(self.documents.len(), list.len());
            for entry in &list.entries {
                let Some(&doc_len) = self.doc_lengths.get(entry.doc as usize) else {
                    continue;
                };
                *scores.entry(entry.doc).or_insert(0.0) +=
                    self.params.term_score(idf, entry.tf, doc_len, avg_doc_len);
            }
        }

        let mut ranked: Vec<(u32, f32)> = scores.into_iter().collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        ranked.truncate(limit);

        ranked
            .into_iter()
            .filter_map(|(position, score)| {
                self.document(position).map(|document| LexicalHit {
                    position,
                    score,
                    document: document.clone(),
                })
            })
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Lexical lookup seam used by the cascade orchestrator
//!
//! The orchestrator only sees `dyn LexicalIndex`, so it can run against a
//! live [`IndexStore`], a bare [`InvertedIndex`], or a test double.

use crate::index::{InvertedIndex, LexicalHit};
use crate::store::IndexStore;
use cascade_core::{CascadeResult, Language};

/// Ranked lookup over normalized query terms.
///
/// # Thread Safety
///
/// Implementations must be Send + Sync for concurrent retrieval requests.
pub trait LexicalIndex: Send + Sync {
    /// Return at most `limit` hits by descending BM25 score.
    ///
    /// `Ok(vec![])` means nothing matched. Implementations that may have no
    /// index installed return `CascadeError::IndexUnavailable` instead.
    fn search(&self, query_terms: &[String], limit: usize) -> CascadeResult<Vec<LexicalHit>>;

    /// Name for debugging and logging
    fn name(&self) -> &str;

    /// Analyzer language of the indexed terms, if known.
    ///
    /// Queries must be normalized with the same language to match.
    fn language(&self) -> Option<Language> {
        None
    }
}

impl LexicalIndex for InvertedIndex {
    fn search(&self, query_terms: &[String], limit: usize) -> CascadeResult<Vec<LexicalHit>> {
        Ok(InvertedIndex::search(self, query_terms, limit))
    }

    fn name(&self) -> &str {
        "bm25"
    }

    fn language(&self) -> Option<Language> {
        Some(InvertedIndex::language(self))
    }
}

impl LexicalIndex for IndexStore {
    fn search(&self, query_terms: &[String], limit: usize) -> CascadeResult<Vec<LexicalHit>> {
        Ok(self.current()?.search(query_terms, limit))
    }

    fn name(&self) -> &str {
        "bm25-store"
    }

    fn language(&self) -> Option<Language> {
        Some(self.normalizer().language())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::Normalizer;
    use crate::scorer::Bm25Params;
    use cascade_core::{CascadeError, Document, IndexConfig, Language};
    use std::sync::Arc;

    #[test]
    fn test_inverted_index_is_object_safe() {
        let normalizer = Normalizer::new(Language::English);
        let index = InvertedIndex::build(
            vec![Document::new("a", "hello world")],
            &normalizer,
            Bm25Params::default(),
        );
        let lexical: Arc<dyn LexicalIndex> = Arc::new(index);
        let hits = lexical.search(&normalizer.normalize("hello"), 5).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(lexical.name(), "bm25");
        assert_eq!(lexical.language(), Some(Language::English));
    }

    #[test]
    fn test_empty_store_reports_unavailable() {
        let tmp = tempfile::tempdir().unwrap();
        let config = IndexConfig {
            path: tmp.path().join("absent.idx"),
            ..IndexConfig::default()
        };
        let store = IndexStore::open(&config).unwrap();
        let err = LexicalIndex::search(&store, &["орк".to_string()], 5).unwrap_err();
        assert!(matches!(err, CascadeError::IndexUnavailable));
        assert_eq!(LexicalIndex::language(&store), Some(Language::Russian));
    }
}

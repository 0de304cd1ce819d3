//! Cascade retrieval orchestrator
//!
//! ```text
//! query → normalize → stage 1 BM25 (top_k_stage1)
//!       → PRF: TF-IDF over first prf_top_docs hits → weighted repetition
//!       → normalize expanded query → stage 2 BM25
//!       → rerank (original query, original_text) in one batch
//!       → drop below score_threshold → stable sort desc → top_k_final
//! ```
//!
//! The index and scorer are injected as trait objects, so a retriever is
//! cheap to clone and safe to share across request threads. Stages within a
//! request run sequentially.

use crate::expand::expand_query;
use crate::prf::{expansion_terms, WeightedTerm};
use crate::rerank::{RerankError, Reranker};
use cascade_core::{CascadeConfig, CascadeError, CascadeResult, Document};
use cascade_search::{LexicalHit, LexicalIndex, Normalizer};
use serde::Serialize;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A returned passage with its rerank score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredDocument {
    /// The document, original text and metadata intact
    pub document: Document,
    /// Relevance score from the reranker
    pub score: f32,
}

/// Per-request counters and the query actually sent to stage 2.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CascadeStats {
    /// Hits returned by stage 1
    pub stage1_candidates: usize,
    /// Terms chosen by PRF, highest weight first
    pub expansion_terms: Vec<WeightedTerm>,
    /// Query text searched in stage 2
    pub expanded_query: String,
    /// Hits returned by stage 2
    pub stage2_candidates: usize,
    /// Candidates sent to the reranker
    pub reranked: usize,
    /// Documents returned to the caller
    pub returned: usize,
    /// Wall time of the whole request
    pub elapsed_micros: u64,
}

/// Stateless multi-stage retriever.
#[derive(Clone)]
pub struct CascadeRetriever {
    index: Arc<dyn LexicalIndex>,
    reranker: Arc<dyn Reranker>,
    normalizer: Normalizer,
    config: Arc<CascadeConfig>,
}

impl CascadeRetriever {
    /// Create a retriever.
    ///
    /// # Errors
    ///
    /// `Config` if `config` does not validate, or if `index` reports an
    /// analyzer language different from `normalizer`'s.
    pub fn new(
        index: Arc<dyn LexicalIndex>,
        reranker: Arc<dyn Reranker>,
        normalizer: Normalizer,
        config: CascadeConfig,
    ) -> CascadeResult<Self> {
        config.validate()?;
        if let Some(language) = index.language() {
            if language != normalizer.language() {
                return Err(CascadeError::config(format!(
                    "index '{}' uses {:?} terms but queries would be normalized as {:?}",
                    index.name(),
                    language,
                    normalizer.language()
                )));
            }
        }
        Ok(CascadeRetriever {
            index,
            reranker,
            normalizer,
            config: Arc::new(config),
        })
    }

    /// Active configuration
    pub fn config(&self) -> &CascadeConfig {
        &self.config
    }

    /// Normalizer applied to queries
    pub fn normalizer(&self) -> Normalizer {
        self.normalizer
    }

    /// Retrieve the most relevant documents for `query`.
    ///
    /// `Ok(vec![])` means nothing cleared the threshold.
    ///
    /// # Errors
    ///
    /// - `IndexUnavailable` if no index is installed
    /// - `Scorer` if reranking fails, times out, or returns a malformed batch
    pub fn retrieve(&self, query: &str) -> CascadeResult<Vec<ScoredDocument>> {
        self.retrieve_traced(query).map(|(docs, _)| docs)
    }

    /// [`retrieve`](Self::retrieve) plus per-stage statistics.
    pub fn retrieve_traced(
        &self,
        query: &str,
    ) -> CascadeResult<(Vec<ScoredDocument>, CascadeStats)> {
        let start = Instant::now();
        let config = &*self.config;
        let mut stats = CascadeStats::default();

        // Stage 1
        let query_terms = self.normalizer.normalize(query);
        let stage1 = self.search(&query_terms, config.top_k_stage1)?;
        stats.stage1_candidates = stage1.len();
        tracing::debug!(
            target: "cascade::retrieve",
            terms = query_terms.len(),
            hits = stage1.len(),
            "Stage 1 complete"
        );

        // PRF
        stats.expanded_query = if config.prf_enable {
            let feedback = stage1
                .iter()
                .take(config.prf_top_docs)
                .map(|hit| hit.document.original_text.as_str());
            let terms = expansion_terms(&self.normalizer, query, feedback, config.prf_top_terms);
            let surfaces: Vec<String> = terms.iter().map(|t| t.surface.clone()).collect();
            let weights: Vec<f32> = terms.iter().map(|t| t.weight).collect();
            let expanded = expand_query(query, &surfaces, Some(&weights), config.prf_max_repeat);
            tracing::debug!(
                target: "cascade::retrieve",
                terms = ?terms.iter().map(|t| t.term.as_str()).collect::<Vec<_>>(),
                "PRF expansion"
            );
            stats.expansion_terms = terms;
            expanded
        } else {
            query.to_string()
        };
        drop(stage1);

        // Stage 2
        let stage2_terms = self.normalizer.normalize(&stats.expanded_query);
        let stage2 = self.search(&stage2_terms, config.stage2_limit())?;
        stats.stage2_candidates = stage2.len();
        tracing::debug!(
            target: "cascade::retrieve",
            terms = stage2_terms.len(),
            hits = stage2.len(),
            "Stage 2 complete"
        );

        if stage2.is_empty() {
            stats.elapsed_micros = start.elapsed().as_micros() as u64;
            return Ok((vec![], stats));
        }

        // Rerank against the original query
        let scores = self.score(query, &stage2)?;
        stats.reranked = scores.len();

        let results = select(stage2, scores, config.score_threshold, config.top_k_final);
        stats.returned = results.len();
        stats.elapsed_micros = start.elapsed().as_micros() as u64;

        tracing::debug!(
            target: "cascade::retrieve",
            reranked = stats.reranked,
            returned = stats.returned,
            elapsed_us = stats.elapsed_micros,
            "Cascade complete"
        );
        Ok((results, stats))
    }

    fn search(&self, terms: &[String], limit: usize) -> CascadeResult<Vec<LexicalHit>> {
        self.index.search(terms, limit).map_err(|e| {
            tracing::warn!(
                target: "cascade::retrieve",
                index = self.index.name(),
                error = %e,
                "Lexical search failed"
            );
            e
        })
    }

    /// Score every candidate, all-or-nothing.
    fn score(&self, query: &str, candidates: &[LexicalHit]) -> CascadeResult<Vec<f32>> {
        let passages: Vec<String> = candidates
            .iter()
            .map(|hit| hit.document.original_text.clone())
            .collect();

        let scores = self.run_reranker(query, passages).and_then(|scores| {
            if scores.len() != candidates.len() {
                return Err(RerankError::LengthMismatch {
                    expected: candidates.len(),
                    actual: scores.len(),
                });
            }
            if scores.iter().any(|s| s.is_nan()) {
                return Err(RerankError::Parse("scorer returned NaN".to_string()));
            }
            Ok(scores)
        });

        scores.map_err(|e| {
            tracing::warn!(
                target: "cascade::rerank",
                reranker = self.reranker.name(),
                candidates = candidates.len(),
                error = %e,
                "Rerank failed"
            );
            CascadeError::from(e)
        })
    }

    /// Run the batch, bounded by `rerank_timeout_ms` unless it is 0.
    ///
    /// On timeout the worker is detached, not cancelled; it exits once the
    /// scorer returns and its result is dropped.
    fn run_reranker(&self, query: &str, passages: Vec<String>) -> Result<Vec<f32>, RerankError> {
        let timeout_ms = self.config.rerank_timeout_ms;
        if timeout_ms == 0 {
            let refs: Vec<&str> = passages.iter().map(String::as_str).collect();
            return self.reranker.score_batch(query, &refs);
        }

        let (tx, rx) = mpsc::channel();
        let reranker = Arc::clone(&self.reranker);
        let query = query.to_string();
        std::thread::Builder::new()
            .name("cascade-rerank".to_string())
            .spawn(move || {
                let refs: Vec<&str> = passages.iter().map(String::as_str).collect();
                // Receiver is gone if the request already timed out
                let _ = tx.send(reranker.score_batch(&query, &refs));
            })
            .map_err(|e| RerankError::Network(format!("failed to spawn rerank worker: {}", e)))?;

        match rx.recv_timeout(Duration::from_millis(timeout_ms)) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(RerankError::Timeout),
            Err(RecvTimeoutError::Disconnected) => Err(RerankError::Network(
                "rerank worker exited without a result".to_string(),
            )),
        }
    }
}

/// Threshold, stable sort by score descending, truncate.
fn select(
    candidates: Vec<LexicalHit>,
    scores: Vec<f32>,
    threshold: f32,
    top_k: usize,
) -> Vec<ScoredDocument> {
    let mut kept: Vec<ScoredDocument> = candidates
        .into_iter()
        .zip(scores)
        .filter(|(_, score)| *score >= threshold)
        .map(|(hit, score)| ScoredDocument {
            document: hit.document,
            score,
        })
        .collect();
    // Stable: equal scores keep stage-2 order
    kept.sort_by(|a, b| b.score.total_cmp(&a.score));
    kept.truncate(top_k);
    kept
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use cascade_core::Language;
    use cascade_search::{Bm25Params, InvertedIndex};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scores by a fixed lookup on document text
    struct KeywordScorer {
        keyword: &'static str,
        calls: AtomicUsize,
    }

    impl KeywordScorer {
        fn new(keyword: &'static str) -> Self {
            KeywordScorer {
                keyword,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Reranker for KeywordScorer {
        fn score_batch(&self, _query: &str, passages: &[&str]) -> Result<Vec<f32>, RerankError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(passages
                .iter()
                .map(|p| if p.contains(self.keyword) { 0.9 } else { 0.1 })
                .collect())
        }
    }

    struct FailingScorer;

    impl Reranker for FailingScorer {
        fn score_batch(&self, _query: &str, _passages: &[&str]) -> Result<Vec<f32>, RerankError> {
            Err(RerankError::Network("connection refused".to_string()))
        }
    }

    fn index(texts: &[&str]) -> Arc<dyn LexicalIndex> {
        let docs = texts
            .iter()
            .enumerate()
            .map(|(i, t)| Document::new(format!("d{}", i), *t))
            .collect();
        Arc::new(InvertedIndex::build(
            docs,
            &Normalizer::new(Language::English),
            Bm25Params::default(),
        ))
    }

    fn retriever(index: Arc<dyn LexicalIndex>, reranker: Arc<dyn Reranker>) -> CascadeRetriever {
        CascadeRetriever::new(
            index,
            reranker,
            Normalizer::new(Language::English),
            CascadeConfig::default(),
        )
        .unwrap()
    }

    fn hit(id: &str) -> LexicalHit {
        LexicalHit {
            position: 0,
            score: 1.0,
            document: Document::new(id, id),
        }
    }

    #[test]
    fn test_select_threshold_sort_truncate() {
        let candidates = vec![hit("a"), hit("b"), hit("c"), hit("d")];
        let out = select(candidates, vec![0.5, 0.2, 0.9, 0.5], 0.3, 2);
        let ids: Vec<&str> = out.iter().map(|d| d.document.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);
    }

    #[test]
    fn test_select_ties_keep_stage2_order() {
        let candidates = vec![hit("a"), hit("b"), hit("c")];
        let out = select(candidates, vec![0.5, 0.5, 0.5], 0.0, 10);
        let ids: Vec<&str> = out.iter().map(|d| d.document.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_select_threshold_inclusive() {
        let out = select(vec![hit("a")], vec![0.3], 0.3, 5);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_end_to_end_prefers_reranked_document() {
        let scorer = Arc::new(KeywordScorer::new("ork"));
        let r = retriever(
            index(&["space marine chapter", "ork weapons are loud", "eldar craftworld"]),
            scorer.clone(),
        );
        let results = r.retrieve("ork weapons").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document.id, "d1");
        assert!((results[0].score - 0.9).abs() < f32::EPSILON);
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_no_candidates_skips_scorer() {
        let scorer = Arc::new(KeywordScorer::new("ork"));
        let r = retriever(index(&["space marine chapter"]), scorer.clone());
        let (results, stats) = r.retrieve_traced("necron tomb").unwrap();
        assert!(results.is_empty());
        assert_eq!(stats.stage1_candidates, 0);
        assert_eq!(stats.expanded_query, "necron tomb");
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_empty_query_returns_empty() {
        let scorer = Arc::new(KeywordScorer::new("ork"));
        let r = retriever(index(&["ork weapons"]), scorer.clone());
        assert!(r.retrieve("").unwrap().is_empty());
        assert!(r.retrieve("?!").unwrap().is_empty());
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_scorer_failure_propagates() {
        let r = retriever(index(&["ork weapons"]), Arc::new(FailingScorer));
        let err = r.retrieve("ork").unwrap_err();
        assert!(matches!(err, CascadeError::Scorer(_)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = CascadeConfig {
            top_k_final: 0,
            ..CascadeConfig::default()
        };
        let result = CascadeRetriever::new(
            index(&["x"]),
            Arc::new(FailingScorer),
            Normalizer::default(),
            config,
        );
        assert!(matches!(result, Err(CascadeError::Config(_))));
    }

    #[test]
    fn test_stats_populated() {
        let r = retriever(
            index(&["ork weapons choppa", "ork boyz choppa", "eldar craftworld"]),
            Arc::new(KeywordScorer::new("ork")),
        );
        let (results, stats) = r.retrieve_traced("ork").unwrap();
        assert_eq!(stats.stage1_candidates, 2);
        assert!(stats.expanded_query.starts_with("ork "));
        assert_eq!(stats.expansion_terms[0].term, "choppa");
        assert_eq!(stats.reranked, stats.stage2_candidates);
        assert_eq!(stats.returned, results.len());
    }

    #[test]
    fn test_retriever_is_send_sync_clone() {
        fn assert_traits<T: Send + Sync + Clone>() {}
        assert_traits::<CascadeRetriever>();
    }
}

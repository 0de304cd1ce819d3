//! Result → human/json string formatting.
//!
//! - **Human** (default): numbered list with score, id, title and a snippet
//! - **JSON** (`--json`): `serde_json::to_string_pretty`

use cascade_core::{CascadeError, Document};
use cascade_intelligence::{CascadeStats, ScoredDocument};
use cascade_search::LexicalHit;

/// Characters of original text shown per result in human mode.
const SNIPPET_CHARS: usize = 160;

/// Output formatting mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

/// Format stage-1 lexical hits.
pub fn format_hits(hits: &[LexicalHit], mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => {
            let items: Vec<serde_json::Value> = hits
                .iter()
                .map(|h| {
                    serde_json::json!({
                        "score": h.score,
                        "document": h.document,
                    })
                })
                .collect();
            to_pretty(&serde_json::Value::Array(items))
        }
        OutputMode::Human => {
            if hits.is_empty() {
                return "(no results)".to_string();
            }
            hits.iter()
                .enumerate()
                .map(|(i, h)| format_entry(i + 1, h.score, &h.document))
                .collect::<Vec<_>>()
                .join("\n")
        }
    }
}

/// Format cascade results, with stage statistics.
pub fn format_results(results: &[ScoredDocument], stats: &CascadeStats, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => to_pretty(&serde_json::json!({
            "results": results,
            "stats": stats,
        })),
        OutputMode::Human => {
            let mut out = if results.is_empty() {
                "(no results)".to_string()
            } else {
                results
                    .iter()
                    .enumerate()
                    .map(|(i, r)| format_entry(i + 1, r.score, &r.document))
                    .collect::<Vec<_>>()
                    .join("\n")
            };
            out.push_str(&format!(
                "\n-- stage1 {} / stage2 {} / reranked {} / returned {} in {:.1}ms",
                stats.stage1_candidates,
                stats.stage2_candidates,
                stats.reranked,
                stats.returned,
                stats.elapsed_micros as f64 / 1000.0
            ));
            out
        }
    }
}

/// Format an error.
pub fn format_error(err: &CascadeError, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => to_pretty(&serde_json::json!({ "error": err.to_string() })),
        OutputMode::Human => format!("(error) {}", err),
    }
}

fn format_entry(rank: usize, score: f32, document: &Document) -> String {
    let title = document
        .title()
        .map(|t| format!(" {}", t))
        .unwrap_or_default();
    let mut snippet: String = document.original_text.chars().take(SNIPPET_CHARS).collect();
    if document.original_text.chars().count() > SNIPPET_CHARS {
        snippet.push('…');
    }
    format!(
        "{}) {:.4} [{}]{}\n   {}",
        rank,
        score,
        document.id,
        title,
        snippet.replace('\n', " ")
    )
}

fn to_pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

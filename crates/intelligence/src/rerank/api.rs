//! API-based reranker using a cross-encoder `/rerank` endpoint
//!
//! Sends one request with the query and every passage, as served by
//! text-embeddings-inference and compatible rerank servers:
//!
//! ```text
//! POST <endpoint>/rerank  {"query": "...", "texts": ["...", ...]}
//! → [{"index": 0, "score": 0.93}, ...]
//! ```
//!
//! Responses wrapped as `{"results": [{"index", "relevance_score"}]}` are
//! accepted too. Scores are mapped back to passage order.

use super::{RerankError, Reranker};
use cascade_core::ModelConfig;
use serde::Deserialize;
use std::time::Duration;

/// Reranker that calls a cross-encoder HTTP endpoint.
#[allow(dead_code)] // fields used behind #[cfg(feature = "rerank")]
pub struct ApiReranker {
    /// Full URL to the rerank endpoint
    url: String,
    /// Model name, for servers hosting several
    model: Option<String>,
    /// Optional bearer token
    api_key: Option<String>,
    /// Request timeout
    timeout: Duration,
}

impl ApiReranker {
    /// Create a new ApiReranker.
    ///
    /// `endpoint` is the base URL (e.g. "http://localhost:8080"); the
    /// `/rerank` path is appended automatically.
    pub fn new(endpoint: &str, api_key: Option<&str>, timeout_ms: u64) -> Self {
        let base = endpoint.trim_end_matches('/');
        Self {
            url: format!("{}/rerank", base),
            model: None,
            api_key: api_key.map(|s| s.to_string()),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    /// Request a specific model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Build from the `[model]` config section.
    pub fn from_config(config: &ModelConfig) -> Self {
        let reranker = Self::new(&config.endpoint, config.api_key.as_deref(), config.timeout_ms);
        match &config.model {
            Some(model) => reranker.with_model(model.as_str()),
            None => reranker,
        }
    }

    /// Full URL requests are sent to
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Make the HTTP call and return the raw response text.
    #[cfg(feature = "rerank")]
    fn call_api(&self, query: &str, passages: &[&str]) -> Result<String, RerankError> {
        let mut body = serde_json::json!({
            "query": query,
            "texts": passages,
        });
        if let Some(model) = &self.model {
            body["model"] = serde_json::Value::String(model.clone());
        }
        let body_bytes = serde_json::to_vec(&body)
            .map_err(|e| RerankError::Parse(format!("failed to serialize request: {}", e)))?;

        let config = ureq::Agent::config_builder()
            .timeout_global(Some(self.timeout))
            .build();
        let agent = ureq::Agent::new_with_config(config);

        let mut request = agent.post(&self.url).header("Content-Type", "application/json");
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", &format!("Bearer {}", key));
        }

        let mut response = request.send(&body_bytes[..]).map_err(|e| {
            let msg = e.to_string();
            if msg.contains("timed out") || msg.contains("Timeout") {
                RerankError::Timeout
            } else {
                RerankError::Network(msg)
            }
        })?;

        response
            .body_mut()
            .read_to_string()
            .map_err(|e| RerankError::Network(format!("failed to read response: {}", e)))
    }

    /// Placeholder for when the `rerank` feature is not enabled.
    #[cfg(not(feature = "rerank"))]
    fn call_api(&self, _query: &str, _passages: &[&str]) -> Result<String, RerankError> {
        Err(RerankError::FeatureDisabled("rerank"))
    }
}

#[derive(Debug, Deserialize)]
struct RerankEntry {
    index: usize,
    #[serde(alias = "relevance_score")]
    score: f32,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RerankResponse {
    Bare(Vec<RerankEntry>),
    Wrapped { results: Vec<RerankEntry> },
}

/// Parse a rerank response into one score per passage, in passage order.
///
/// Every passage index in `0..expected` must be scored exactly once.
pub fn parse_rerank_response(text: &str, expected: usize) -> Result<Vec<f32>, RerankError> {
    let response: RerankResponse = serde_json::from_str(text).map_err(|e| {
        RerankError::Parse(format!(
            "unexpected response format ({}): {}",
            e,
            text.chars().take(200).collect::<String>()
        ))
    })?;
    let entries = match response {
        RerankResponse::Bare(entries) | RerankResponse::Wrapped { results: entries } => entries,
    };

    if entries.len() != expected {
        return Err(RerankError::LengthMismatch {
            expected,
            actual: entries.len(),
        });
    }

    let mut scores: Vec<Option<f32>> = vec![None; expected];
    for entry in entries {
        let Some(slot) = scores.get_mut(entry.index) else {
            return Err(RerankError::Parse(format!(
                "score for unknown passage {}",
                entry.index
            )));
        };
        if slot.is_some() {
            return Err(RerankError::Parse(format!(
                "passage {} scored twice",
                entry.index
            )));
        }
        *slot = Some(entry.score);
    }
    // Lengths match and no index repeats, so every slot is filled
    Ok(scores.into_iter().flatten().collect())
}

impl Reranker for ApiReranker {
    fn score_batch(&self, query: &str, passages: &[&str]) -> Result<Vec<f32>, RerankError> {
        if passages.is_empty() {
            return Ok(vec![]);
        }
        tracing::debug!(
            target: "cascade::rerank",
            url = %self.url,
            passages = passages.len(),
            "Scoring batch"
        );
        let text = self.call_api(query, passages)?;
        parse_rerank_response(&text, passages.len())
    }

    fn name(&self) -> &str {
        "api"
    }
}

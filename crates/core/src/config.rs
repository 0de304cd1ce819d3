//! Retrieval configuration via `cascade.toml`
//!
//! Every field has a serde default, so an empty file yields the production
//! defaults. To change settings, edit the file and restart the process.

use crate::error::{CascadeError, CascadeResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file name looked up in the working directory by default.
pub const CONFIG_FILE_NAME: &str = "cascade.toml";

/// Default location of the persisted lexical index.
pub const DEFAULT_INDEX_PATH: &str = "cascade.idx";

// ============================================================================
// Language
// ============================================================================

/// Language of the morphological analyzer used by the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Russian Snowball analyzer
    #[default]
    Russian,
    /// English Snowball analyzer
    English,
}

// ============================================================================
// Index section
// ============================================================================

/// `[index]` section: where the index lives and how it scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Path of the persisted index file
    #[serde(default = "default_index_path")]
    pub path: PathBuf,
    /// Analyzer language for build-time and query-time normalization
    #[serde(default)]
    pub language: Language,
    /// BM25 term frequency saturation
    #[serde(default = "default_k1")]
    pub k1: f32,
    /// BM25 length normalization
    #[serde(default = "default_b")]
    pub b: f32,
}

fn default_index_path() -> PathBuf {
    PathBuf::from(DEFAULT_INDEX_PATH)
}

fn default_k1() -> f32 {
    1.2
}

fn default_b() -> f32 {
    0.75
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig {
            path: default_index_path(),
            language: Language::default(),
            k1: default_k1(),
            b: default_b(),
        }
    }
}

// ============================================================================
// Model section
// ============================================================================

/// `[model]` section: external cross-encoder endpoint used for reranking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    /// Base URL of the rerank service (e.g. "http://localhost:8080")
    pub endpoint: String,
    /// Model name sent with each request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Optional API key for authenticated endpoints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Request timeout in milliseconds (default: 5000)
    #[serde(default = "default_model_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_model_timeout_ms() -> u64 {
    5000
}

// ============================================================================
// CascadeConfig
// ============================================================================

/// Retrieval configuration loaded from `cascade.toml`.
///
/// # Example
///
/// ```toml
/// top_k_stage1 = 50
/// prf_enable = true
/// score_threshold = 0.3
///
/// [index]
/// path = "cascade.idx"
/// language = "russian"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeConfig {
    /// Candidates fetched by the first lexical pass
    #[serde(default = "default_top_k_stage1")]
    pub top_k_stage1: usize,
    /// Candidates fetched by the second lexical pass (defaults to `top_k_stage1`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k_stage2: Option<usize>,
    /// Whether pseudo-relevance feedback expansion runs
    #[serde(default = "default_true")]
    pub prf_enable: bool,
    /// Stage-1 documents used as feedback
    #[serde(default = "default_prf_top_docs")]
    pub prf_top_docs: usize,
    /// Expansion terms appended to the query
    #[serde(default = "default_prf_top_terms")]
    pub prf_top_terms: usize,
    /// Maximum repetitions of the heaviest expansion term
    #[serde(default = "default_prf_max_repeat")]
    pub prf_max_repeat: usize,
    /// Documents returned after reranking
    #[serde(default = "default_top_k_final")]
    pub top_k_final: usize,
    /// Minimum reranker score for a document to be returned
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f32,
    /// Reranker deadline in milliseconds (0 disables the guard)
    ///
    /// The request fails at the deadline, but the scoring call itself is not
    /// cancelled: its worker thread lives until the scorer returns. Scorers
    /// that can hang need their own deadline (`[model] timeout_ms` for the
    /// HTTP reranker).
    #[serde(default = "default_rerank_timeout_ms")]
    pub rerank_timeout_ms: u64,
    /// Index location and scoring parameters
    #[serde(default)]
    pub index: IndexConfig,
    /// Optional external reranker endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelConfig>,
}

fn default_top_k_stage1() -> usize {
    50
}

fn default_true() -> bool {
    true
}

fn default_prf_top_docs() -> usize {
    30
}

fn default_prf_top_terms() -> usize {
    7
}

fn default_prf_max_repeat() -> usize {
    3
}

fn default_top_k_final() -> usize {
    6
}

fn default_score_threshold() -> f32 {
    0.3
}

fn default_rerank_timeout_ms() -> u64 {
    10_000
}

impl Default for CascadeConfig {
    fn default() -> Self {
        CascadeConfig {
            top_k_stage1: default_top_k_stage1(),
            top_k_stage2: None,
            prf_enable: true,
            prf_top_docs: default_prf_top_docs(),
            prf_top_terms: default_prf_top_terms(),
            prf_max_repeat: default_prf_max_repeat(),
            top_k_final: default_top_k_final(),
            score_threshold: default_score_threshold(),
            rerank_timeout_ms: default_rerank_timeout_ms(),
            index: IndexConfig::default(),
            model: None,
        }
    }
}

impl CascadeConfig {
    /// Breadth of the second lexical pass.
    pub fn stage2_limit(&self) -> usize {
        self.top_k_stage2.unwrap_or(self.top_k_stage1)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns `CascadeError::Config` naming the first offending key.
    pub fn validate(&self) -> CascadeResult<()> {
        if self.top_k_stage1 == 0 {
            return Err(CascadeError::config("top_k_stage1 must be at least 1"));
        }
        if self.top_k_stage2 == Some(0) {
            return Err(CascadeError::config("top_k_stage2 must be at least 1"));
        }
        if self.top_k_final == 0 {
            return Err(CascadeError::config("top_k_final must be at least 1"));
        }
        if self.prf_max_repeat == 0 {
            return Err(CascadeError::config("prf_max_repeat must be at least 1"));
        }
        if !self.score_threshold.is_finite() {
            return Err(CascadeError::config("score_threshold must be a finite number"));
        }
        if !(self.index.k1 > 0.0 && self.index.k1.is_finite()) {
            return Err(CascadeError::config("index.k1 must be positive"));
        }
        if !(0.0..=1.0).contains(&self.index.b) {
            return Err(CascadeError::config("index.b must be within [0, 1]"));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Cascade retrieval configuration

# Candidates fetched by each lexical pass
top_k_stage1 = 50

# Second-pass breadth; defaults to top_k_stage1 when unset
# top_k_stage2 = 50

# Pseudo-relevance feedback
prf_enable = true
prf_top_docs = 30
prf_top_terms = 7
prf_max_repeat = 3

# Final cutoff after reranking
top_k_final = 6
score_threshold = 0.3

# Reranker deadline in milliseconds (0 = no deadline)
rerank_timeout_ms = 10000

[index]
path = "cascade.idx"
# "russian" (default) or "english"
language = "russian"
k1 = 1.2
b = 0.75

# Cross-encoder endpoint used by `cascade query`.
# [model]
# endpoint = "http://localhost:8080"
# model = "BAAI/bge-reranker-v2-m3"   # optional
# api_key = "your-api-key"            # optional
# timeout_ms = 5000                   # optional, default 5000
"#
    }

    /// Parse and validate config from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the text cannot be parsed or fails validation.
    pub fn from_toml_str(content: &str) -> CascadeResult<Self> {
        let config: CascadeConfig = toml::from_str(content)
            .map_err(|e| CascadeError::config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> CascadeResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CascadeError::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            CascadeError::Config(msg) => {
                CascadeError::config(format!("{} ({})", msg, path.display()))
            }
            other => other,
        })
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn from_file_or_default(path: &Path) -> CascadeResult<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `true` when the file was created.
    pub fn write_default_if_missing(path: &Path) -> CascadeResult<bool> {
        if path.exists() {
            return Ok(false);
        }
        std::fs::write(path, Self::default_toml()).map_err(|e| {
            CascadeError::config(format!(
                "Failed to write default config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_matches_production_values() {
        let config = CascadeConfig::default();
        assert_eq!(config.top_k_stage1, 50);
        assert!(config.prf_enable);
        assert_eq!(config.prf_top_docs, 30);
        assert_eq!(config.prf_top_terms, 7);
        assert_eq!(config.prf_max_repeat, 3);
        assert_eq!(config.top_k_final, 6);
        assert!((config.score_threshold - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.index.language, Language::Russian);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config = CascadeConfig::from_toml_str("").unwrap();
        assert_eq!(config, CascadeConfig::default());
    }

    #[test]
    fn default_toml_parses_correctly() {
        let config = CascadeConfig::from_toml_str(CascadeConfig::default_toml()).unwrap();
        assert_eq!(config, CascadeConfig::default());
    }

    #[test]
    fn stage2_limit_falls_back_to_stage1() {
        let mut config = CascadeConfig::default();
        assert_eq!(config.stage2_limit(), 50);
        config.top_k_stage2 = Some(80);
        assert_eq!(config.stage2_limit(), 80);
    }

    #[test]
    fn parse_partial_overrides() {
        let config = CascadeConfig::from_toml_str(
            r#"
prf_enable = false
top_k_final = 2

[index]
language = "english"
"#,
        )
        .unwrap();
        assert!(!config.prf_enable);
        assert_eq!(config.top_k_final, 2);
        assert_eq!(config.top_k_stage1, 50);
        assert_eq!(config.index.language, Language::English);
        assert_eq!(config.index.path, PathBuf::from(DEFAULT_INDEX_PATH));
    }

    #[test]
    fn validate_rejects_zero_limits() {
        assert!(CascadeConfig::from_toml_str("top_k_stage1 = 0").is_err());
        assert!(CascadeConfig::from_toml_str("top_k_final = 0").is_err());
        assert!(CascadeConfig::from_toml_str("prf_max_repeat = 0").is_err());
        assert!(CascadeConfig::from_toml_str("top_k_stage2 = 0").is_err());
    }

    #[test]
    fn validate_rejects_bad_bm25_params() {
        assert!(CascadeConfig::from_toml_str("[index]\nk1 = 0.0").is_err());
        assert!(CascadeConfig::from_toml_str("[index]\nb = 1.5").is_err());
    }

    #[test]
    fn parse_invalid_language_returns_error() {
        let err = CascadeConfig::from_toml_str("[index]\nlanguage = \"klingon\"").unwrap_err();
        assert!(matches!(err, CascadeError::Config(_)));
    }

    #[test]
    fn model_config_round_trip() {
        let config = CascadeConfig {
            model: Some(ModelConfig {
                endpoint: "http://localhost:8080".to_string(),
                model: Some("bge-reranker".to_string()),
                api_key: Some("sk-test".to_string()),
                timeout_ms: 3000,
            }),
            ..CascadeConfig::default()
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = CascadeConfig::from_toml_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn config_without_model_omits_section() {
        let toml_str = toml::to_string_pretty(&CascadeConfig::default()).unwrap();
        assert!(!toml_str.contains("[model]"));
    }

    #[test]
    fn write_default_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        assert!(CascadeConfig::write_default_if_missing(&path).unwrap());
        let config = CascadeConfig::from_file(&path).unwrap();
        assert_eq!(config, CascadeConfig::default());
    }

    #[test]
    fn write_default_does_not_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "top_k_final = 3\n").unwrap();

        assert!(!CascadeConfig::write_default_if_missing(&path).unwrap());
        let config = CascadeConfig::from_file(&path).unwrap();
        assert_eq!(config.top_k_final, 3);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let config = CascadeConfig::from_file_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, CascadeConfig::default());
    }
}

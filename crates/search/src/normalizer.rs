//! Text normalizer for index build and query processing
//!
//! Pipeline: UAX#29 word boundaries → lowercase → remove non-alphanumeric
//!           → drop tokens of two characters or fewer → Snowball stem
//!
//! The Snowball analyzers are process-wide immutable singletons, created on
//! first use and shared by every thread.

use cascade_core::Language;
use once_cell::sync::Lazy;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

/// Tokens with this many characters or fewer are dropped.
pub const MAX_NOISE_TOKEN_CHARS: usize = 2;

static RUSSIAN_ANALYZER: Lazy<Stemmer> = Lazy::new(|| Stemmer::create(Algorithm::Russian));
static ENGLISH_ANALYZER: Lazy<Stemmer> = Lazy::new(|| Stemmer::create(Algorithm::English));

/// A surviving token before and after morphological reduction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedToken {
    /// Lowercased alphanumeric form as it appeared in the text
    pub surface: String,
    /// Canonical form used for matching
    pub lemma: String,
}

/// Turns raw text into the canonical term sequence used for matching.
///
/// Cheap to copy; all state lives in the shared analyzer dictionaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Normalizer {
    language: Language,
}

impl Normalizer {
    /// Create a normalizer for `language`
    pub fn new(language: Language) -> Self {
        Normalizer { language }
    }

    /// Analyzer language
    pub fn language(&self) -> Language {
        self.language
    }

    fn analyzer(&self) -> &'static Stemmer {
        match self.language {
            Language::Russian => &RUSSIAN_ANALYZER,
            Language::English => &ENGLISH_ANALYZER,
        }
    }

    /// Reduce one lowercase token to its canonical form.
    ///
    /// Tokens the analyzer has no rules for come back unchanged.
    pub fn lemma(&self, token: &str) -> String {
        self.analyzer().stem(token).into_owned()
    }

    /// Normalize text into an ordered term sequence.
    ///
    /// Never fails: malformed or empty input yields an empty sequence.
    ///
    /// # Example
    ///
    /// ```
    /// use cascade_search::Normalizer;
    ///
    /// let terms = Normalizer::default().normalize("Орки и их оружие");
    /// assert_eq!(terms.len(), 2); // "и", "их" are dropped as noise
    /// ```
    pub fn normalize(&self, text: &str) -> Vec<String> {
        self.analyze(text).map(|t| t.lemma).collect()
    }

    /// Like [`normalize`](Self::normalize), keeping each token's surface form.
    ///
    /// Normalizing a `surface` again always yields its `lemma`.
    pub fn analyze<'a>(&self, text: &'a str) -> impl Iterator<Item = NormalizedToken> + 'a {
        let normalizer = *self;
        text.unicode_words()
            // Case mapping may emit combining marks, so filter after it.
            .map(|w| {
                w.to_lowercase()
                    .chars()
                    .filter(|c| c.is_alphanumeric())
                    .collect::<String>()
            })
            .filter(|w| w.chars().count() > MAX_NOISE_TOKEN_CHARS)
            .map(move |surface| NormalizedToken {
                lemma: normalizer.lemma(&surface),
                surface,
            })
    }

    /// Normalize and deduplicate, keeping first-occurrence order.
    pub fn normalize_unique(&self, text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        self.normalize(text)
            .into_iter()
            .filter(|t| seen.insert(t.clone()))
            .collect()
    }
}

/// Normalize with the default (Russian) analyzer.
pub fn normalize(text: &str) -> Vec<String> {
    Normalizer::default().normalize(text)
}

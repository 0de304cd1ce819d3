//! Pseudo-relevance feedback term weights
//!
//! TF-IDF computed on the fly over the top stage-1 candidates only. The
//! snapshot lives for one request and is never persisted.
//!
//! Weighting:
//! - tf = raw term count in the candidate
//! - idf = ln((1 + n) / (1 + df)) + 1
//! - each candidate vector is L2-normalized
//! - a term's weight is the mean over all n candidates (absent = 0)

use cascade_search::Normalizer;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Function words that never make useful expansion terms.
const STOPWORDS: &[&str] = &[
    // Russian
    "без", "более", "бы", "был", "была", "были", "было", "быть", "вам", "вас", "весь",
    "во", "вот", "все", "всего", "всех", "вы", "где", "да", "даже", "для", "до", "его",
    "ее", "её", "если", "есть", "еще", "ещё", "же", "за", "здесь", "из", "или", "им",
    "их", "как", "какая", "какой", "когда", "кто", "ли", "либо", "между", "меня", "мне",
    "может", "мы", "на", "над", "надо", "наш", "не", "него", "нее", "неё", "нет", "ни",
    "них", "но", "ну", "об", "однако", "он", "она", "они", "оно", "от", "очень", "по",
    "под", "при", "про", "раз", "с", "со", "так", "также", "такой", "там", "те", "тем",
    "то", "того", "тоже", "той", "только", "том", "тот", "тут", "ты", "уже", "хотя",
    "чем", "через", "что", "чтобы", "чье", "чья", "эта", "эти", "это", "этого", "этой",
    "этом", "этот", "является",
    // English
    "about", "above", "after", "again", "against", "all", "and", "any", "are", "because",
    "been", "before", "being", "below", "between", "both", "but", "can", "could", "did",
    "does", "doing", "down", "during", "each", "few", "for", "from", "further", "had",
    "has", "have", "having", "her", "here", "hers", "herself", "him", "himself", "his",
    "how", "into", "its", "itself", "more", "most", "nor", "not", "now", "off", "once",
    "only", "other", "our", "ours", "out", "over", "own", "same", "she", "should", "some",
    "such", "than", "that", "the", "their", "theirs", "them", "then", "there", "these",
    "they", "this", "those", "through", "too", "under", "until", "very", "was", "were",
    "what", "when", "where", "which", "while", "who", "whom", "why", "will", "with",
    "would", "you", "your", "yours",
];

static STOPWORD_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| STOPWORDS.iter().copied().collect());

/// Stop words reduced by each analyzer, for comparison against lemmas.
static STOPWORD_LEMMAS: Lazy<HashSet<String>> = Lazy::new(|| {
    use cascade_core::Language;
    [Language::Russian, Language::English]
        .into_iter()
        .flat_map(|language| {
            let normalizer = Normalizer::new(language);
            STOPWORDS.iter().map(move |w| normalizer.lemma(w))
        })
        .collect()
});

/// True if the surface form or its lemma is a stop word
pub fn is_stopword(surface: &str, lemma: &str) -> bool {
    STOPWORD_SET.contains(surface) || STOPWORD_LEMMAS.contains(lemma)
}

/// An expansion candidate with its mean TF-IDF weight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightedTerm {
    /// Normalized form
    pub term: String,
    /// First surface form seen in the candidates; normalizes back to `term`
    pub surface: String,
    /// Mean TF-IDF weight over the candidate set
    pub weight: f32,
}

/// Per-request vocabulary and mean term weights over a candidate set.
#[derive(Debug, Clone, Default)]
pub struct TermWeightSnapshot {
    /// Terms in order of first appearance
    terms: Vec<String>,
    /// First surface form of each term
    surfaces: Vec<String>,
    /// Mean weight of each term
    weights: Vec<f32>,
    /// Term -> slot in the vectors above
    slots: HashMap<String, usize>,
    /// Number of candidate texts
    documents: usize,
}

impl TermWeightSnapshot {
    /// Weight the vocabulary of `texts`. Stop words never enter the vocabulary.
    pub fn build<'a, I>(normalizer: &Normalizer, texts: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut snapshot = TermWeightSnapshot::default();
        // Per-document raw counts keyed by vocabulary slot; ordered so the
        // floating-point sums are reproducible
        let mut counts: Vec<BTreeMap<usize, u32>> = Vec::new();

        for text in texts {
            let mut doc_counts: BTreeMap<usize, u32> = BTreeMap::new();
            for token in normalizer.analyze(text) {
                if is_stopword(&token.surface, &token.lemma) {
                    continue;
                }
                let slot = match snapshot.slots.get(&token.lemma) {
                    Some(&slot) => slot,
                    None => {
                        let slot = snapshot.terms.len();
                        snapshot.slots.insert(token.lemma.clone(), slot);
                        snapshot.terms.push(token.lemma);
                        snapshot.surfaces.push(token.surface);
                        slot
                    }
                };
                *doc_counts.entry(slot).or_insert(0) += 1;
            }
            counts.push(doc_counts);
        }

        snapshot.documents = counts.len();
        if snapshot.documents == 0 {
            return snapshot;
        }

        let n = snapshot.documents as f64;
        let mut doc_freq = vec![0u32; snapshot.terms.len()];
        for doc in &counts {
            for &slot in doc.keys() {
                doc_freq[slot] += 1;
            }
        }
        let idf: Vec<f64> = doc_freq
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        let mut sums = vec![0.0f64; snapshot.terms.len()];
        for doc in &counts {
            let norm = doc
                .iter()
                .map(|(&slot, &tf)| (tf as f64 * idf[slot]).powi(2))
                .sum::<f64>()
                .sqrt();
            if norm == 0.0 {
                continue;
            }
            for (&slot, &tf) in doc {
                sums[slot] += tf as f64 * idf[slot] / norm;
            }
        }

        snapshot.weights = sums.into_iter().map(|s| (s / n) as f32).collect();
        snapshot
    }

    /// Number of distinct terms across the candidates
    pub fn vocabulary_len(&self) -> usize {
        self.terms.len()
    }

    /// Number of candidate texts weighted
    pub fn documents(&self) -> usize {
        self.documents
    }

    /// Mean weight of a normalized term, if it occurred
    pub fn weight(&self, term: &str) -> Option<f32> {
        self.slots.get(term).map(|&slot| self.weights[slot])
    }

    /// Highest-weighted terms not in `exclude`, at most `top_n`.
    ///
    /// Equal weights keep first-appearance order.
    pub fn top_terms(&self, exclude: &HashSet<String>, top_n: usize) -> Vec<WeightedTerm> {
        let mut ranked: Vec<usize> = (0..self.terms.len())
            .filter(|&slot| !exclude.contains(&self.terms[slot]))
            .collect();
        // Stable: ties stay in vocabulary order
        ranked.sort_by(|&a, &b| self.weights[b].total_cmp(&self.weights[a]));
        ranked.truncate(top_n);

        ranked
            .into_iter()
            .map(|slot| WeightedTerm {
                term: self.terms[slot].clone(),
                surface: self.surfaces[slot].clone(),
                weight: self.weights[slot],
            })
            .collect()
    }
}

/// Select up to `top_n` expansion terms for `query` from `candidates`.
///
/// Terms already present in the normalized query are excluded. An empty
/// candidate set yields no terms.
pub fn expansion_terms<'a, I>(
    normalizer: &Normalizer,
    query: &str,
    candidates: I,
    top_n: usize,
) -> Vec<WeightedTerm>
where
    I: IntoIterator<Item = &'a str>,
{
    if top_n == 0 {
        return vec![];
    }
    let snapshot = TermWeightSnapshot::build(normalizer, candidates);
    if snapshot.documents() == 0 {
        return vec![];
    }
    let query_terms: HashSet<String> = normalizer.normalize(query).into_iter().collect();
    snapshot.top_terms(&query_terms, top_n)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use cascade_core::Language;

    fn english() -> Normalizer {
        Normalizer::new(Language::English)
    }

    #[test]
    fn test_empty_candidates_yield_nothing() {
        let terms = expansion_terms(&english(), "ork weapons", Vec::<&str>::new(), 5);
        assert!(terms.is_empty());
    }

    #[test]
    fn test_zero_top_n_yields_nothing() {
        let terms = expansion_terms(&english(), "ork", ["ork choppa shoota"], 0);
        assert!(terms.is_empty());
    }

    #[test]
    fn test_query_terms_excluded() {
        let terms = expansion_terms(
            &english(),
            "Ork weapons",
            ["ork weapons choppa", "ork shoota weapons"],
            10,
        );
        let names: Vec<&str> = terms.iter().map(|t| t.term.as_str()).collect();
        assert!(!names.contains(&"ork"));
        assert!(!names.contains(&"weapon"));
        assert!(names.contains(&"choppa"));
    }

    #[test]
    fn test_stopwords_excluded() {
        let snapshot = TermWeightSnapshot::build(&english(), ["the orks were there with their choppas"]);
        assert!(snapshot.weight("the").is_none());
        assert!(snapshot.weight("there").is_none());
        assert!(snapshot.weight("ork").is_some());
        assert!(snapshot.weight("choppa").is_some());
    }

    #[test]
    fn test_russian_stopwords_excluded() {
        let snapshot = TermWeightSnapshot::build(&Normalizer::default(), ["орки также были очень шумными"]);
        let vocab: Vec<&str> = snapshot.terms.iter().map(String::as_str).collect();
        assert_eq!(vocab.len(), 2, "vocabulary: {:?}", vocab);
    }

    #[test]
    fn test_widespread_terms_outweigh_one_off() {
        let snapshot = TermWeightSnapshot::build(
            &english(),
            ["waaagh choppa", "waaagh choppa", "waaagh squig"],
        );
        let squig = snapshot.weight("squig").unwrap();
        assert!(snapshot.weight("choppa").unwrap() > squig);
        assert!(snapshot.weight("waaagh").unwrap() > squig);
    }

    #[test]
    fn test_weights_match_formula() {
        // Two docs: "alpha gamma", "alpha"
        let snapshot = TermWeightSnapshot::build(&english(), ["alpha gamma", "alpha"]);
        let n = 2.0f64;
        let idf_alpha = ((1.0 + n) / (1.0 + 2.0)).ln() + 1.0; // 1.0
        let idf_gamma = ((1.0 + n) / (1.0 + 1.0)).ln() + 1.0;
        let norm0 = (idf_alpha.powi(2) + idf_gamma.powi(2)).sqrt();
        let alpha = (idf_alpha / norm0 + 1.0) / n;
        let gamma = (idf_gamma / norm0) / n;

        assert!((snapshot.weight("alpha").unwrap() as f64 - alpha).abs() < 1e-6);
        assert!((snapshot.weight("gamma").unwrap() as f64 - gamma).abs() < 1e-6);
        assert_eq!(snapshot.documents(), 2);
        assert_eq!(snapshot.vocabulary_len(), 2);
    }

    #[test]
    fn test_ties_keep_first_appearance() {
        let snapshot = TermWeightSnapshot::build(&english(), ["zulu victor xray"]);
        let top = snapshot.top_terms(&HashSet::new(), 3);
        let names: Vec<&str> = top.iter().map(|t| t.term.as_str()).collect();
        assert_eq!(names, vec!["zulu", "victor", "xray"]);
    }

    #[test]
    fn test_top_n_caps_result() {
        let terms = expansion_terms(&english(), "", ["one1 two2 three3 four4 five5"], 2);
        assert_eq!(terms.len(), 2);
    }

    #[test]
    fn test_surface_form_recorded() {
        let terms = expansion_terms(&english(), "ork", ["Choppas everywhere"], 1);
        assert_eq!(terms[0].surface, "choppas");
        assert_eq!(english().normalize(&terms[0].surface), vec![terms[0].term.clone()]);
    }

    #[test]
    fn test_deterministic() {
        let docs = ["orks love choppas", "eldar hate orks", "marines purge orks"];
        let a = expansion_terms(&english(), "orks", docs, 5);
        let b = expansion_terms(&english(), "orks", docs, 5);
        assert_eq!(a, b);
    }
}

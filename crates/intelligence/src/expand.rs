//! Query expansion by weighted repetition
//!
//! Expansion terms are appended to the original query, each repeated in
//! proportion to its weight. Lexical scoring treats the query as a bag of
//! words, so repetition is how weight reaches BM25.
//!
//! reps = 1 + floor((w - w_min) / (w_max - w_min) * (max_repeat - 1))

/// Repeat count for each weight, in `1..=max_repeat`.
///
/// All-equal weights map to 1 each. `max_repeat` of 0 is treated as 1.
pub fn repeat_counts(weights: &[f32], max_repeat: usize) -> Vec<usize> {
    let max_repeat = max_repeat.max(1);
    let (w_min, w_max) = weights
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &w| {
            (lo.min(w), hi.max(w))
        });
    let range = w_max - w_min;
    if !range.is_finite() || range <= 0.0 {
        return vec![1; weights.len()];
    }

    let span = (max_repeat - 1) as f32;
    weights
        .iter()
        .map(|&w| {
            let scaled = ((w - w_min) / range * span).floor();
            if scaled.is_finite() && scaled > 0.0 {
                (1 + scaled as usize).min(max_repeat)
            } else {
                1
            }
        })
        .collect()
}

/// Append `terms` to `query`, each repeated by its weight.
///
/// Without weights (or with a weights slice of the wrong length) every term
/// appears once. Empty `terms` returns the query unchanged.
pub fn expand_query(
    query: &str,
    terms: &[String],
    weights: Option<&[f32]>,
    max_repeat: usize,
) -> String {
    if terms.is_empty() {
        return query.to_string();
    }

    let counts = match weights {
        Some(w) if w.len() == terms.len() => repeat_counts(w, max_repeat),
        Some(w) => {
            tracing::warn!(
                target: "cascade::retrieve",
                terms = terms.len(),
                weights = w.len(),
                "Expansion weights do not match terms, repeating each term once"
            );
            vec![1; terms.len()]
        }
        None => vec![1; terms.len()],
    };

    let mut parts: Vec<&str> = Vec::with_capacity(1 + counts.iter().sum::<usize>());
    if !query.is_empty() {
        parts.push(query);
    }
    for (term, reps) in terms.iter().zip(counts) {
        parts.extend(std::iter::repeat(term.as_str()).take(reps));
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn strings(terms: &[&str]) -> Vec<String> {
        terms.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_weighted_repetition() {
        let expanded = expand_query("q", &strings(&["orc", "ork"]), Some(&[0.1, 0.9]), 3);
        assert_eq!(expanded, "q orc ork ork ork");
    }

    #[test]
    fn test_equal_weights_once_each() {
        assert_eq!(repeat_counts(&[0.4, 0.4, 0.4], 3), vec![1, 1, 1]);
        let expanded = expand_query("q", &strings(&["a1", "b2"]), Some(&[0.5, 0.5]), 5);
        assert_eq!(expanded, "q a1 b2");
    }

    #[test]
    fn test_no_terms_returns_query() {
        assert_eq!(expand_query("оружие орков", &[], Some(&[]), 3), "оружие орков");
        assert_eq!(expand_query("оружие орков", &[], None, 3), "оружие орков");
    }

    #[test]
    fn test_no_weights_once_each() {
        let expanded = expand_query("q", &strings(&["x1", "y2", "z3"]), None, 3);
        assert_eq!(expanded, "q x1 y2 z3");
    }

    #[test]
    fn test_mismatched_weights_ignored() {
        let expanded = expand_query("q", &strings(&["x1", "y2"]), Some(&[0.1]), 3);
        assert_eq!(expanded, "q x1 y2");
    }

    #[test]
    fn test_max_repeat_zero_or_one() {
        assert_eq!(repeat_counts(&[0.1, 0.9], 0), vec![1, 1]);
        assert_eq!(repeat_counts(&[0.1, 0.9], 1), vec![1, 1]);
    }

    #[test]
    fn test_intermediate_weight_floors() {
        // (0.5 - 0.0) / 1.0 * 4 = 2 -> 3 reps; 0.3 * 4 = 1.2 -> 2 reps
        assert_eq!(repeat_counts(&[0.0, 0.3, 0.5, 1.0], 5), vec![1, 2, 3, 5]);
    }

    #[test]
    fn test_single_term() {
        assert_eq!(repeat_counts(&[0.7], 3), vec![1]);
    }

    #[test]
    fn test_empty_query_has_no_leading_space() {
        assert_eq!(expand_query("", &strings(&["abc"]), None, 3), "abc");
    }

    proptest! {
        #[test]
        fn repeat_counts_stay_in_range(
            weights in prop::collection::vec(0.0f32..10.0, 1..20),
            max_repeat in 1usize..8,
        ) {
            let counts = repeat_counts(&weights, max_repeat);
            prop_assert_eq!(counts.len(), weights.len());
            for &c in &counts {
                prop_assert!(c >= 1 && c <= max_repeat);
            }
        }

        #[test]
        fn heavier_weight_never_repeats_less(
            weights in prop::collection::vec(0.0f32..10.0, 2..20),
            max_repeat in 1usize..8,
        ) {
            let counts = repeat_counts(&weights, max_repeat);
            for i in 0..weights.len() {
                for j in 0..weights.len() {
                    if weights[i] > weights[j] {
                        prop_assert!(counts[i] >= counts[j]);
                    }
                }
            }
        }
    }
}

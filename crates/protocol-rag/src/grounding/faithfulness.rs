//! Term-overlap faithfulness of an answer to the passages it was given

use std::collections::HashSet;

use crate::generation::citation::strip_markers;
use crate::index::tokenize::{term_set, tokenize};
use crate::retrieval::ScoredPassage;

/// Fraction of the answer's informative terms found in the supplied passages
///
/// Citation markers are stripped first so a cited document name never counts
/// as support. An answer with no informative terms scores 0.
pub fn score(answer: &str, passages: &[ScoredPassage]) -> f32 {
    let answer_terms = term_set(&strip_markers(answer));
    if answer_terms.is_empty() {
        return 0.0;
    }

    let support: HashSet<String> = passages
        .iter()
        .flat_map(|entry| tokenize(&entry.passage.text))
        .collect();

    let supported = answer_terms
        .iter()
        .filter(|term| support.contains(term.as_str()))
        .count();

    (supported as f32 / answer_terms.len() as f32).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Passage;

    fn passages() -> Vec<ScoredPassage> {
        vec![ScoredPassage {
            passage: Passage::new(
                1,
                "sepsis.pdf",
                "Sepsis Hour-1 Bundle: measure lactate, obtain blood cultures, administer broad-spectrum antibiotics",
            )
            .with_page(3),
            score: 0.7,
        }]
    }

    #[test]
    fn test_verbatim_answer_fully_supported() {
        let answer = "Measure lactate, obtain blood cultures [Source: sepsis.pdf, Page 3].";
        assert!((score(answer, &passages()) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_unrelated_answer_unsupported() {
        assert_eq!(score("Give labetalol intravenously.", &passages()), 0.0);
    }

    #[test]
    fn test_partial_support() {
        // lactate, blood supported; labetalol, dose unsupported
        let s = score("Lactate, blood, labetalol dose", &passages());
        assert!((s - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_empty_and_stop_word_answers() {
        assert_eq!(score("", &passages()), 0.0);
        assert_eq!(score("the and of it", &passages()), 0.0);
        assert_eq!(score("Lactate", &[]), 0.0);
    }

    #[test]
    fn test_markers_do_not_count() {
        assert_eq!(score("[Source: sepsis.pdf, Page 3]", &passages()), 0.0);
    }

    #[test]
    fn test_deterministic_and_monotonic() {
        let verbatim = "administer broad-spectrum antibiotics";
        let unrelated = "tPA window four hours";
        let a = score(verbatim, &passages());
        assert_eq!(a, score(verbatim, &passages()));
        assert!(a >= score(unrelated, &passages()));
    }
}

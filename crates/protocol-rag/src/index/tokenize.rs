//! Term extraction shared by the index, the faithfulness scorer and the
//! citation attributor
//!
//! All three must agree on what a "term" is, otherwise an answer copied
//! verbatim from a passage could fail to overlap with it.

use once_cell::sync::Lazy;
use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // English
        "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be",
        "been", "before", "being", "between", "but", "by", "can", "could", "did", "do",
        "does", "during", "each", "for", "from", "had", "has", "have", "he", "her", "his",
        "how", "i", "if", "in", "into", "is", "it", "its", "may", "me", "might", "more",
        "most", "must", "my", "of", "on", "only", "or", "other", "our", "out",
        "over", "per", "please", "shall", "she", "should", "so", "some", "such", "tell",
        "than", "that", "the", "their", "them", "then", "there", "these", "they", "this",
        "those", "to", "under", "up", "was", "we", "were", "what", "when", "where", "which",
        "while", "who", "whom", "why", "will", "with", "within", "would", "you",
        "your",
        // Arabic
        "في", "من", "على", "إلى", "الى", "عن", "أو", "او", "و", "إذا", "اذا", "هو", "هي",
        "هذا", "هذه", "ذلك", "تلك", "كان", "كانت", "مع", "ما", "ماذا", "قد",
        "التي", "الذي", "كل", "بعد", "قبل", "خلال", "عند", "هل", "كيف", "أن", "ان",
    ]
    .into_iter()
    .collect()
});

/// Whether a lowercased token carries no retrieval signal
pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(token)
}

/// Split text into lowercased informative terms, in order of appearance
///
/// Words follow Unicode word boundaries, so Arabic words keep their
/// combining marks together; the marks are then dropped so vocalized and
/// plain spellings match. Stop-words and single-character tokens other than
/// digits ("1" in "Hour-1" is kept) are removed. Negations such as "not",
/// "no" and "without" are kept as terms.
pub fn tokenize(text: &str) -> Vec<String> {
    text.unicode_words()
        .map(normalize_word)
        .filter(|token| !token.is_empty())
        .filter(|token| {
            let mut chars = token.chars();
            let single = chars.next().is_some() && chars.next().is_none();
            !(single && !token.chars().all(|c| c.is_numeric()))
        })
        .filter(|token| !is_stop_word(token))
        .collect()
}

/// Lowercase and drop Arabic diacritics (harakat, tanwin, dagger alif)
fn normalize_word(word: &str) -> String {
    word.chars()
        .filter(|c| !matches!(c, '\u{064B}'..='\u{065F}' | '\u{0670}'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Distinct informative terms of `text`
pub fn term_set(text: &str) -> HashSet<String> {
    tokenize(text).into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_clinical_text() {
        let tokens = tokenize("Sepsis Hour-1 Bundle: administer broad-spectrum antibiotics within 1 hour");
        assert_eq!(
            tokens,
            vec![
                "sepsis", "hour", "1", "bundle", "administer", "broad", "spectrum",
                "antibiotics", "1", "hour"
            ]
        );
    }

    #[test]
    fn test_single_letters_dropped() {
        assert_eq!(tokenize("a b 4 x-ray"), vec!["4", "ray"]);
    }

    #[test]
    fn test_arabic_terms() {
        let tokens = tokenize("إعطاء مضادات حيوية في الساعة الأولى");
        assert!(tokens.contains(&"مضادات".to_string()));
        assert!(!tokens.contains(&"في".to_string()));
    }

    #[test]
    fn test_arabic_diacritics_do_not_split_words() {
        let plain = tokenize("مضادات حيوية");
        let vocalized = tokenize("مُضَادَّاتٌ حَيَوِيَّة");
        assert_eq!(plain, vec!["مضادات", "حيوية"]);
        assert_eq!(vocalized, plain);
    }

    #[test]
    fn test_negations_are_informative() {
        assert_eq!(
            tokenize("Do not administer antibiotics"),
            vec!["not", "administer", "antibiotics"]
        );
        assert!(tokenize("no contrast").contains(&"no".to_string()));
        assert!(tokenize("لا تعطي الأسبرين").contains(&"لا".to_string()));
    }

    #[test]
    fn test_term_set_dedupes() {
        let terms = term_set("Hour hour HOUR lactate");
        assert_eq!(terms.len(), 2);
    }
}

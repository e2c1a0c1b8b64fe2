//! Citation extraction and linking

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use unicode_segmentation::UnicodeSegmentation;

use crate::index::tokenize::term_set;
use crate::retrieval::ScoredPassage;
use crate::types::{Citation, SourceSnippet};

/// Maximum snippet length shown in sources
pub const SNIPPET_CHARS: usize = 150;

/// Matches `[Source: doc]` and `[Source: doc, Page N]`
static MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\[\s*source:\s*([^,\]]+?)\s*(?:,\s*page\s*(\d+)\s*)?\]")
        .expect("Invalid regex")
});

/// Marker found in generated text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub document_id: String,
    pub page_number: Option<u32>,
}

/// All citation markers in `text`, in order of appearance
pub fn extract_markers(text: &str) -> Vec<Marker> {
    MARKER
        .captures_iter(text)
        .filter_map(|cap| {
            let document_id = cap.get(1)?.as_str().trim().to_string();
            let page_number = cap.get(2).and_then(|m| m.as_str().parse().ok());
            Some(Marker {
                document_id,
                page_number,
            })
        })
        .collect()
}

/// Remove citation markers from `text`
pub fn strip_markers(text: &str) -> String {
    MARKER.replace_all(text, " ").into_owned()
}

/// Attribute `answer` to the passages it was generated from
///
/// Markers naming a supplied passage are linked first. When no marker
/// matches, each sentence is matched to the passages sharing enough terms
/// with it. Only supplied passages are ever cited.
pub fn attribute(answer: &str, passages: &[ScoredPassage]) -> BTreeSet<Citation> {
    let mut citations = BTreeSet::new();

    for marker in extract_markers(answer) {
        if let Some(entry) = find_matching_passage(passages, &marker) {
            citations.insert(entry.passage.citation());
        } else {
            tracing::debug!(
                "Ignoring marker for unsupplied source {:?} page {:?}",
                marker.document_id,
                marker.page_number
            );
        }
    }

    if citations.is_empty() {
        citations = attribute_by_overlap(answer, passages);
        if !citations.is_empty() {
            tracing::debug!("Attributed {} citations by term overlap", citations.len());
        }
    }

    citations
}

/// Snippets for the passages backing `citations`, in rank order
pub fn source_snippets(
    citations: &BTreeSet<Citation>,
    passages: &[ScoredPassage],
) -> Vec<SourceSnippet> {
    let mut emitted = HashSet::new();

    passages
        .iter()
        .filter(|entry| citations.contains(&entry.passage.citation()))
        .filter(|entry| emitted.insert(entry.passage.citation()))
        .map(|entry| SourceSnippet {
            passage_id: entry.passage.id,
            document_id: entry.passage.document_id.clone(),
            page_number: entry.passage.page_number,
            section_title: entry.passage.section_title.clone(),
            snippet: truncate_snippet(entry.passage.text.trim(), SNIPPET_CHARS),
            similarity_score: entry.score,
        })
        .collect()
}

fn find_matching_passage<'a>(
    passages: &'a [ScoredPassage],
    marker: &Marker,
) -> Option<&'a ScoredPassage> {
    let same_document = |entry: &&ScoredPassage| {
        entry.passage.document_id.eq_ignore_ascii_case(&marker.document_id)
    };

    match marker.page_number {
        Some(page) => passages
            .iter()
            .filter(same_document)
            .find(|entry| entry.passage.page_number == Some(page)),
        // A page-less marker names the document's first supplied passage
        None => passages.iter().find(same_document),
    }
}

fn attribute_by_overlap(answer: &str, passages: &[ScoredPassage]) -> BTreeSet<Citation> {
    let passage_terms: Vec<HashSet<String>> = passages
        .iter()
        .map(|entry| term_set(&entry.passage.text))
        .collect();

    let mut citations = BTreeSet::new();
    let stripped = strip_markers(answer);

    for sentence in stripped.unicode_sentences() {
        let terms = term_set(sentence);
        if terms.is_empty() {
            continue;
        }
        let needed = 2.min(terms.len().div_ceil(2));

        for (entry, candidate) in passages.iter().zip(&passage_terms) {
            let shared = terms.intersection(candidate).count();
            if shared >= needed {
                citations.insert(entry.passage.citation());
            }
        }
    }

    citations
}

/// Truncate snippet to a maximum length while preserving word boundaries
pub fn truncate_snippet(snippet: &str, max_chars: usize) -> String {
    if snippet.chars().count() <= max_chars {
        return snippet.to_string();
    }

    let end = snippet
        .char_indices()
        .nth(max_chars)
        .map(|(i, _)| i)
        .unwrap_or(snippet.len());

    match snippet[..end].rfind(char::is_whitespace) {
        Some(pos) if pos > 0 => format!("{}...", snippet[..pos].trim_end()),
        _ => format!("{}...", &snippet[..end]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Passage;

    fn scored(passage: Passage, score: f32) -> ScoredPassage {
        ScoredPassage { passage, score }
    }

    fn supplied() -> Vec<ScoredPassage> {
        vec![
            scored(
                Passage::new(1, "sepsis.pdf", "Administer broad-spectrum antibiotics within 1 hour")
                    .with_page(3),
                0.8,
            ),
            scored(
                Passage::new(2, "sepsis.pdf", "Measure lactate and repeat if above 2 mmol/L")
                    .with_page(4),
                0.5,
            ),
        ]
    }

    #[test]
    fn test_extract_markers() {
        let markers = extract_markers(
            "Give antibiotics [Source: sepsis.pdf, Page 3]. See also [source: stroke.pdf].",
        );
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].document_id, "sepsis.pdf");
        assert_eq!(markers[0].page_number, Some(3));
        assert_eq!(markers[1].document_id, "stroke.pdf");
        assert_eq!(markers[1].page_number, None);
    }

    #[test]
    fn test_strip_markers() {
        let stripped = strip_markers("Antibiotics within 1 hour [Source: sepsis.pdf, Page 3].");
        assert!(!stripped.contains("Source"));
        assert!(stripped.contains("Antibiotics within 1 hour"));
    }

    #[test]
    fn test_marker_linking() {
        let citations = attribute(
            "Give antibiotics within 1 hour [Source: sepsis.pdf, Page 3].",
            &supplied(),
        );
        assert_eq!(
            citations.into_iter().collect::<Vec<_>>(),
            vec![Citation::new("sepsis.pdf", Some(3))]
        );
    }

    #[test]
    fn test_unsupplied_marker_never_cited() {
        let citations = attribute(
            "Give tPA within 4.5 hours [Source: stroke.pdf, Page 1].",
            &supplied(),
        );
        assert!(!citations.contains(&Citation::new("stroke.pdf", Some(1))));
    }

    #[test]
    fn test_overlap_fallback() {
        let citations = attribute(
            "Lactate should be measured and repeated when above 2 mmol/L.",
            &supplied(),
        );
        assert!(citations.contains(&Citation::new("sepsis.pdf", Some(4))));
        assert!(!citations.contains(&Citation::new("sepsis.pdf", Some(3))));
    }

    #[test]
    fn test_citations_subset_of_supplied() {
        let passages = supplied();
        let allowed: BTreeSet<Citation> = passages.iter().map(|e| e.passage.citation()).collect();
        let answers = [
            "Antibiotics [Source: other.pdf, Page 9] and lactate [Source: sepsis.pdf, Page 4].",
            "Unrelated text about cardiology and troponin.",
            "",
        ];
        for answer in answers {
            assert!(attribute(answer, &passages).is_subset(&allowed));
        }
    }

    #[test]
    fn test_source_snippets() {
        let passages = supplied();
        let mut citations = BTreeSet::new();
        citations.insert(Citation::new("sepsis.pdf", Some(4)));

        let sources = source_snippets(&citations, &passages);
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].passage_id, 2);
        assert!((sources[0].similarity_score - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_truncate_snippet() {
        let snippet = "This is a very long snippet that needs to be truncated.";
        let truncated = truncate_snippet(snippet, 20);

        assert!(truncated.chars().count() <= 23);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncate_snippet("short", 20), "short");
    }

    #[test]
    fn test_truncate_snippet_multibyte() {
        let snippet = "يجب إعطاء المضادات الحيوية خلال ساعة واحدة من التشخيص";
        let truncated = truncate_snippet(snippet, 10);
        assert!(truncated.ends_with("..."));
        assert!(truncated.chars().count() <= 13);
    }
}

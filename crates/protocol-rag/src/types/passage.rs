//! Passage type with source tracking for citations

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::response::Citation;
use crate::error::Result;

/// Immutable unit of retrievable guideline text
///
/// Passages are produced by an external chunking step and are read-only to
/// the pipeline. `token_count` defaults to an estimate when the ingestion
/// side does not supply one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PassageRecord")]
pub struct Passage {
    /// Stable, unique passage identifier
    pub id: u64,
    /// Passage text (non-empty)
    pub text: String,
    /// Source document identifier (usually the file name)
    pub document_id: String,
    /// 1-based page number, if known
    pub page_number: Option<u32>,
    /// Section title (if detected)
    pub section_title: Option<String>,
    /// Token count used for context budgeting
    pub token_count: usize,
}

/// Wire form of a passage; `token_count` is optional on input
#[derive(Deserialize)]
struct PassageRecord {
    id: u64,
    text: String,
    document_id: String,
    #[serde(default)]
    page_number: Option<u32>,
    #[serde(default)]
    section_title: Option<String>,
    #[serde(default)]
    token_count: Option<usize>,
}

impl From<PassageRecord> for Passage {
    fn from(record: PassageRecord) -> Self {
        let token_count = record
            .token_count
            .unwrap_or_else(|| estimate_tokens(&record.text));
        Self {
            id: record.id,
            text: record.text,
            document_id: record.document_id,
            page_number: record.page_number,
            section_title: record.section_title,
            token_count,
        }
    }
}

impl Passage {
    /// Create a passage with an estimated token count and no page
    pub fn new(id: u64, document_id: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            id,
            token_count: estimate_tokens(&text),
            text,
            document_id: document_id.into(),
            page_number: None,
            section_title: None,
        }
    }

    /// Set the page number
    pub fn with_page(mut self, page: u32) -> Self {
        self.page_number = Some(page);
        self
    }

    /// Set the section title
    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section_title = Some(section.into());
        self
    }

    /// Override the estimated token count
    pub fn with_token_count(mut self, tokens: usize) -> Self {
        self.token_count = tokens;
        self
    }

    /// The (document, page) pair this passage is cited as
    pub fn citation(&self) -> Citation {
        Citation::new(self.document_id.clone(), self.page_number)
    }

    /// Inline provenance marker placed in the prompt, e.g. `[Source: sepsis.pdf, Page 3]`
    pub fn marker(&self) -> String {
        self.citation().format_inline()
    }
}

/// Read a JSON array of passages from `path`
pub fn load_passages(path: impl AsRef<Path>) -> Result<Vec<Passage>> {
    let raw = std::fs::read_to_string(path.as_ref())?;
    let passages: Vec<Passage> = serde_json::from_str(&raw)?;
    tracing::debug!(
        "Loaded {} passages from {}",
        passages.len(),
        path.as_ref().display()
    );
    Ok(passages)
}

/// Rough token estimate: four characters per token, at least one
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_format() {
        let passage = Passage::new(1, "sepsis.pdf", "Lactate level").with_page(3);
        assert_eq!(passage.marker(), "[Source: sepsis.pdf, Page 3]");

        let passage = Passage::new(2, "stroke.pdf", "FAST assessment");
        assert_eq!(passage.marker(), "[Source: stroke.pdf]");
    }

    #[test]
    fn test_token_estimate() {
        assert_eq!(estimate_tokens(""), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn test_deserialize_fills_token_count() {
        let json = r#"[
            {"id": 1, "text": "Give aspirin 300 mg chewed", "document_id": "chest-pain.pdf", "page_number": 2},
            {"id": 2, "text": "CT brain", "document_id": "stroke.pdf", "token_count": 40}
        ]"#;
        let passages: Vec<Passage> = serde_json::from_str(json).unwrap();

        assert_eq!(passages[0].page_number, Some(2));
        assert_eq!(passages[0].token_count, estimate_tokens("Give aspirin 300 mg chewed"));
        assert_eq!(passages[1].page_number, None);
        assert_eq!(passages[1].token_count, 40);
    }

    #[test]
    fn test_load_passages() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id": 7, "text": "Sepsis bundle", "document_id": "sepsis.pdf", "page_number": 3}}]"#
        )
        .unwrap();

        let passages = load_passages(file.path()).unwrap();
        assert_eq!(passages.len(), 1);
        assert_eq!(passages[0].citation(), Citation::new("sepsis.pdf", Some(3)));

        let missing = load_passages(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(crate::error::Error::Io(_))));
    }
}

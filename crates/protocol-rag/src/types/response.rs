//! Answer types returned by the pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Citation pointing at a (document, page) pair
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Citation {
    /// Source document identifier
    pub document_id: String,
    /// Page number (if known)
    pub page_number: Option<u32>,
}

impl Citation {
    pub fn new(document_id: impl Into<String>, page_number: Option<u32>) -> Self {
        Self {
            document_id: document_id.into(),
            page_number,
        }
    }

    /// Format citation for display in text
    pub fn format_inline(&self) -> String {
        match self.page_number {
            Some(page) => format!("[Source: {}, Page {}]", self.document_id, page),
            None => format!("[Source: {}]", self.document_id),
        }
    }
}

/// Whether the pipeline returned a grounded answer or refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnswerStatus {
    Answered,
    Refused,
}

/// A cited passage as shown to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSnippet {
    pub passage_id: u64,
    pub document_id: String,
    pub page_number: Option<u32>,
    pub section_title: Option<String>,
    /// Start of the passage text, cut at a word boundary
    pub snippet: String,
    /// Retrieval similarity (0.0-1.0)
    pub similarity_score: f32,
}

/// Final answer for one query
///
/// Refused answers have the same shape: the fixed refusal text, empty
/// citations and sources, and the faithfulness score that led to refusal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// Answer text, or the refusal message
    pub text: String,
    /// Faithfulness of the answer to the retrieved passages (0.0-1.0)
    pub confidence: f32,
    pub status: AnswerStatus,
    /// (document, page) pairs supporting the answer
    pub citations: BTreeSet<Citation>,
    /// Cited passages with snippets
    pub sources: Vec<SourceSnippet>,
    /// Passages returned by the retriever
    pub passages_retrieved: usize,
    /// Passages placed in the prompt
    pub passages_used: usize,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
    pub answered_at: DateTime<Utc>,
}

impl Answer {
    /// Create a refusal carrying the fixed message
    pub fn refused(message: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: message.into(),
            confidence: confidence.clamp(0.0, 1.0),
            status: AnswerStatus::Refused,
            citations: BTreeSet::new(),
            sources: Vec::new(),
            passages_retrieved: 0,
            passages_used: 0,
            processing_time_ms: 0,
            answered_at: Utc::now(),
        }
    }

    pub fn is_answered(&self) -> bool {
        self.status == AnswerStatus::Answered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_citation_ordering() {
        let mut set = BTreeSet::new();
        set.insert(Citation::new("b.pdf", Some(1)));
        set.insert(Citation::new("a.pdf", Some(3)));
        set.insert(Citation::new("a.pdf", None));
        set.insert(Citation::new("a.pdf", Some(3)));

        let ordered: Vec<_> = set.into_iter().collect();
        assert_eq!(ordered.len(), 3);
        assert_eq!(ordered[0], Citation::new("a.pdf", None));
        assert_eq!(ordered[1], Citation::new("a.pdf", Some(3)));
    }

    #[test]
    fn test_refused_shape() {
        let answer = Answer::refused("Not available.", 1.7);
        assert_eq!(answer.status, AnswerStatus::Refused);
        assert!(answer.citations.is_empty());
        assert_eq!(answer.confidence, 1.0);

        let json = serde_json::to_value(&answer).unwrap();
        assert_eq!(json["status"], "REFUSED");
        assert!(json["citations"].as_array().unwrap().is_empty());
    }
}

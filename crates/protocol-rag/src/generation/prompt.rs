//! Context assembly and the grounding prompt contract

use std::collections::HashSet;

use crate::retrieval::{RetrievalResult, ScoredPassage};

use super::citation::strip_markers;

/// Sentence the generator must use when the passages do not cover the question
pub const NOT_AVAILABLE_SENTENCE: &str =
    "This information is not available in the provided protocols.";

/// Fixed grounding instruction placed at the top of every prompt
pub const GROUNDING_INSTRUCTION: &str = r#"You are a senior clinical protocol assistant. You ONLY use information from the approved protocol passages provided below.

GROUNDING RULES - FOLLOW EXACTLY:
1. ONLY use information that is EXPLICITLY stated in the PASSAGES below
2. If the passages do not answer the question, reply exactly: "This information is not available in the provided protocols."
3. NEVER use external knowledge, general medical knowledge, or training data
4. NEVER infer doses, timings, or thresholds that are not written in the passages
5. Cite every claim with the marker of its passage, copied exactly, e.g. [Source: sepsis.pdf, Page 3]
6. Answer in professional medical terminology and stay close to the source wording"#;

/// Phrases that signal the generator declined to answer
const DECLINE_PHRASES: &[&str] = &[
    "this information is not available in the provided protocols",
    "information not found in guidelines",
];

/// Prompt sent to the generator, with the passages it contains
#[derive(Debug, Clone)]
pub struct Prompt {
    /// Full prompt text
    pub text: String,
    passages: Vec<ScoredPassage>,
    token_count: usize,
}

impl Prompt {
    /// Passages included in the prompt, in rank order
    pub fn passages(&self) -> &[ScoredPassage] {
        &self.passages
    }

    /// Sum of `token_count` over included passages
    pub fn token_count(&self) -> usize {
        self.token_count
    }

    pub fn has_context(&self) -> bool {
        !self.passages.is_empty()
    }
}

/// Prompt builder for grounded queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Select passages within `max_tokens` and build the grounded prompt
    ///
    /// Walks passages in rank order, skips text already included, and stops
    /// at the first passage that would exceed the budget. Passages are never
    /// cut.
    pub fn assemble(question: &str, retrieval: &RetrievalResult, max_tokens: usize) -> Prompt {
        let mut included: Vec<ScoredPassage> = Vec::new();
        let mut seen_text = HashSet::new();
        let mut used = 0usize;

        for entry in retrieval.iter() {
            if !seen_text.insert(normalize(&entry.passage.text)) {
                tracing::debug!("Skipping duplicate passage {}", entry.passage.id);
                continue;
            }
            // `used <= max_tokens` holds here, so the subtraction cannot wrap
            if entry.passage.token_count > max_tokens - used {
                tracing::debug!(
                    "Token budget reached at passage {} ({} + {} > {})",
                    entry.passage.id,
                    used,
                    entry.passage.token_count,
                    max_tokens
                );
                break;
            }
            used += entry.passage.token_count;
            included.push(entry.clone());
        }

        let context = Self::build_context(&included);
        let text = format!(
            "{instruction}\n\nPASSAGES:\n{context}\nQUESTION: {question}\n\nGrounded answer:",
            instruction = GROUNDING_INSTRUCTION,
            context = context,
            question = question.trim(),
        );

        Prompt {
            text,
            passages: included,
            token_count: used,
        }
    }

    /// Build the passages block with inline markers
    pub fn build_context(passages: &[ScoredPassage]) -> String {
        let mut context = String::new();

        for (i, entry) in passages.iter().enumerate() {
            let passage = &entry.passage;
            context.push_str(&format!("[{}] {}", i + 1, passage.marker()));
            if let Some(section) = &passage.section_title {
                context.push_str(&format!(" (Section: {})", section));
            }
            context.push_str(&format!("\n{}\n\n---\n\n", passage.text.trim()));
        }

        context
    }
}

/// Whether the whole answer is the "not available" sentence
///
/// Markers, case and surrounding punctuation are ignored. An answer that
/// declines only part of the question still carries content and is left to
/// the faithfulness check.
pub fn declines(answer: &str) -> bool {
    let stripped = strip_markers(answer);
    let body = normalize(&stripped);
    let body = body.trim_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace());
    DECLINE_PHRASES.iter().any(|phrase| body == *phrase)
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

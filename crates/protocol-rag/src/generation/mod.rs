//! Prompt assembly and citation handling around the generator

pub mod citation;
pub mod prompt;

pub use citation::{attribute, extract_markers, source_snippets, strip_markers, Marker};
pub use prompt::{declines, Prompt, PromptBuilder, GROUNDING_INSTRUCTION, NOT_AVAILABLE_SENTENCE};

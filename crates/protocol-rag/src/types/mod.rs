//! Core types for the grounding pipeline

pub mod passage;
pub mod query;
pub mod response;

pub use passage::{estimate_tokens, load_passages, Passage};
pub use query::{QueryParams, QueryRequest};
pub use response::{Answer, AnswerStatus, Citation, SourceSnippet};

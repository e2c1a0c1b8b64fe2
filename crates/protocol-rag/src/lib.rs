//! protocol-rag: grounded question answering over approved clinical protocols
//!
//! Passages are indexed with a term-frequency or embedding vectorizer, the
//! best matches are packed into a grounding prompt, and the generated answer
//! is returned only when it is supported by those passages. Otherwise a fixed
//! refusal is returned. Answers carry (document, page) citations.

pub mod config;
pub mod error;
pub mod generation;
pub mod grounding;
pub mod index;
pub mod pipeline;
pub mod providers;
pub mod retrieval;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use index::{CorpusIndex, IndexStore, VectorizerSource};
pub use pipeline::GroundedAnswerer;
pub use providers::{build_embedding, build_generator, EmbeddingFunction, Generator};
pub use retrieval::{RetrievalResult, ScoredPassage};
pub use types::{Answer, AnswerStatus, Citation, Passage, QueryRequest};

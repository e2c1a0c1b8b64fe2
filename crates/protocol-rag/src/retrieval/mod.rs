//! Passage retrieval

pub mod search;

pub use search::{search, RetrievalResult, Retriever, ScoredPassage};

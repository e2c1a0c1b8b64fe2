//! Corpus index: tokenization, vectorizers and the atomically swapped active index

pub mod corpus;
pub mod store;
pub mod tokenize;
pub mod vectorizer;

pub use corpus::{CorpusIndex, IndexStats};
pub use store::IndexStore;
pub use vectorizer::{
    EmbeddingVectorizer, SparseVector, TermFrequencyVectorizer, Vector, Vectorizer,
    VectorizerSource,
};

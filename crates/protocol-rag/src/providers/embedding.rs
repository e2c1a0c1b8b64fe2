//! Embedding function trait for the dense similarity backend

use crate::error::Result;

/// External text embedding capability
///
/// Called synchronously during index builds and query encoding. Remote
/// implementations use a blocking HTTP client, so callers inside an async
/// runtime go through `spawn_blocking` (see `Retriever::retrieve_blocking`).
/// Any failure is reported as a vectorization error.
pub trait EmbeddingFunction: Send + Sync {
    /// Generate embedding for a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts (batch)
    ///
    /// Default implementation calls `embed` sequentially.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.embed(text)).collect()
    }

    /// Fixed length of every embedding this function returns
    fn dimensions(&self) -> usize;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

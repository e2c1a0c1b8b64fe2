//! Provider abstractions for embeddings and answer generation
//!
//! Trait-based so the pipeline can switch between a local Ollama server and
//! the hosted Gemini API.

pub mod embedding;
pub mod gemini;
pub mod llm;
pub mod ollama;

use std::sync::Arc;

use crate::config::{GeneratorBackend, LlmConfig};
use crate::error::Result;

pub use embedding::EmbeddingFunction;
pub use gemini::{GeminiEmbedding, GeminiGenerator};
pub use llm::Generator;
pub use ollama::{OllamaEmbedding, OllamaGenerator};

/// Construct the generator selected by `config.backend`
pub fn build_generator(config: &LlmConfig) -> Result<Arc<dyn Generator>> {
    let generator: Arc<dyn Generator> = match config.backend {
        GeneratorBackend::Ollama => Arc::new(OllamaGenerator::new(config)?),
        GeneratorBackend::Gemini => Arc::new(GeminiGenerator::new(config)?),
    };
    tracing::info!(
        "Using {} generator (model: {})",
        generator.name(),
        generator.model()
    );
    Ok(generator)
}

/// Construct the embedding function for `config.backend`
///
/// The returned function blocks on HTTP; call it from a blocking context.
pub fn build_embedding(config: &LlmConfig) -> Result<Arc<dyn EmbeddingFunction>> {
    let embedding: Arc<dyn EmbeddingFunction> = match config.backend {
        GeneratorBackend::Ollama => Arc::new(OllamaEmbedding::new(config)?),
        GeneratorBackend::Gemini => Arc::new(GeminiEmbedding::new(config)?),
    };
    tracing::info!(
        "Using {} embeddings ({} dimensions)",
        embedding.name(),
        embedding.dimensions()
    );
    Ok(embedding)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_follows_backend() {
        let config = LlmConfig::default();
        assert_eq!(build_embedding(&config).unwrap().name(), "ollama");

        let config = LlmConfig {
            backend: GeneratorBackend::Gemini,
            api_key: Some("test-key".to_string()),
            ..LlmConfig::default()
        };
        let embedding = build_embedding(&config).unwrap();
        assert_eq!(embedding.name(), "gemini");
        assert_eq!(embedding.dimensions(), 768);
    }
}

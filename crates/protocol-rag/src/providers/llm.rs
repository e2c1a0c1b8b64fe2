//! Generator trait for producing answers from a grounded prompt

use async_trait::async_trait;

use crate::error::Result;
use crate::generation::Prompt;

/// Text generator behind the pipeline
///
/// Implementations:
/// - `OllamaGenerator`: local Ollama server
/// - `GeminiGenerator`: Google Generative Language API
///
/// Any failure is reported as `Error::GeneratorUnavailable`. Implementations
/// do not retry; the pipeline bounds each call with a timeout.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate an answer for the assembled prompt
    async fn generate(&self, prompt: &Prompt) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}

//! Ollama providers: `/api/generate` for answers, `/api/embeddings` for vectors

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::generation::Prompt;

use super::embedding::EmbeddingFunction;
use super::llm::Generator;

/// Ollama API client for non-streaming generation
pub struct OllamaGenerator {
    client: Client,
    base_url: String,
    model: String,
    temperature: f32,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaGenerator {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    async fn generate(&self, prompt: &Prompt) -> Result<String> {
        let request = GenerateRequest {
            model: &self.model,
            prompt: &prompt.text,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
            },
        };

        tracing::info!("Generating answer with model: {}", self.model);

        let response = self
            .client
            .post(self.url("/api/generate"))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::generator(format!("Generation request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::generator(format!(
                "Generation failed: HTTP {} - {}",
                status, body
            )));
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::generator(format!("Failed to parse generation response: {}", e)))?;

        if generated.response.trim().is_empty() {
            return Err(Error::generator("Ollama returned an empty answer"));
        }

        Ok(generated.response)
    }

    /// Check if Ollama is available
    async fn health_check(&self) -> Result<bool> {
        match self.client.get(self.url("/api/tags")).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Ollama embedding function using nomic-embed-text or similar models
///
/// Uses the blocking client: it is called from index builds and from
/// retrieval, both of which run off the async workers.
pub struct OllamaEmbedding {
    client: reqwest::blocking::Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

impl OllamaEmbedding {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.embed_model.clone(),
            dimensions: config.embed_dimensions,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl EmbeddingFunction for OllamaEmbedding {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbedRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(format!("{}/api/embeddings", self.base_url))
            .json(&request)
            .send()
            .map_err(|e| Error::vectorization(format!("Embedding request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::vectorization(format!(
                "Embedding failed: HTTP {}",
                response.status()
            )));
        }

        let embedded: EmbedResponse = response
            .json()
            .map_err(|e| Error::vectorization(format!("Failed to parse embedding response: {}", e)))?;

        Ok(embedded.embedding)
    }

    // Ollama has no batch endpoint; the default sequential `embed_batch` applies

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body() {
        let request = GenerateRequest {
            model: "llama3.2:3b",
            prompt: "QUESTION: sepsis?",
            stream: false,
            options: GenerateOptions { temperature: 0.3 },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "llama3.2:3b");
        assert_eq!(json["stream"], false);
        assert!(json["options"]["temperature"].as_f64().is_some());
    }

    #[test]
    fn test_url_trims_trailing_slash() {
        let config = LlmConfig {
            base_url: "http://ollama:11434/".to_string(),
            ..LlmConfig::default()
        };
        let generator = OllamaGenerator::new(&config).unwrap();
        assert_eq!(generator.url("/api/tags"), "http://ollama:11434/api/tags");
        assert_eq!(generator.name(), "ollama");
        assert_eq!(generator.model(), "llama3.2:3b");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_generator_error() {
        let config = LlmConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            ..LlmConfig::default()
        };
        let generator = OllamaGenerator::new(&config).unwrap();
        let prompt = crate::generation::PromptBuilder::assemble(
            "sepsis?",
            &crate::retrieval::RetrievalResult::empty(),
            10,
        );

        let err = generator.generate(&prompt).await.unwrap_err();
        assert!(matches!(err, Error::GeneratorUnavailable(_)));
        assert!(!generator.health_check().await.unwrap());
    }

    #[test]
    fn test_embed_request_and_response() {
        let json = serde_json::to_value(EmbedRequest {
            model: "nomic-embed-text",
            prompt: "sepsis bundle",
        })
        .unwrap();
        assert_eq!(json["model"], "nomic-embed-text");
        assert_eq!(json["prompt"], "sepsis bundle");

        let response: EmbedResponse =
            serde_json::from_str(r#"{"embedding":[0.5,-0.25,1.0]}"#).unwrap();
        assert_eq!(response.embedding, vec![0.5, -0.25, 1.0]);
    }

    #[test]
    fn test_embedding_from_config() {
        let embedding = OllamaEmbedding::new(&LlmConfig::default()).unwrap();
        assert_eq!(embedding.model(), "nomic-embed-text");
        assert_eq!(embedding.dimensions(), 768);
        assert_eq!(embedding.name(), "ollama");
    }

    #[test]
    fn test_unreachable_server_is_vectorization_error() {
        let config = LlmConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            ..LlmConfig::default()
        };
        let embedding = OllamaEmbedding::new(&config).unwrap();
        let err = embedding.embed("sepsis").unwrap_err();
        assert!(matches!(err, Error::Vectorization(_)));
    }
}

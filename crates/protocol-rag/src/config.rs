//! Configuration for the grounding pipeline

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

/// Main pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagConfig {
    /// Index and retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// Faithfulness and refusal configuration
    #[serde(default)]
    pub grounding: GroundingConfig,
    /// Generator (LLM) configuration
    #[serde(default)]
    pub llm: LlmConfig,
}

impl RagConfig {
    /// Load configuration from a TOML file
    ///
    /// Missing sections and fields fall back to their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: RagConfig = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.retrieval.top_k == 0 {
            return Err(Error::config("retrieval.top_k must be at least 1"));
        }
        if self.retrieval.max_tokens == 0 {
            return Err(Error::config("retrieval.max_tokens must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.retrieval.min_similarity_floor) {
            return Err(Error::config(
                "retrieval.min_similarity_floor must be within [0, 1]",
            ));
        }
        if !(0.0..=1.0).contains(&self.grounding.faithfulness_threshold) {
            return Err(Error::config(
                "grounding.faithfulness_threshold must be within [0, 1]",
            ));
        }
        if self.retrieval.metric == SimilarityMetric::EmbeddingCosine
            && self.llm.embed_dimensions == 0
        {
            return Err(Error::config("llm.embed_dimensions must be at least 1"));
        }
        if self.llm.timeout_secs == 0 {
            return Err(Error::config("llm.timeout_secs must be at least 1"));
        }
        Ok(())
    }
}

/// Similarity backend used to vectorize passages and queries
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SimilarityMetric {
    /// Sparse TF-IDF vectors, cosine similarity
    #[default]
    TermFrequencyCosine,
    /// Dense vectors from an external embedding function, cosine similarity
    EmbeddingCosine,
}

impl SimilarityMetric {
    /// Short name for logs and status output
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TermFrequencyCosine => "term-frequency-cosine",
            Self::EmbeddingCosine => "embedding-cosine",
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Similarity backend for index builds
    pub metric: SimilarityMetric,
    /// Maximum passages returned by the retriever
    pub top_k: usize,
    /// Token budget for passages placed in the prompt
    pub max_tokens: usize,
    /// Passages scoring below this are never returned
    pub min_similarity_floor: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            metric: SimilarityMetric::TermFrequencyCosine,
            top_k: 4,
            max_tokens: 2048,
            min_similarity_floor: 0.1,
        }
    }
}

/// Grounding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundingConfig {
    /// Minimum faithfulness score for an answer to be returned
    pub faithfulness_threshold: f32,
    /// Language of the built-in refusal message
    pub language: Language,
    /// Overrides the built-in refusal message
    pub refusal_message: Option<String>,
}

impl GroundingConfig {
    /// Refusal text returned in place of an ungrounded answer
    pub fn refusal_text(&self) -> &str {
        self.refusal_message
            .as_deref()
            .unwrap_or_else(|| self.language.refusal_message())
    }
}

impl Default for GroundingConfig {
    fn default() -> Self {
        Self {
            faithfulness_threshold: 0.3,
            language: Language::English,
            refusal_message: None,
        }
    }
}

/// Languages with a built-in refusal message
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Arabic,
}

impl Language {
    /// Fixed "not available in protocols" message
    pub fn refusal_message(&self) -> &'static str {
        match self {
            Self::English => "This information is not available in the approved protocols.",
            Self::Arabic => "عذرًا، هذه المعلومات غير متوفرة في البروتوكولات المعتمدة.",
        }
    }
}

/// Generator backend selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorBackend {
    /// Local Ollama server
    #[default]
    Ollama,
    /// Google Generative Language API
    Gemini,
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Which generator adapter to construct
    pub backend: GeneratorBackend,
    /// Ollama base URL
    pub base_url: String,
    /// Generation model name
    pub model: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Upper bound on a single generator call, in seconds
    pub timeout_secs: u64,
    /// Gemini API key (falls back to GEMINI_API_KEY)
    pub api_key: Option<String>,
    /// Gemini model name
    pub gemini_model: String,
    /// Generative Language API base URL
    pub gemini_base_url: String,
    /// Ollama embedding model for the embedding-cosine metric
    pub embed_model: String,
    /// Gemini embedding model for the embedding-cosine metric
    pub gemini_embed_model: String,
    /// Length of every embedding the configured model returns
    pub embed_dimensions: usize,
}

impl LlmConfig {
    /// Generator call timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Resolve the Gemini API key from config or environment
    pub fn resolve_api_key(&self) -> Result<String> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.is_empty()) {
            return Ok(key.clone());
        }
        std::env::var("GEMINI_API_KEY")
            .map_err(|_| Error::config("GEMINI_API_KEY environment variable not set"))
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: GeneratorBackend::Ollama,
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2:3b".to_string(),
            temperature: 0.3, // Lower for more factual answers
            timeout_secs: 60,
            api_key: None,
            gemini_model: "gemini-flash-lite-latest".to_string(),
            gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            embed_model: "nomic-embed-text".to_string(),
            gemini_embed_model: "text-embedding-004".to_string(),
            embed_dimensions: 768,
        }
    }
}

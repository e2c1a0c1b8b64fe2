//! Query request types

use serde::{Deserialize, Serialize};

use crate::config::RagConfig;
use crate::error::{Error, Result};

/// Question plus optional per-call overrides of the configured defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The clinical question to answer
    pub question: String,

    /// Number of passages to retrieve
    #[serde(default)]
    pub top_k: Option<usize>,

    /// Token budget for prompt passages
    #[serde(default)]
    pub max_tokens: Option<usize>,

    /// Minimum retrieval similarity
    #[serde(default)]
    pub min_similarity_floor: Option<f32>,

    /// Minimum faithfulness score to accept an answer
    #[serde(default)]
    pub faithfulness_threshold: Option<f32>,
}

impl QueryRequest {
    /// Create a new query
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Default::default()
        }
    }

    /// Set the number of results to retrieve
    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = Some(k);
        self
    }

    /// Set the prompt token budget
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the similarity floor
    pub fn with_floor(mut self, floor: f32) -> Self {
        self.min_similarity_floor = Some(floor);
        self
    }

    /// Set the faithfulness threshold
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.faithfulness_threshold = Some(threshold);
        self
    }

    /// Merge overrides with configured defaults and validate the result
    pub fn resolve(&self, config: &RagConfig) -> Result<QueryParams> {
        let params = QueryParams {
            top_k: self.top_k.unwrap_or(config.retrieval.top_k),
            max_tokens: self.max_tokens.unwrap_or(config.retrieval.max_tokens),
            min_similarity_floor: self
                .min_similarity_floor
                .unwrap_or(config.retrieval.min_similarity_floor),
            faithfulness_threshold: self
                .faithfulness_threshold
                .unwrap_or(config.grounding.faithfulness_threshold),
        };

        if params.top_k == 0 {
            return Err(Error::config("top_k must be at least 1"));
        }
        if params.max_tokens == 0 {
            return Err(Error::config("max_tokens must be at least 1"));
        }
        if !(0.0..=1.0).contains(&params.faithfulness_threshold) {
            return Err(Error::config("faithfulness_threshold must be within [0, 1]"));
        }

        Ok(params)
    }
}

/// Effective parameters for one query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryParams {
    pub top_k: usize,
    pub max_tokens: usize,
    pub min_similarity_floor: f32,
    pub faithfulness_threshold: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_defaults_and_overrides() {
        let config = RagConfig::default();

        let params = QueryRequest::new("sepsis bundle").resolve(&config).unwrap();
        assert_eq!(params.top_k, config.retrieval.top_k);
        assert_eq!(params.max_tokens, config.retrieval.max_tokens);

        let params = QueryRequest::new("sepsis bundle")
            .with_top_k(2)
            .with_threshold(0.5)
            .resolve(&config)
            .unwrap();
        assert_eq!(params.top_k, 2);
        assert_eq!(params.faithfulness_threshold, 0.5);
    }

    #[test]
    fn test_resolve_rejects_zero_k() {
        let config = RagConfig::default();
        let err = QueryRequest::new("x").with_top_k(0).resolve(&config);
        assert!(matches!(err, Err(Error::Config(_))));
    }
}

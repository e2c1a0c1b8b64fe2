//! Grounded question answering: retrieve, assemble, generate, verify, cite

use std::sync::Arc;
use std::time::Instant;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::generation::{attribute, declines, source_snippets, PromptBuilder};
use crate::grounding::{self, Decision, GroundingSignals, RefusalPolicy};
use crate::index::IndexStore;
use crate::providers::Generator;
use crate::retrieval::Retriever;
use crate::types::{Answer, AnswerStatus, QueryRequest};

/// Answers questions strictly from the active corpus index
///
/// Each call is independent. The index snapshot is taken once per query, so
/// a rebuild running concurrently is either fully visible or not at all.
/// Retrieval runs on the blocking pool because embedding backends are
/// synchronous.
pub struct GroundedAnswerer {
    config: RagConfig,
    retriever: Retriever,
    generator: Arc<dyn Generator>,
}

impl GroundedAnswerer {
    pub fn new(
        config: RagConfig,
        store: Arc<IndexStore>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            config,
            retriever: Retriever::new(store),
            generator,
        }
    }

    pub fn store(&self) -> &Arc<IndexStore> {
        self.retriever.store()
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Answer with configured defaults
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        self.answer(&QueryRequest::new(question)).await
    }

    /// Answer a query, refusing when the evidence does not support an answer
    ///
    /// Errors are reserved for an unbuilt index, vectorization failure and an
    /// unavailable or timed-out generator. Everything else yields an
    /// `Answer`, possibly `Refused`.
    pub async fn answer(&self, request: &QueryRequest) -> Result<Answer> {
        let result = self.run(request).await;
        if let Err(e) = &result {
            if e.is_query_scoped() {
                tracing::warn!("Query failed, index unaffected: {}", e);
            } else {
                tracing::error!("Query rejected: {}", e);
            }
        }
        result
    }

    async fn run(&self, request: &QueryRequest) -> Result<Answer> {
        let start = Instant::now();
        let params = request.resolve(&self.config)?;

        tracing::info!("Query: \"{}\"", request.question);

        let retrieval = self
            .retriever
            .retrieve_blocking(&request.question, params.top_k, params.min_similarity_floor)
            .await?;
        let retrieved = retrieval.len();

        let Some(top_score) = retrieval.top_score() else {
            tracing::info!("No passages above similarity floor, refusing");
            return Ok(self.refusal(0.0, retrieved, 0, start));
        };
        tracing::debug!("Retrieved {} passages, top score {:.3}", retrieved, top_score);

        let prompt = PromptBuilder::assemble(&request.question, &retrieval, params.max_tokens);
        if !prompt.has_context() {
            tracing::info!(
                "No retrieved passage fits within {} tokens, refusing",
                params.max_tokens
            );
            return Ok(self.refusal(0.0, retrieved, 0, start));
        }
        let used = prompt.passages().len();

        let raw = match tokio::time::timeout(
            self.config.llm.timeout(),
            self.generator.generate(&prompt),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(Error::generator(format!(
                    "{} did not answer within {}s",
                    self.generator.name(),
                    self.config.llm.timeout_secs
                )))
            }
        };

        let text = raw.trim();
        let signals = GroundingSignals {
            evidence_supplied: true,
            generator_declined: declines(text),
            score: grounding::score(text, prompt.passages()),
        };

        let policy = RefusalPolicy::new(params.faithfulness_threshold);
        match policy.decide(&signals) {
            Decision::Refuse(reason) => {
                tracing::info!(
                    "Refusing answer: {} (faithfulness {:.3}, threshold {:.3})",
                    reason,
                    signals.score,
                    policy.threshold()
                );
                Ok(self.refusal(signals.score, retrieved, used, start))
            }
            Decision::Accept => {
                let citations = attribute(text, prompt.passages());
                if citations.is_empty() {
                    tracing::warn!("Answer accepted without any attributable citation");
                }
                let sources = source_snippets(&citations, prompt.passages());
                let processing_time_ms = start.elapsed().as_millis() as u64;

                tracing::info!(
                    "Query completed in {}ms, {} citations, faithfulness {:.3}",
                    processing_time_ms,
                    citations.len(),
                    signals.score
                );

                Ok(Answer {
                    text: text.to_string(),
                    confidence: signals.score.clamp(0.0, 1.0),
                    status: AnswerStatus::Answered,
                    citations,
                    sources,
                    passages_retrieved: retrieved,
                    passages_used: used,
                    processing_time_ms,
                    answered_at: chrono::Utc::now(),
                })
            }
        }
    }

    fn refusal(&self, score: f32, retrieved: usize, used: usize, start: Instant) -> Answer {
        let mut answer = Answer::refused(self.config.grounding.refusal_text(), score);
        answer.passages_retrieved = retrieved;
        answer.passages_used = used;
        answer.processing_time_ms = start.elapsed().as_millis() as u64;
        answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Language;
    use crate::generation::Prompt;
    use crate::index::VectorizerSource;
    use crate::types::Passage;
    use async_trait::async_trait;

    struct Canned(&'static str);

    #[async_trait]
    impl Generator for Canned {
        async fn generate(&self, _prompt: &Prompt) -> Result<String> {
            Ok(self.0.to_string())
        }

        fn name(&self) -> &str {
            "canned"
        }

        fn model(&self) -> &str {
            "none"
        }
    }

    fn answerer(config: RagConfig, reply: &'static str) -> GroundedAnswerer {
        let store = Arc::new(IndexStore::new(VectorizerSource::TermFrequency));
        store
            .rebuild(vec![Passage::new(
                1,
                "sepsis.pdf",
                "Sepsis Hour-1 Bundle: administer broad-spectrum antibiotics within 1 hour",
            )
            .with_page(3)])
            .unwrap();
        GroundedAnswerer::new(config, store, Arc::new(Canned(reply)))
    }

    #[tokio::test]
    async fn test_declined_answer_uses_localized_refusal() {
        let mut config = RagConfig::default();
        config.grounding.language = Language::Arabic;
        let answerer = answerer(
            config,
            "This information is not available in the provided protocols.",
        );

        let answer = answerer.ask("sepsis antibiotics").await.unwrap();
        assert_eq!(answer.status, AnswerStatus::Refused);
        assert_eq!(answer.text, Language::Arabic.refusal_message());
        assert!(answer.citations.is_empty());
        assert_eq!(answer.passages_used, 1);
    }

    #[tokio::test]
    async fn test_refusal_message_override() {
        let mut config = RagConfig::default();
        config.grounding.refusal_message = Some("Consult the on-call physician.".to_string());
        let answerer = answerer(config, "Give labetalol for hypertensive crisis.");

        let answer = answerer.ask("sepsis antibiotics").await.unwrap();
        assert_eq!(answer.status, AnswerStatus::Refused);
        assert_eq!(answer.text, "Consult the on-call physician.");
    }

    #[tokio::test]
    async fn test_invalid_override_is_config_error() {
        let answerer = answerer(RagConfig::default(), "unused");
        let request = QueryRequest::new("sepsis").with_top_k(0);
        assert!(matches!(answerer.answer(&request).await, Err(Error::Config(_))));
    }
}

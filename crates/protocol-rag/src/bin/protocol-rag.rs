//! protocol-rag CLI
//!
//! Loads a passage corpus, builds the index and answers questions from it.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use protocol_rag::config::SimilarityMetric;
use protocol_rag::index::IndexStore;
use protocol_rag::retrieval::Retriever;
use protocol_rag::types::load_passages;
use protocol_rag::{
    build_embedding, build_generator, GroundedAnswerer, QueryRequest, RagConfig,
    VectorizerSource,
};

/// Grounded answers from approved clinical protocols
#[derive(Parser, Debug)]
#[command(name = "protocol-rag", version, about, long_about = None)]
struct Cli {
    /// JSON array of passages to index
    #[arg(long)]
    corpus: PathBuf,

    /// Configuration file path (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Answer a question from the corpus
    Ask {
        question: String,

        /// Number of passages to retrieve
        #[arg(long)]
        top_k: Option<usize>,

        /// Print the full answer as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show ranked passages for a query without generating
    Search {
        query: String,

        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Show index statistics and generator health
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "protocol_rag=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => RagConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => RagConfig::default(),
    };

    tracing::info!("Configuration loaded");
    tracing::info!("  - Similarity metric: {}", config.retrieval.metric.as_str());
    tracing::info!("  - Top-k: {}", config.retrieval.top_k);
    tracing::info!("  - Faithfulness threshold: {}", config.grounding.faithfulness_threshold);

    // Embedding clients block on HTTP, so the index is built off the async workers
    let metric = config.retrieval.metric;
    let llm = config.llm.clone();
    let corpus = cli.corpus.clone();
    let store = tokio::task::spawn_blocking(move || -> anyhow::Result<Arc<IndexStore>> {
        let embedding = match metric {
            SimilarityMetric::EmbeddingCosine => {
                Some(build_embedding(&llm).context("creating embedding function")?)
            }
            SimilarityMetric::TermFrequencyCosine => None,
        };
        let source = VectorizerSource::for_metric(metric, embedding)
            .context("selecting vectorizer")?;
        let store = Arc::new(IndexStore::new(source));

        let passages = load_passages(&corpus)
            .with_context(|| format!("reading corpus {}", corpus.display()))?;
        store.rebuild(passages).context("building index")?;
        Ok(store)
    })
    .await??;

    match cli.command {
        Commands::Ask {
            question,
            top_k,
            json,
        } => {
            let generator = build_generator(&config.llm).context("creating generator")?;
            let answerer = GroundedAnswerer::new(config, Arc::clone(&store), generator);

            let mut request = QueryRequest::new(question);
            if let Some(k) = top_k {
                request = request.with_top_k(k);
            }
            let answer = answerer.answer(&request).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&answer)?);
            } else {
                println!("{}", answer.text);
                if !answer.citations.is_empty() {
                    println!("\nSources:");
                    for citation in &answer.citations {
                        println!("  - {}", citation.format_inline());
                    }
                }
                println!(
                    "\n[{:?}] confidence {:.0}%, {} ms",
                    answer.status,
                    answer.confidence * 100.0,
                    answer.processing_time_ms
                );
            }
        }
        Commands::Search { query, top_k } => {
            let k = top_k.unwrap_or(config.retrieval.top_k);
            let result = Retriever::new(Arc::clone(&store))
                .retrieve_blocking(&query, k, config.retrieval.min_similarity_floor)
                .await?;

            if result.is_empty() {
                println!("No passages above similarity floor {}", config.retrieval.min_similarity_floor);
            }
            for entry in result.iter() {
                println!(
                    "{:.3}  {}  {}",
                    entry.score,
                    entry.passage.marker(),
                    entry.passage.text.chars().take(80).collect::<String>()
                );
            }
        }
        Commands::Status => {
            if let Some(stats) = store.stats() {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            }
            let generator = build_generator(&config.llm).context("creating generator")?;
            let healthy = generator.health_check().await.unwrap_or(false);
            println!(
                "Generator {} ({}): {}",
                generator.name(),
                generator.model(),
                if healthy { "available" } else { "unavailable" }
            );
        }
    }

    Ok(())
}

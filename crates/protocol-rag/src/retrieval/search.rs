//! Cosine ranking of corpus passages against a query

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::index::{CorpusIndex, IndexStore};
use crate::types::Passage;

/// Retrieved passage with similarity
#[derive(Debug, Clone)]
pub struct ScoredPassage {
    /// The retrieved passage
    pub passage: Passage,
    /// Cosine similarity to the query (higher is better)
    pub score: f32,
}

/// Ranked passages: non-increasing score, unique ids, at most top-k
#[derive(Debug, Clone, Default)]
pub struct RetrievalResult {
    entries: Vec<ScoredPassage>,
}

impl RetrievalResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[ScoredPassage] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<f32> {
        self.entries.first().map(|e| e.score)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScoredPassage> {
        self.entries.iter()
    }
}

/// Retriever over the store's active index
///
/// Cheap to clone; every call takes its own snapshot of the active index.
#[derive(Clone)]
pub struct Retriever {
    store: Arc<IndexStore>,
}

impl Retriever {
    pub fn new(store: Arc<IndexStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<IndexStore> {
        &self.store
    }

    /// Retrieve at most `k` passages scoring at least `min_similarity_floor`
    pub fn retrieve(
        &self,
        query: &str,
        k: usize,
        min_similarity_floor: f32,
    ) -> Result<RetrievalResult> {
        let index = self.store.current()?;
        search(&index, query, k, min_similarity_floor)
    }

    /// Run `retrieve` on the blocking pool
    ///
    /// Embedding backends call out to a remote service synchronously, so
    /// query encoding never runs on an async worker thread.
    pub async fn retrieve_blocking(
        &self,
        query: &str,
        k: usize,
        min_similarity_floor: f32,
    ) -> Result<RetrievalResult> {
        let retriever = self.clone();
        let query = query.to_string();
        tokio::task::spawn_blocking(move || retriever.retrieve(&query, k, min_similarity_floor))
            .await
            .map_err(|e| Error::vectorization(format!("Retrieval task failed: {}", e)))?
    }
}

/// Rank every passage of `index` against `query`
///
/// Passages scoring below `min_similarity_floor`, or with no similarity at
/// all, are excluded even when fewer than `k` remain. Ties keep insertion
/// order. An empty index yields an empty result.
pub fn search(
    index: &CorpusIndex,
    query: &str,
    k: usize,
    min_similarity_floor: f32,
) -> Result<RetrievalResult> {
    if k == 0 {
        return Err(Error::config("top_k must be at least 1"));
    }

    if index.is_empty() {
        tracing::debug!("Retrieval over empty corpus");
        return Ok(RetrievalResult::empty());
    }

    let query_vector = index.query_vector(query)?;

    let mut scored: Vec<(usize, f32)> = index
        .vectors()
        .iter()
        .enumerate()
        .map(|(i, vector)| (i, query_vector.cosine(vector)))
        .filter(|(_, score)| score.is_finite() && *score > 0.0 && *score >= min_similarity_floor)
        .collect();

    // Stable sort: equal scores stay in insertion order
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(k);

    let passages = index.passages();
    let mut seen = HashSet::with_capacity(scored.len());
    let entries: Vec<ScoredPassage> = scored
        .into_iter()
        .filter(|(i, _)| seen.insert(passages[*i].id))
        .map(|(i, score)| ScoredPassage {
            passage: passages[i].clone(),
            score,
        })
        .collect();

    tracing::debug!(
        "Retrieved {} of {} passages (top score {:.3})",
        entries.len(),
        index.len(),
        entries.first().map(|e| e.score).unwrap_or(0.0)
    );

    Ok(RetrievalResult { entries })
}

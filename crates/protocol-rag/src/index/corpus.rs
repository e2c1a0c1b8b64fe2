//! Immutable corpus index: passages, their vectors and the vectorizer that made them

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

use crate::config::SimilarityMetric;
use crate::error::{Error, Result};
use crate::types::Passage;

use super::vectorizer::{Vector, Vectorizer, VectorizerSource};

/// Built index over a fixed set of passages
///
/// Never mutated after `build`; a rebuild produces a new instance.
#[derive(Debug)]
pub struct CorpusIndex {
    passages: Vec<Passage>,
    vectors: Vec<Vector>,
    vectorizer: Vectorizer,
    built_at: DateTime<Utc>,
}

/// Summary of an index for status output
#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub passages: usize,
    pub documents: usize,
    pub metric: SimilarityMetric,
    pub dimensions: usize,
    pub built_at: DateTime<Utc>,
}

impl CorpusIndex {
    /// Validate, vectorize and index the passages in the given order
    ///
    /// Any invalid passage or vectorization failure fails the whole build.
    pub fn build(passages: Vec<Passage>, source: &VectorizerSource) -> Result<Self> {
        validate(&passages)?;

        let vectorizer = source.fit(&passages)?;
        let texts: Vec<&str> = passages.iter().map(|p| p.text.as_str()).collect();
        let vectors = vectorizer.encode_all(&texts)?;

        tracing::info!(
            "Built {} index: {} passages, {} dimensions",
            vectorizer.metric().as_str(),
            passages.len(),
            vectorizer.dimensions()
        );

        Ok(Self {
            passages,
            vectors,
            vectorizer,
            built_at: Utc::now(),
        })
    }

    /// Encode a query in this index's vector space
    pub fn query_vector(&self, text: &str) -> Result<Vector> {
        self.vectorizer.encode(text)
    }

    /// Passages in insertion order
    pub fn passages(&self) -> &[Passage] {
        &self.passages
    }

    /// Passage vectors, aligned with `passages()`
    pub fn vectors(&self) -> &[Vector] {
        &self.vectors
    }

    pub fn vectorizer(&self) -> &Vectorizer {
        &self.vectorizer
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    pub fn stats(&self) -> IndexStats {
        let documents: HashSet<&str> = self
            .passages
            .iter()
            .map(|p| p.document_id.as_str())
            .collect();

        IndexStats {
            passages: self.passages.len(),
            documents: documents.len(),
            metric: self.vectorizer.metric(),
            dimensions: self.vectorizer.dimensions(),
            built_at: self.built_at,
        }
    }
}

fn validate(passages: &[Passage]) -> Result<()> {
    let mut ids = HashSet::with_capacity(passages.len());

    for passage in passages {
        if !ids.insert(passage.id) {
            return Err(Error::invalid_passage(passage.id, "duplicate passage id"));
        }
        if passage.text.trim().is_empty() {
            return Err(Error::invalid_passage(passage.id, "text is empty"));
        }
        if passage.page_number == Some(0) {
            return Err(Error::invalid_passage(
                passage.id,
                "page numbers are 1-based",
            ));
        }
    }

    Ok(())
}

//! Vectorizers: one interface, two similarity backends
//!
//! A `Vectorizer` is fitted once per index build and then owned by that
//! index, so passages and queries are always encoded in the same space.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::config::SimilarityMetric;
use crate::error::{Error, Result};
use crate::providers::EmbeddingFunction;
use crate::types::Passage;

use super::tokenize::tokenize;

/// Sparse vector with entries sorted by dimension
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(u32, f32)>,
}

impl SparseVector {
    /// Build from unsorted (dimension, weight) pairs; zero weights are dropped
    pub fn from_pairs(mut entries: Vec<(u32, f32)>) -> Self {
        entries.retain(|(_, w)| *w != 0.0);
        entries.sort_by_key(|(dim, _)| *dim);
        Self { entries }
    }

    pub fn entries(&self) -> &[(u32, f32)] {
        &self.entries
    }

    fn dot(&self, other: &SparseVector) -> f32 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.entries.len() && j < other.entries.len() {
            let (a_dim, a_w) = self.entries[i];
            let (b_dim, b_w) = other.entries[j];
            match a_dim.cmp(&b_dim) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += a_w * b_w;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    fn norm(&self) -> f32 {
        self.entries.iter().map(|(_, w)| w * w).sum::<f32>().sqrt()
    }
}

/// Passage or query representation
#[derive(Debug, Clone, PartialEq)]
pub enum Vector {
    Sparse(SparseVector),
    Dense(Vec<f32>),
}

impl Vector {
    /// Cosine similarity; zero-length vectors score 0
    ///
    /// Vectors from different spaces also score 0. The index never produces
    /// such a pair because it owns the only vectorizer for its vectors.
    pub fn cosine(&self, other: &Vector) -> f32 {
        let (dot, norm_a, norm_b) = match (self, other) {
            (Vector::Sparse(a), Vector::Sparse(b)) => (a.dot(b), a.norm(), b.norm()),
            (Vector::Dense(a), Vector::Dense(b)) if a.len() == b.len() => {
                let dot = a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>();
                let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
                let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
                (dot, norm_a, norm_b)
            }
            _ => return 0.0,
        };

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
    }

    /// True when the vector has no non-zero component
    pub fn is_zero(&self) -> bool {
        match self {
            Vector::Sparse(v) => v.entries.is_empty(),
            Vector::Dense(v) => v.iter().all(|x| *x == 0.0),
        }
    }
}

/// TF-IDF vectorizer fitted on a corpus
#[derive(Debug, Clone)]
pub struct TermFrequencyVectorizer {
    vocabulary: HashMap<String, u32>,
    idf: Vec<f32>,
}

impl TermFrequencyVectorizer {
    /// Fit vocabulary and smoothed inverse document frequencies
    ///
    /// `idf(t) = ln((1 + N) / (1 + df(t))) + 1`, so a term present in every
    /// passage still keeps weight 1 and rare terms (drug names, scores)
    /// weigh more.
    pub fn fit<'a>(texts: impl IntoIterator<Item = &'a str>) -> Self {
        let mut vocabulary: HashMap<String, u32> = HashMap::new();
        let mut doc_freq: Vec<u32> = Vec::new();
        let mut num_docs = 0u32;

        for text in texts {
            num_docs += 1;
            let mut seen = std::collections::HashSet::new();
            for token in tokenize(text) {
                let next_id = vocabulary.len() as u32;
                let id = *vocabulary.entry(token).or_insert(next_id);
                if id as usize == doc_freq.len() {
                    doc_freq.push(0);
                }
                if seen.insert(id) {
                    doc_freq[id as usize] += 1;
                }
            }
        }

        let n = num_docs as f32;
        let idf = doc_freq
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f32)).ln() + 1.0)
            .collect();

        Self { vocabulary, idf }
    }

    /// Encode text as an L2-normalized TF-IDF vector; unknown terms are ignored
    pub fn encode(&self, text: &str) -> Vector {
        // Ordered by dimension so the norm is summed in the same order every call
        let mut counts: BTreeMap<u32, f32> = BTreeMap::new();
        for token in tokenize(text) {
            if let Some(&id) = self.vocabulary.get(&token) {
                *counts.entry(id).or_insert(0.0) += 1.0;
            }
        }

        let mut pairs: Vec<(u32, f32)> = counts
            .into_iter()
            .map(|(id, tf)| (id, tf * self.idf[id as usize]))
            .collect();

        let norm = pairs.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut pairs {
                *w /= norm;
            }
        }

        Vector::Sparse(SparseVector::from_pairs(pairs))
    }

    /// Vocabulary size
    pub fn dimensions(&self) -> usize {
        self.vocabulary.len()
    }

    /// Inverse document frequency of a term, if it is in the vocabulary
    pub fn idf(&self, term: &str) -> Option<f32> {
        self.vocabulary
            .get(term)
            .map(|&id| self.idf[id as usize])
    }
}

/// Dense vectorizer delegating to an external embedding function
#[derive(Clone)]
pub struct EmbeddingVectorizer {
    function: Arc<dyn EmbeddingFunction>,
    dimensions: usize,
}

impl EmbeddingVectorizer {
    pub fn new(function: Arc<dyn EmbeddingFunction>) -> Result<Self> {
        let dimensions = function.dimensions();
        if dimensions == 0 {
            return Err(Error::config(format!(
                "embedding function '{}' reports zero dimensions",
                function.name()
            )));
        }
        Ok(Self {
            function,
            dimensions,
        })
    }

    /// Encode text, rejecting vectors of the wrong length or with non-finite values
    pub fn encode(&self, text: &str) -> Result<Vector> {
        let embedding = self.function.embed(text)?;
        self.check(embedding)
    }

    fn check(&self, embedding: Vec<f32>) -> Result<Vector> {
        if embedding.len() != self.dimensions {
            return Err(Error::vectorization(format!(
                "embedding '{}' returned {} dimensions, expected {}",
                self.function.name(),
                embedding.len(),
                self.dimensions
            )));
        }
        if embedding.iter().any(|x| !x.is_finite()) {
            return Err(Error::vectorization(format!(
                "embedding '{}' returned non-finite values",
                self.function.name()
            )));
        }
        Ok(Vector::Dense(embedding))
    }

    fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vector>> {
        let embeddings = self.function.embed_batch(texts)?;
        if embeddings.len() != texts.len() {
            return Err(Error::vectorization(format!(
                "embedding '{}' returned {} vectors for {} texts",
                self.function.name(),
                embeddings.len(),
                texts.len()
            )));
        }
        embeddings.into_iter().map(|e| self.check(e)).collect()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

impl fmt::Debug for EmbeddingVectorizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddingVectorizer")
            .field("function", &self.function.name())
            .field("dimensions", &self.dimensions)
            .finish()
    }
}

/// Fitted vectorizer owned by one index
#[derive(Debug, Clone)]
pub enum Vectorizer {
    TermFrequency(TermFrequencyVectorizer),
    Embedding(EmbeddingVectorizer),
}

impl Vectorizer {
    /// Encode a passage or query
    pub fn encode(&self, text: &str) -> Result<Vector> {
        match self {
            Self::TermFrequency(v) => Ok(v.encode(text)),
            Self::Embedding(v) => v.encode(text),
        }
    }

    /// Encode many texts; fails as a whole if any text fails
    pub fn encode_all(&self, texts: &[&str]) -> Result<Vec<Vector>> {
        match self {
            Self::TermFrequency(v) => Ok(texts.iter().map(|t| v.encode(t)).collect()),
            Self::Embedding(v) => v.encode_batch(texts),
        }
    }

    /// Fixed dimensionality of every vector this instance produces
    pub fn dimensions(&self) -> usize {
        match self {
            Self::TermFrequency(v) => v.dimensions(),
            Self::Embedding(v) => v.dimensions(),
        }
    }

    pub fn metric(&self) -> SimilarityMetric {
        match self {
            Self::TermFrequency(_) => SimilarityMetric::TermFrequencyCosine,
            Self::Embedding(_) => SimilarityMetric::EmbeddingCosine,
        }
    }
}

/// Recipe for producing a fresh `Vectorizer` on every rebuild
#[derive(Clone)]
pub enum VectorizerSource {
    TermFrequency,
    Embedding(Arc<dyn EmbeddingFunction>),
}

impl VectorizerSource {
    /// Select a source for the configured metric
    pub fn for_metric(
        metric: SimilarityMetric,
        embedding: Option<Arc<dyn EmbeddingFunction>>,
    ) -> Result<Self> {
        match (metric, embedding) {
            (SimilarityMetric::TermFrequencyCosine, _) => Ok(Self::TermFrequency),
            (SimilarityMetric::EmbeddingCosine, Some(function)) => Ok(Self::Embedding(function)),
            (SimilarityMetric::EmbeddingCosine, None) => Err(Error::config(
                "embedding-cosine metric requires an embedding function",
            )),
        }
    }

    /// Fit a vectorizer for the given corpus
    pub fn fit(&self, passages: &[Passage]) -> Result<Vectorizer> {
        match self {
            Self::TermFrequency => Ok(Vectorizer::TermFrequency(TermFrequencyVectorizer::fit(
                passages.iter().map(|p| p.text.as_str()),
            ))),
            Self::Embedding(function) => Ok(Vectorizer::Embedding(EmbeddingVectorizer::new(
                Arc::clone(function),
            )?)),
        }
    }

    pub fn metric(&self) -> SimilarityMetric {
        match self {
            Self::TermFrequency => SimilarityMetric::TermFrequencyCosine,
            Self::Embedding(_) => SimilarityMetric::EmbeddingCosine,
        }
    }
}

impl fmt::Debug for VectorizerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TermFrequency => write!(f, "TermFrequency"),
            Self::Embedding(function) => write!(f, "Embedding({})", function.name()),
        }
    }
}

//! Holder for the active index with all-or-nothing rebuilds

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::Passage;

use super::corpus::{CorpusIndex, IndexStats};
use super::vectorizer::VectorizerSource;

/// Active corpus index, replaced wholesale on rebuild
///
/// Readers take an `Arc` snapshot with `current()` and keep it for the whole
/// query, so a concurrent rebuild is never observed half-way. Rebuilds are
/// serialized; the new index is built outside the swap lock.
pub struct IndexStore {
    source: VectorizerSource,
    active: RwLock<Option<Arc<CorpusIndex>>>,
    build_lock: Mutex<()>,
}

impl IndexStore {
    /// Create an empty store; queries fail with `IndexNotBuilt` until the first rebuild
    pub fn new(source: VectorizerSource) -> Self {
        Self {
            source,
            active: RwLock::new(None),
            build_lock: Mutex::new(()),
        }
    }

    /// Build a new index and make it active
    ///
    /// On failure the previously active index (if any) keeps serving.
    pub fn rebuild(&self, passages: Vec<Passage>) -> Result<Arc<CorpusIndex>> {
        let _guard = self.build_lock.lock();

        let count = passages.len();
        let index = match CorpusIndex::build(passages, &self.source) {
            Ok(index) => Arc::new(index),
            Err(e) => {
                tracing::warn!(
                    "Index rebuild over {} passages failed, keeping previous index: {}",
                    count,
                    e
                );
                return Err(e);
            }
        };

        let previous = self.active.write().replace(Arc::clone(&index));
        match previous {
            Some(old) => tracing::info!(
                "Swapped corpus index ({} -> {} passages)",
                old.len(),
                index.len()
            ),
            None => tracing::info!("Corpus index ready ({} passages)", index.len()),
        }

        Ok(index)
    }

    /// Snapshot of the active index
    pub fn current(&self) -> Result<Arc<CorpusIndex>> {
        self.active.read().clone().ok_or(Error::IndexNotBuilt)
    }

    pub fn is_built(&self) -> bool {
        self.active.read().is_some()
    }

    /// Stats of the active index, if any
    pub fn stats(&self) -> Option<IndexStats> {
        self.active.read().as_ref().map(|index| index.stats())
    }

    pub fn source(&self) -> &VectorizerSource {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::EmbeddingFunction;

    /// Embeds by keyword presence; fails on any text containing "corrupt"
    struct KeywordEmbedding;

    impl EmbeddingFunction for KeywordEmbedding {
        fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let lower = text.to_lowercase();
            if lower.contains("corrupt") {
                return Err(Error::vectorization("embedding service rejected input"));
            }
            Ok(["sepsis", "stroke", "pressure"]
                .iter()
                .map(|k| if lower.contains(k) { 1.0 } else { 0.0 })
                .collect())
        }

        fn dimensions(&self) -> usize {
            3
        }

        fn name(&self) -> &str {
            "keyword"
        }
    }

    #[test]
    fn test_not_built() {
        let store = IndexStore::new(VectorizerSource::TermFrequency);
        assert!(!store.is_built());
        assert!(matches!(store.current(), Err(Error::IndexNotBuilt)));
        assert!(store.stats().is_none());
    }

    #[test]
    fn test_failed_rebuild_keeps_previous() {
        let store = IndexStore::new(VectorizerSource::Embedding(Arc::new(KeywordEmbedding)));
        store
            .rebuild(vec![Passage::new(1, "sepsis.pdf", "Sepsis bundle").with_page(1)])
            .unwrap();

        let err = store
            .rebuild(vec![
                Passage::new(1, "stroke.pdf", "Stroke imaging"),
                Passage::new(2, "broken.pdf", "corrupt scan output"),
            ])
            .unwrap_err();
        assert!(matches!(err, Error::Vectorization(_)));

        let current = store.current().unwrap();
        assert_eq!(current.len(), 1);
        assert_eq!(current.passages()[0].document_id, "sepsis.pdf");
    }

    #[test]
    fn test_snapshot_survives_swap() {
        let store = IndexStore::new(VectorizerSource::TermFrequency);
        store.rebuild(vec![Passage::new(1, "a.pdf", "old text")]).unwrap();

        let snapshot = store.current().unwrap();
        store
            .rebuild(vec![
                Passage::new(1, "b.pdf", "new text"),
                Passage::new(2, "b.pdf", "more new text"),
            ])
            .unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.passages()[0].document_id, "a.pdf");
        assert_eq!(store.current().unwrap().len(), 2);
    }
}

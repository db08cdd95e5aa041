//! Document ingestion and index maintenance

use std::sync::Arc;

use tracing::info;
use tracing::warn;

use super::SharedIndex;
use super::VectorIndex;
use crate::database::DocumentStore;
use crate::embeddings::backfill_embeddings;
use crate::embeddings::BackfillStats;
use crate::embeddings::Embedder;
use crate::errors::Result;
use crate::models::Document;

/// Build an index from every embedded document in `store`
pub async fn load_index(store: &dyn DocumentStore, dimension: usize) -> Result<VectorIndex> {
    let documents = store.list_embedded().await?;
    Ok(VectorIndex::from_documents(dimension, documents))
}

/// Result of adding one document
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub document: Document,
    /// False when the document was saved but its embedding could not be produced
    pub embedded: bool,
}

/// Writes documents to the store and keeps the shared index in step with it
pub struct Ingestor {
    store: Arc<dyn DocumentStore>,
    embedder: Arc<dyn Embedder>,
    index: SharedIndex,
}

impl Ingestor {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        embedder: Arc<dyn Embedder>,
        index: SharedIndex,
    ) -> Self {
        Self {
            store,
            embedder,
            index,
        }
    }

    /// Store `content`, embed it and publish it to the index.
    ///
    /// An embedding failure does not undo the insert: the document stays in the
    /// store without an embedding and can be picked up by [`Self::backfill_missing`].
    ///
    /// # Errors
    /// - `Validation` for blank content
    /// - Store errors while creating the document
    pub async fn add_document(&self, content: &str) -> Result<IngestOutcome> {
        let mut document = self.store.create(content).await?;
        info!("Created document {}", document.id);

        let embedding = match self.embed_and_store(&document).await {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!(
                    document_id = document.id,
                    error = %e,
                    "Document saved but embedding failed"
                );
                return Ok(IngestOutcome {
                    document,
                    embedded: false,
                });
            }
        };

        document.embedding = Some(embedding);
        let indexed = document.clone();
        self.index.update(move |index| index.insert(indexed))?;

        Ok(IngestOutcome {
            document,
            embedded: true,
        })
    }

    async fn embed_and_store(&self, document: &Document) -> Result<Vec<f32>> {
        let embedding = self.embedder.embed(&document.content).await?;
        self.store.set_embedding(document.id, &embedding).await?;
        Ok(embedding)
    }

    /// Embed every stored document that lacks an embedding, then reload the index
    pub async fn backfill_missing(&self) -> Result<BackfillStats> {
        let stats = backfill_embeddings(self.store.as_ref(), self.embedder.as_ref()).await?;
        if stats.updated > 0 {
            self.reload_index().await?;
        }
        Ok(stats)
    }

    /// Rebuild the index from the store and swap it in; returns the entry count
    pub async fn reload_index(&self) -> Result<usize> {
        let dimension = self.index.snapshot().dimension();
        let index = load_index(self.store.as_ref(), dimension).await?;
        let len = index.len();
        self.index.replace(index);
        info!("Reloaded vector index with {} documents", len);
        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use async_trait::async_trait;

    use super::*;
    use crate::database::MemoryDocumentStore;
    use crate::RagchatError;

    /// Maps text onto one of two axes; "offline" makes it fail
    struct AxisEmbedder;

    #[async_trait]
    impl Embedder for AxisEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            if text.contains("offline") {
                return Err(RagchatError::embedding("provider offline"));
            }
            if text.contains("cat") {
                Ok(vec![1.0, 0.0])
            } else {
                Ok(vec![0.0, 1.0])
            }
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    fn ingestor() -> (Arc<MemoryDocumentStore>, SharedIndex, Ingestor) {
        let store = Arc::new(MemoryDocumentStore::new(2));
        let index = SharedIndex::new(VectorIndex::new(2));
        let ingestor = Ingestor::new(store.clone(), Arc::new(AxisEmbedder), index.clone());
        (store, index, ingestor)
    }

    #[tokio::test]
    async fn test_add_document_publishes_to_index() {
        let (store, index, ingestor) = ingestor();

        let outcome = ingestor.add_document("  cats purr  ").await.unwrap();
        assert!(outcome.embedded);
        assert_eq!(outcome.document.content, "cats purr");

        let snapshot = index.snapshot();
        assert!(snapshot.contains(outcome.document.id));
        let hits = snapshot.query(&[1.0, 0.0], NonZeroUsize::new(1).unwrap());
        assert_eq!(hits[0].document.id, outcome.document.id);

        assert_eq!(store.counts().await.unwrap().embedded, 1);
    }

    #[tokio::test]
    async fn test_add_document_keeps_document_when_embedding_fails() {
        let (store, index, ingestor) = ingestor();

        let outcome = ingestor.add_document("offline note").await.unwrap();
        assert!(!outcome.embedded);
        assert!(index.snapshot().is_empty());

        let stored = store.get(outcome.document.id).await.unwrap().unwrap();
        assert!(!stored.has_embedding());
    }

    #[tokio::test]
    async fn test_add_document_rejects_blank() {
        let (store, _, ingestor) = ingestor();
        let err = ingestor.add_document("   ").await.unwrap_err();
        assert!(matches!(err, RagchatError::Validation(_)));
        assert_eq!(store.counts().await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn test_backfill_reloads_index() {
        let (store, index, ingestor) = ingestor();
        store.create("dogs bark").await.unwrap();
        store.create("offline entry").await.unwrap();

        let stats = ingestor.backfill_missing().await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.updated, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(index.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn test_reload_index_reflects_store() {
        let (store, index, ingestor) = ingestor();
        let doc = store.create("cat facts").await.unwrap();
        store.set_embedding(doc.id, &[1.0, 0.0]).await.unwrap();

        assert!(index.snapshot().is_empty());
        assert_eq!(ingestor.reload_index().await.unwrap(), 1);
        assert!(index.snapshot().contains(doc.id));
    }
}

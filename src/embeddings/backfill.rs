//! Backfill embeddings for stored documents that have none

use tracing::info;
use tracing::warn;

use super::Embedder;
use super::MAX_BATCH_SIZE;
use crate::database::DocumentStore;
use crate::errors::RagchatError;
use crate::errors::Result;
use crate::models::Document;

/// Embed every document that lacks an embedding.
///
/// Documents are embedded one batch request per chunk. When a batch request
/// fails, that chunk is retried one document at a time so a single bad
/// document does not fail its neighbours. A document that fails to embed or
/// store is counted in `failed` and the run continues with the next one.
pub async fn backfill_embeddings(
    store: &dyn DocumentStore,
    embedder: &dyn Embedder,
) -> Result<BackfillStats> {
    info!("Starting embeddings backfill");

    let mut stats = BackfillStats::default();

    let documents = store.missing_embeddings().await?;
    stats.total = documents.len();
    info!("Found {} documents without embeddings", documents.len());

    let batches = documents.len().div_ceil(MAX_BATCH_SIZE);
    for (batch_idx, chunk) in documents.chunks(MAX_BATCH_SIZE).enumerate() {
        info!(
            "Processing batch {}/{} ({} documents)",
            batch_idx + 1,
            batches,
            chunk.len()
        );

        let embeddings: Vec<Result<Vec<f32>>> = match embed_chunk(embedder, chunk).await {
            Ok(embeddings) => embeddings.into_iter().map(Ok).collect(),
            Err(e) => {
                warn!(
                    "Batch {} failed, embedding its documents one by one: {}",
                    batch_idx + 1,
                    e
                );
                let mut embeddings = Vec::with_capacity(chunk.len());
                for document in chunk {
                    embeddings.push(embedder.embed(&document.content).await);
                }
                embeddings
            }
        };

        for (document, embedding) in chunk.iter().zip(embeddings) {
            let outcome = match embedding {
                Ok(embedding) => store.set_embedding(document.id, &embedding).await,
                Err(e) => Err(e),
            };
            match outcome {
                Ok(()) => stats.updated += 1,
                Err(e) => {
                    warn!("Failed to backfill embedding for document {}: {}", document.id, e);
                    stats.failed += 1;
                }
            }
        }
    }

    info!(
        "Backfill complete: {} updated, {} failed",
        stats.updated, stats.failed
    );

    Ok(stats)
}

async fn embed_chunk(embedder: &dyn Embedder, chunk: &[Document]) -> Result<Vec<Vec<f32>>> {
    let texts: Vec<&str> = chunk.iter().map(|d| d.content.as_str()).collect();
    let embeddings = embedder.embed_batch(&texts).await?;
    if embeddings.len() != chunk.len() {
        return Err(RagchatError::embedding(format!(
            "batch returned {} embeddings for {} texts",
            embeddings.len(),
            chunk.len()
        )));
    }
    Ok(embeddings)
}

/// Backfill statistics
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BackfillStats {
    pub total: usize,
    pub updated: usize,
    pub failed: usize,
}

impl BackfillStats {
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.updated as f64 / self.total as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use async_trait::async_trait;

    use super::*;
    use crate::database::MemoryDocumentStore;

    /// Embeds by text length; refuses any text containing "fail".
    /// Batch requests fail as a whole when any text in them is refused.
    #[derive(Default)]
    struct LengthEmbedder {
        single_calls: AtomicUsize,
        batch_calls: AtomicUsize,
    }

    #[async_trait]
    impl Embedder for LengthEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.single_calls.fetch_add(1, Ordering::SeqCst);
            if text.contains("fail") {
                return Err(RagchatError::embedding("provider refused"));
            }
            Ok(vec![text.len() as f32, 1.0])
        }

        async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            self.batch_calls.fetch_add(1, Ordering::SeqCst);
            if texts.iter().any(|t| t.contains("fail")) {
                return Err(RagchatError::embedding("provider refused the batch"));
            }
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    #[tokio::test]
    async fn test_backfill_uses_one_batch_request_per_chunk() {
        let store = MemoryDocumentStore::new(2);
        for i in 0..(MAX_BATCH_SIZE + 5) {
            store.create(&format!("document {i}")).await.unwrap();
        }
        let embedder = LengthEmbedder::default();

        let stats = backfill_embeddings(&store, &embedder).await.unwrap();

        assert_eq!(stats.updated, MAX_BATCH_SIZE + 5);
        assert_eq!(stats.failed, 0);
        assert_eq!(embedder.batch_calls.load(Ordering::SeqCst), 2);
        assert_eq!(embedder.single_calls.load(Ordering::SeqCst), 0);
        assert!(store.missing_embeddings().await.unwrap().is_empty());

        let first = store.get(1).await.unwrap().unwrap();
        assert_eq!(first.embedding, Some(vec!["document 0".len() as f32, 1.0]));
    }

    #[tokio::test]
    async fn test_backfill_counts_failures_and_continues() {
        let store = MemoryDocumentStore::new(2);
        store.create("alpha").await.unwrap();
        store.create("this will fail").await.unwrap();
        store.create("gamma").await.unwrap();
        let embedder = LengthEmbedder::default();

        let stats = backfill_embeddings(&store, &embedder).await.unwrap();
        assert_eq!(
            stats,
            BackfillStats {
                total: 3,
                updated: 2,
                failed: 1
            }
        );
        // the refused batch is retried per document
        assert_eq!(embedder.batch_calls.load(Ordering::SeqCst), 1);
        assert_eq!(embedder.single_calls.load(Ordering::SeqCst), 3);

        let missing = store.missing_embeddings().await.unwrap();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].content, "this will fail");
    }

    #[tokio::test]
    async fn test_backfill_with_nothing_missing() {
        let store = MemoryDocumentStore::new(2);
        let stats = backfill_embeddings(&store, &LengthEmbedder::default()).await.unwrap();
        assert_eq!(stats, BackfillStats::default());
        assert_eq!(stats.success_rate(), 0.0);
    }

    #[test]
    fn test_success_rate() {
        let stats = BackfillStats {
            total: 4,
            updated: 3,
            failed: 1,
        };
        assert!((stats.success_rate() - 75.0).abs() < f64::EPSILON);
    }
}

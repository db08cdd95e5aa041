//! In-process document store.
//!
//! Used by the test suite and by callers that want retrieval without a
//! running PostgreSQL server. Contents are lost when the store is dropped.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::check_dimension;
use super::normalize_content;
use super::DocumentCounts;
use super::DocumentStore;
use crate::models::Document;
use crate::RagchatError;
use crate::Result;

#[derive(Debug, Default)]
struct Inner {
    documents: BTreeMap<i64, Document>,
    next_id: i64,
}

#[derive(Debug)]
pub struct MemoryDocumentStore {
    inner: RwLock<Inner>,
    dimension: usize,
}

impl MemoryDocumentStore {
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            inner: RwLock::new(Inner {
                documents: BTreeMap::new(),
                next_id: 1,
            }),
            dimension,
        }
    }

    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.dimension
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn list_embedded(&self) -> Result<Vec<Document>> {
        let inner = self.inner.read().await;
        Ok(inner
            .documents
            .values()
            .filter(|d| d.has_embedding())
            .cloned()
            .collect())
    }

    async fn list(&self, limit: usize) -> Result<Vec<Document>> {
        let inner = self.inner.read().await;
        Ok(inner.documents.values().rev().take(limit).cloned().collect())
    }

    async fn get(&self, id: i64) -> Result<Option<Document>> {
        Ok(self.inner.read().await.documents.get(&id).cloned())
    }

    async fn create(&self, content: &str) -> Result<Document> {
        let content = normalize_content(content)?;
        let mut inner = self.inner.write().await;
        let id = inner.next_id;
        inner.next_id += 1;

        let now = Utc::now();
        let document = Document {
            id,
            content: content.to_string(),
            embedding: None,
            created_at: now,
            updated_at: now,
        };
        inner.documents.insert(id, document.clone());
        Ok(document)
    }

    async fn set_embedding(&self, id: i64, embedding: &[f32]) -> Result<()> {
        check_dimension(self.dimension, embedding)?;
        let mut inner = self.inner.write().await;
        let document = inner
            .documents
            .get_mut(&id)
            .ok_or(RagchatError::DocumentNotFound(id))?;
        document.embedding = Some(embedding.to_vec());
        document.updated_at = Utc::now();
        Ok(())
    }

    async fn missing_embeddings(&self) -> Result<Vec<Document>> {
        let inner = self.inner.read().await;
        Ok(inner
            .documents
            .values()
            .filter(|d| !d.has_embedding())
            .cloned()
            .collect())
    }

    async fn counts(&self) -> Result<DocumentCounts> {
        let inner = self.inner.read().await;
        Ok(DocumentCounts {
            total: inner.documents.len(),
            embedded: inner.documents.values().filter(|d| d.has_embedding()).count(),
        })
    }
}

use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::Document;
use crate::Result;

mod documents;
pub mod memory;
mod schema;
pub mod vector;

pub use memory::MemoryDocumentStore;
pub use vector::encode_vector_literal;
pub use vector::parse_vector_literal;

/// Document counts for status output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentCounts {
    pub total: usize,
    pub embedded: usize,
}

/// Persistent document corpus.
///
/// The retrieval index is built from [`DocumentStore::list_embedded`]; the
/// remaining operations serve ingestion.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every document that has an embedding, ordered by id
    async fn list_embedded(&self) -> Result<Vec<Document>>;

    /// Most recently created documents first
    async fn list(&self, limit: usize) -> Result<Vec<Document>>;

    async fn get(&self, id: i64) -> Result<Option<Document>>;

    /// Store new content (trimmed). Blank content is a `Validation` error.
    async fn create(&self, content: &str) -> Result<Document>;

    /// Attach or replace a document's embedding.
    /// Fails with `DimensionMismatch` when the length is not the store's dimension.
    async fn set_embedding(&self, id: i64, embedding: &[f32]) -> Result<()>;

    /// Documents still lacking an embedding, ordered by id
    async fn missing_embeddings(&self) -> Result<Vec<Document>>;

    async fn counts(&self) -> Result<DocumentCounts>;
}

/// Database connection pool wrapper
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
    dimension: usize,
}

impl Database {
    #[must_use]
    pub const fn new(pool: PgPool, dimension: usize) -> Self {
        Self { pool, dimension }
    }

    /// Create a new database instance from configuration
    pub async fn from_config(config: &crate::config::AppConfig) -> Result<Self> {
        let pool_options = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.max_connections())
            .min_connections(config.min_connections())
            .acquire_timeout(std::time::Duration::from_secs(config.connection_timeout()));

        let pool = pool_options.connect(config.database_url()).await?;

        tracing::info!(
            "Database pool configured: max_connections={}, min_connections={}",
            config.max_connections(),
            config.min_connections()
        );

        Ok(Self::new(pool, config.embedding_dimension()))
    }

    /// Get a reference to the database pool for raw queries
    #[must_use]
    pub const fn pool(&self) -> &sqlx::PgPool {
        &self.pool
    }

    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Shared content check for all store implementations
pub(crate) fn normalize_content(content: &str) -> Result<&str> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(crate::RagchatError::Validation(
            "document content must not be empty".to_string(),
        ));
    }
    Ok(trimmed)
}

pub(crate) fn check_dimension(expected: usize, embedding: &[f32]) -> Result<()> {
    if embedding.len() != expected {
        return Err(crate::RagchatError::DimensionMismatch {
            expected,
            actual: embedding.len(),
        });
    }
    Ok(())
}

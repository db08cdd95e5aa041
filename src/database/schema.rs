use super::Database;
use crate::RagchatError;
use crate::Result;

/// ivfflat list count for the cosine index
const VECTOR_INDEX_LISTS: usize = 100;

impl Database {
    /// Check that the server answers at all
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Whether the pgvector extension is installed in this database
    pub async fn has_vector_extension(&self) -> Result<bool> {
        let installed = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT FROM pg_extension WHERE extname = 'vector')",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(installed)
    }

    /// Check if database schema is initialized
    pub async fn is_schema_initialized(&self) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS (
                SELECT FROM information_schema.tables
                WHERE table_schema = 'public'
                AND table_name = 'documents'
            )
            ",
        )
        .fetch_one(&self.pool)
        .await?;

        if !exists {
            tracing::debug!("Missing required table: documents");
        }
        Ok(exists)
    }

    /// Verify database schema or return helpful error
    pub async fn verify_schema_or_error(&self) -> Result<()> {
        if !self.is_schema_initialized().await? {
            return Err(RagchatError::ConfigError(
                "Database schema not initialized. Run `ragchat init` first.".to_string(),
            ));
        }
        Ok(())
    }

    /// Initialize database schema
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await?;

        // The dimension comes from configuration, never from request data
        sqlx::query(&format!(
            r"
            CREATE TABLE IF NOT EXISTS documents (
                id BIGSERIAL PRIMARY KEY,
                content TEXT NOT NULL CHECK (length(btrim(content)) > 0),
                embedding VECTOR({}),
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
            )
            ",
            self.dimension
        ))
        .execute(&self.pool)
        .await?;

        sqlx::query(&format!(
            r"
            CREATE INDEX IF NOT EXISTS idx_documents_embedding
            ON documents USING ivfflat (embedding vector_cosine_ops)
            WITH (lists = {VECTOR_INDEX_LISTS})
            "
        ))
        .execute(&self.pool)
        .await?;

        tracing::info!("Database schema initialized (embedding dimension {})", self.dimension);
        Ok(())
    }
}

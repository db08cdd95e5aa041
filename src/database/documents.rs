use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use super::check_dimension;
use super::encode_vector_literal;
use super::normalize_content;
use super::Database;
use super::DocumentCounts;
use super::DocumentStore;
use crate::models::Document;
use crate::RagchatError;
use crate::Result;

#[derive(Debug, sqlx::FromRow)]
struct DocumentRow {
    id: i64,
    content: String,
    embedding: Option<pgvector::Vector>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Self {
            id: row.id,
            content: row.content,
            embedding: row.embedding.map(Vec::from),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_DOCUMENT: &str =
    "SELECT id, content, embedding, created_at, updated_at FROM documents";

#[async_trait]
impl DocumentStore for Database {
    async fn list_embedded(&self) -> Result<Vec<Document>> {
        let rows = sqlx::query_as::<_, DocumentRow>(&format!(
            "{SELECT_DOCUMENT} WHERE embedding IS NOT NULL ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        // Rows written by other tools may not match the configured dimension
        let (valid, stale): (Vec<Document>, Vec<Document>) = rows
            .into_iter()
            .map(Document::from)
            .partition(|d| d.embedding.as_ref().map_or(0, Vec::len) == self.dimension);
        if !stale.is_empty() {
            tracing::warn!(
                "Ignoring {} documents whose embedding dimension is not {}",
                stale.len(),
                self.dimension
            );
        }
        Ok(valid)
    }

    async fn list(&self, limit: usize) -> Result<Vec<Document>> {
        let rows = sqlx::query_as::<_, DocumentRow>(&format!(
            "{SELECT_DOCUMENT} ORDER BY created_at DESC, id DESC LIMIT $1"
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn get(&self, id: i64) -> Result<Option<Document>> {
        let row = sqlx::query_as::<_, DocumentRow>(&format!("{SELECT_DOCUMENT} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Document::from))
    }

    async fn create(&self, content: &str) -> Result<Document> {
        let content = normalize_content(content)?;
        let row = sqlx::query_as::<_, DocumentRow>(
            r"
            INSERT INTO documents (content)
            VALUES ($1)
            RETURNING id, content, embedding, created_at, updated_at
            ",
        )
        .bind(content)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn set_embedding(&self, id: i64, embedding: &[f32]) -> Result<()> {
        check_dimension(self.dimension, embedding)?;
        let literal = encode_vector_literal(embedding)?;

        let result = sqlx::query(
            r"
            UPDATE documents
            SET embedding = $2::vector, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(literal)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RagchatError::DocumentNotFound(id));
        }
        Ok(())
    }

    async fn missing_embeddings(&self) -> Result<Vec<Document>> {
        let rows = sqlx::query_as::<_, DocumentRow>(&format!(
            "{SELECT_DOCUMENT} WHERE embedding IS NULL ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn counts(&self) -> Result<DocumentCounts> {
        let (total, embedded): (i64, i64) =
            sqlx::query_as("SELECT COUNT(*), COUNT(embedding) FROM documents")
                .fetch_one(&self.pool)
                .await?;
        Ok(DocumentCounts {
            total: total as usize,
            embedded: embedded as usize,
        })
    }
}

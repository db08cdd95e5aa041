use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// A corpus document.
///
/// `embedding`, when present, has exactly the deployment's embedding dimension;
/// documents without one are never retrieved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub const fn has_embedding(&self) -> bool {
        self.embedding.is_some()
    }
}

/// A document matched by a query, with its cosine distance to the query vector
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedDocument {
    pub document: Document,
    pub distance: f32,
}

impl RetrievedDocument {
    pub fn similarity(&self) -> f32 {
        1.0 - self.distance
    }
}

/// Listing view without the embedding payload
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub has_embedding: bool,
}

impl DocumentSummary {
    /// Build a summary with content truncated to `max_chars` characters
    pub fn from_document(document: &Document, max_chars: usize) -> Self {
        Self {
            id: document.id,
            content: crate::cli::output::truncate_str(&document.content, max_chars),
            created_at: document.created_at,
            updated_at: document.updated_at,
            has_embedding: document.has_embedding(),
        }
    }
}

/// Everything produced while answering one question; discarded when the call returns
#[derive(Debug, Clone, Default)]
pub struct QueryContext {
    pub query: String,
    pub embedding: Vec<f32>,
    pub retrieved: Vec<RetrievedDocument>,
    pub context: String,
    pub prompt: String,
    pub answer: String,
}

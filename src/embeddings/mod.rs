//! Embeddings generation module
//!
//! Text is turned into fixed-dimension vectors by an external provider:
//! - OpenAI (`text-embedding-3-small`, `text-embedding-ada-002`, ...)
//! - Ollama (local models)
//!
//! # Examples
//!
//! ```rust,no_run
//! use ragchat::config::AppConfig;
//! use ragchat::embeddings::Embedder;
//! use ragchat::embeddings::EmbeddingService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let service = EmbeddingService::new(&config)?;
//!
//!     let embedding = service.embed("Hello, world!").await?;
//!     println!("Generated embedding with {} dimensions", embedding.len());
//!
//!     Ok(())
//! }
//! ```

pub mod backfill;
pub mod client;
pub mod generator;

use async_trait::async_trait;

pub use backfill::backfill_embeddings;
pub use backfill::BackfillStats;
pub use client::EmbeddingClient;
pub use generator::EmbeddingService;

use crate::errors::Result;

/// Default embedding dimension (`text-embedding-3-small`, `text-embedding-ada-002`)
pub const DEFAULT_EMBEDDING_DIM: usize = 1536;

/// Maximum batch size for embedding generation
pub const MAX_BATCH_SIZE: usize = 100;

/// Converts text into an embedding vector.
///
/// Implementations make one provider call per `embed` (plus any configured
/// retries) and only return vectors of exactly [`Embedder::dimension`] entries.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Fails with `Validation` for blank text and `EmbeddingUnavailable` for
    /// timeouts, non-success statuses, and empty or malformed payloads.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, preserving order
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    fn dimension(&self) -> usize;
}

//! RAG (Retrieval-Augmented Generation) module
//!
//! Questions are answered by a fixed sequence of stages:
//! - Embed the question
//! - Exact nearest-neighbor retrieval over document embeddings
//! - Context assembly from the retrieved documents
//! - Prompt construction and LLM completion
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use ragchat::config::AppConfig;
//! use ragchat::database::Database;
//! use ragchat::rag::RagService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let store = Arc::new(Database::from_config(&config).await?);
//!     let service = RagService::from_config(&config, &*store).await?;
//!
//!     let answer = service.ask("What is a vector database?").await;
//!     println!("{answer}");
//!
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod index;
pub mod ingest;
pub mod pipeline;
pub mod prompts;

use std::num::NonZeroUsize;

pub use context::ContextAssembler;
pub use context::NO_CONTEXT;
pub use index::cosine_distance;
pub use index::cosine_similarity;
pub use index::SharedIndex;
pub use index::VectorIndex;
pub use ingest::load_index;
pub use ingest::IngestOutcome;
pub use ingest::Ingestor;
pub use pipeline::RagService;
pub use prompts::PromptBuilder;

/// Number of documents retrieved per question unless configured otherwise
pub const DEFAULT_TOP_K: NonZeroUsize = match NonZeroUsize::new(5) {
    Some(k) => k,
    None => unreachable!(),
};

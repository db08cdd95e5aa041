//! CLI command handlers module
//!
//! This module is organized by functional domains:
//! - init: Schema initialization and environment checks
//! - data: Document ingestion and listing
//! - rag: Question answering
//! - embeddings: Embedding backfill
//! - info: Configuration display

pub mod data;
pub mod embeddings;
pub mod info;
pub mod init;
pub mod rag;

use std::sync::Arc;

// Re-export all public handlers
pub use data::*;
pub use embeddings::*;
pub use info::*;
pub use init::*;
pub use rag::*;

use crate::database::Database;
use crate::AppConfig;
use crate::Result;

/// Connect and make sure `ragchat init` has been run
async fn connect(config: &AppConfig) -> Result<Arc<Database>> {
    let database = Database::from_config(config).await?;
    database.verify_schema_or_error().await?;
    Ok(Arc::new(database))
}

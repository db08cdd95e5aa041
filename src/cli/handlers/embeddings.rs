//! Embedding generation handlers

use std::sync::Arc;

use super::connect;
use crate::cli::output::print_backfill_stats;
use crate::cli::output::print_info;
use crate::cli::output::print_success;
use crate::cli::output::print_warning;
use crate::embeddings::EmbeddingService;
use crate::rag::load_index;
use crate::rag::Ingestor;
use crate::rag::SharedIndex;
use crate::AppConfig;
use crate::Result;

pub async fn handle_backfill(config: &AppConfig) -> Result<()> {
    let database = connect(config).await?;
    let embedder = Arc::new(EmbeddingService::new(config)?);

    print_info(&format!(
        "🚀 Starting embeddings backfill ({} / {})",
        embedder.provider().as_str(),
        embedder.model()
    ));

    let index = SharedIndex::new(load_index(&*database, config.embedding_dimension()).await?);
    let ingestor = Ingestor::new(database, embedder, index.clone());
    let stats = ingestor.backfill_missing().await?;

    print_backfill_stats(&stats);
    if stats.failed > 0 {
        print_warning("Some documents could not be embedded; see the log for details");
    } else {
        print_success(&format!(
            "Backfill complete, {} documents searchable",
            index.snapshot().len()
        ));
    }
    Ok(())
}

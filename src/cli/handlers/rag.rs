//! RAG (Retrieval-Augmented Generation) handlers

use std::num::NonZeroUsize;

use super::connect;
use crate::cli::output::print_answer;
use crate::cli::output::print_info;
use crate::cli::output::print_warning;
use crate::rag::pipeline::fallback_reply;
use crate::rag::RagService;
use crate::AppConfig;
use crate::RagchatError;
use crate::Result;

pub async fn handle_ask(
    config: &AppConfig,
    question: &str,
    limit: Option<usize>,
    show_sources: bool,
) -> Result<()> {
    let k = match limit {
        Some(n) => NonZeroUsize::new(n)
            .ok_or_else(|| RagchatError::Validation("--limit must be at least 1".to_string()))?,
        None => config.top_k(),
    };

    let database = connect(config).await?;
    let service = RagService::from_config(config, &*database).await?;

    if service.index().snapshot().is_empty() {
        print_warning("No embedded documents found. Run: ragchat backfill");
    }

    print_info(&format!("🤖 Question: \"{}\"", question.trim()));

    // Failures were already logged by the pipeline; the user only sees the reply
    match service.ask_with_context(question, k).await {
        Ok(result) => print_answer(&result, show_sources),
        Err(e) => println!("\n💬 {}", fallback_reply(&e)),
    }

    Ok(())
}

//! Document ingestion and listing handlers

use std::collections::HashSet;
use std::sync::Arc;

use super::connect;
use crate::cli::output::print_document_counts;
use crate::cli::output::print_document_list;
use crate::cli::output::print_info;
use crate::cli::output::print_list_header;
use crate::cli::output::print_success;
use crate::cli::output::print_warning;
use crate::cli::output::truncate_str;
use crate::database::DocumentStore;
use crate::embeddings::EmbeddingService;
use crate::models::DocumentSummary;
use crate::rag::Ingestor;
use crate::rag::SharedIndex;
use crate::rag::VectorIndex;
use crate::AppConfig;
use crate::Result;

/// Sample corpus loaded by `ragchat seed`
pub const SAMPLE_DOCUMENTS: &[&str] = &[
    "Artificial Intelligence (AI) is a branch of computer science that aims to create intelligent machines that can perform tasks that typically require human intelligence. These tasks include learning, reasoning, problem-solving, perception, and language understanding.",
    "Machine Learning is a subset of artificial intelligence that provides systems the ability to automatically learn and improve from experience without being explicitly programmed. It focuses on the development of computer programs that can access data and use it to learn for themselves.",
    "Deep Learning is a subset of machine learning that uses neural networks with three or more layers. These neural networks attempt to simulate the behavior of the human brain, allowing it to 'learn' from large amounts of data.",
    "Natural Language Processing (NLP) is a subfield of linguistics, computer science, and artificial intelligence concerned with the interactions between computers and human language, in particular how to program computers to process and analyze large amounts of natural language data.",
    "Computer Vision is an interdisciplinary scientific field that deals with how computers can gain high-level understanding from digital images or videos. From the perspective of engineering, it seeks to understand and automate tasks that the human visual system can do.",
    "Retrieval-Augmented Generation (RAG) is a technique that combines information retrieval with text generation. It first retrieves relevant documents from a knowledge base and then uses that information to generate more accurate and contextually relevant responses.",
    "PostgreSQL is a powerful, open-source object-relational database system with over 30 years of active development. It has a strong reputation for reliability, feature robustness, and performance. It supports both SQL and JSON querying.",
    "Vector databases are specialized databases designed to store and query high-dimensional vectors efficiently. They are commonly used in machine learning applications for similarity search, recommendation systems, and semantic search capabilities.",
    "Large Language Models (LLMs) are artificial intelligence systems trained on vast amounts of text data to understand and generate human-like text. They can perform various language tasks such as translation, summarization, and question answering.",
];

fn ingestor(config: &AppConfig, store: Arc<dyn DocumentStore>) -> Result<Ingestor> {
    let embedder = Arc::new(EmbeddingService::new(config)?);
    // One-shot commands never query, so the published index starts empty
    let index = SharedIndex::new(VectorIndex::new(config.embedding_dimension()));
    Ok(Ingestor::new(store, embedder, index))
}

pub async fn handle_add(config: &AppConfig, content: &str) -> Result<()> {
    let database = connect(config).await?;
    let ingestor = ingestor(config, database)?;

    let outcome = ingestor.add_document(content).await?;
    if outcome.embedded {
        print_success(&format!("Document #{} saved and embedded", outcome.document.id));
    } else {
        print_warning(&format!(
            "Document #{} saved, but embedding failed. Run `ragchat backfill` to retry.",
            outcome.document.id
        ));
    }
    Ok(())
}

pub async fn handle_list(config: &AppConfig, limit: usize) -> Result<()> {
    let database = connect(config).await?;

    print_list_header("documents", limit);
    let documents = database.list(limit).await?;
    let summaries: Vec<DocumentSummary> = documents
        .iter()
        .map(|d| DocumentSummary::from_document(d, 80))
        .collect();
    print_document_list(&summaries);

    println!();
    print_document_counts(&database.counts().await?);
    Ok(())
}

/// Add every sample document whose exact content is not stored yet
pub async fn handle_seed(config: &AppConfig) -> Result<()> {
    let database = connect(config).await?;

    let total = database.counts().await?.total;
    let existing: HashSet<String> = database
        .list(total)
        .await?
        .into_iter()
        .map(|d| d.content)
        .collect();

    let ingestor = ingestor(config, database)?;
    print_info("🌱 Creating sample documents...");

    let mut created = 0;
    let mut unembedded = 0;
    for (idx, content) in SAMPLE_DOCUMENTS.iter().enumerate() {
        if existing.contains(*content) {
            println!("  {}. already present, skipping", idx + 1);
            continue;
        }
        let outcome = ingestor.add_document(content).await?;
        created += 1;
        if !outcome.embedded {
            unembedded += 1;
        }
        println!(
            "  {}. #{} {}",
            idx + 1,
            outcome.document.id,
            truncate_str(content, 50)
        );
    }

    print_success(&format!("Seeding complete: {created} created"));
    if unembedded > 0 {
        print_warning(&format!(
            "{unembedded} documents have no embedding yet. Run `ragchat backfill` once the provider is reachable."
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_documents_are_distinct_and_trimmed() {
        let unique: HashSet<&str> = SAMPLE_DOCUMENTS.iter().copied().collect();
        assert_eq!(unique.len(), SAMPLE_DOCUMENTS.len());
        for content in SAMPLE_DOCUMENTS {
            assert_eq!(content.trim(), *content);
        }
    }
}

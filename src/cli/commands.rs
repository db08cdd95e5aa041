//! CLI command definitions and argument parsing

use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

#[derive(Parser)]
#[command(name = "ragchat")]
#[command(about = "Question answering over a document corpus with retrieval-augmented generation")]
#[command(version)]
pub struct Cli {
    /// Enable verbose debug logging (default: configured level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (default: config.toml, then config.example.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ask a question about the stored documents
    Ask {
        /// The question
        question: String,
        /// Number of documents to retrieve (default: retrieval.top_k)
        #[arg(short, long)]
        limit: Option<usize>,
        /// Show the retrieved sources
        #[arg(short, long)]
        sources: bool,
    },
    /// Add a document and embed it
    Add {
        /// Document text
        content: String,
    },
    /// List stored documents, newest first
    List {
        /// Maximum number of documents to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Load the bundled sample documents (skips ones already stored)
    Seed,
    /// Generate embeddings for documents that have none
    Backfill,
    /// Initialize database schema and indexes
    Init {
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
    /// Validate configuration and connectivity
    Check,
    /// Show current configuration
    Config,
}

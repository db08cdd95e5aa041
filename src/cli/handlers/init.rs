//! Schema initialization and environment check handlers

use crate::cli::output::mask_database_url;
use crate::cli::output::print_error;
use crate::cli::output::print_info;
use crate::cli::output::print_success;
use crate::cli::output::print_warning;
use crate::config::ProviderKind;
use crate::database::Database;
use crate::database::DocumentStore;
use crate::AppConfig;
use crate::Result;

/// Handle database initialization command
pub async fn handle_init(config: &AppConfig, force: bool) -> Result<()> {
    if !force {
        print_warning(
            "This will create the pgvector extension, the documents table and its index.",
        );
        print_warning("This operation is safe - it uses CREATE IF NOT EXISTS.");
        println!("\nUse --force to proceed.");
        return Ok(());
    }

    print_info("🗄️  Initializing ragchat database...");
    let database = Database::from_config(config).await?;

    if let Err(e) = database.init_schema().await {
        if e.to_string().contains("vector") || e.to_string().contains("extension") {
            print_warning(&format!("Could not enable pgvector extension: {e}"));
            println!("  Run on the database server: CREATE EXTENSION IF NOT EXISTS vector;");
            println!("  Then run: ragchat init --force");
        }
        return Err(e);
    }

    print_success(&format!(
        "Schema ready (embedding dimension {})",
        config.embedding_dimension()
    ));
    print_info("To load sample documents, run: ragchat seed");
    Ok(())
}

/// Validate configuration and connectivity without calling the model providers.
///
/// Problems are reported line by line; the command itself only fails when the
/// database cannot be reached at all.
pub async fn handle_check(config: &AppConfig) -> Result<()> {
    println!("🔍 ragchat environment check");
    println!("============================");

    print_success("Configuration loaded and valid");
    println!("  Database URL: {}", mask_database_url(config.database_url()));

    let database = match Database::from_config(config).await {
        Ok(db) => db,
        Err(e) => {
            print_error(&format!("Database connection failed: {e}"));
            println!("  Make sure PostgreSQL is running and database.url is correct");
            return Err(e);
        }
    };

    match database.ping().await {
        Ok(()) => print_success("Database connection working"),
        Err(e) => print_error(&format!("Database query failed: {e}")),
    }

    match database.has_vector_extension().await {
        Ok(true) => print_success("pgvector extension is installed"),
        Ok(false) => {
            print_error("pgvector extension not installed");
            println!("  Run: ragchat init --force");
        }
        Err(e) => print_error(&format!("Could not inspect extensions: {e}")),
    }

    match database.is_schema_initialized().await {
        Ok(true) => match database.counts().await {
            Ok(counts) => print_success(&format!(
                "Documents table accessible ({} documents, {} embedded)",
                counts.total, counts.embedded
            )),
            Err(e) => print_error(&format!("Documents table error: {e}")),
        },
        Ok(false) => {
            print_error("Documents table missing");
            println!("  Run: ragchat init --force");
        }
        Err(e) => print_error(&format!("Could not inspect schema: {e}")),
    }

    match (config.embedding_provider(), config.embedding_api_key()) {
        (ProviderKind::OpenAI, Some(_)) => print_success("Embedding API key is set"),
        (ProviderKind::OpenAI, None) => {
            print_warning("Embedding API key is not set (embeddings won't work)");
        }
        (ProviderKind::Ollama, _) => print_info(&format!(
            "Ollama embeddings at {}",
            config.embedding_endpoint()
        )),
    }
    print_info(&format!("LlamaCpp URL configured as: {}", config.llm_endpoint()));

    println!("\n🎯 Next steps:");
    println!("1. ragchat init --force");
    println!("2. ragchat seed (optional - adds sample data)");
    println!("3. Start the completion server at {}", config.llm_endpoint());
    println!("4. ragchat ask \"What is RAG?\"");

    Ok(())
}

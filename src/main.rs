use clap::Parser;
use ragchat::cli;
use ragchat::cli::Cli;
use ragchat::cli::Commands;
use ragchat::AppConfig;
use tracing::info;
use tracing::warn;

fn load_config(cli: &Cli) -> ragchat::Result<AppConfig> {
    match &cli.config {
        Some(path) => AppConfig::from_file(path),
        None => AppConfig::load(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            cli::print_error(&format!("Configuration error: {e}"));
            println!("\n💡 To fix this:");
            println!("  1. Copy config.example.toml to config.toml");
            println!("  2. Edit config.toml with your database and provider details");
            println!("  3. Run `ragchat check`");
            return Err(e.into());
        }
    };

    // Initialize logging
    if cli.verbose {
        ragchat::logging::init_logging_with_level("debug")?;
    } else {
        ragchat::logging::init_logging_with_config(&config)?;
    }
    info!("Configuration loaded successfully");
    if config.missing_embedding_api_key() {
        warn!("OpenAI API key not found. Set OPENAI_API_KEY; embedding commands will fail.");
    }

    match cli.command {
        Commands::Ask {
            question,
            limit,
            sources,
        } => cli::handle_ask(&config, &question, limit, sources).await?,
        Commands::Add { content } => cli::handle_add(&config, &content).await?,
        Commands::List { limit } => cli::handle_list(&config, limit).await?,
        Commands::Seed => cli::handle_seed(&config).await?,
        Commands::Backfill => cli::handle_backfill(&config).await?,
        Commands::Init { force } => cli::handle_init(&config, force).await?,
        Commands::Check => cli::handle_check(&config).await?,
        Commands::Config => cli::handle_config_command(&config)?,
    }

    Ok(())
}

//! docseek CLI
//!
//! Main entry point for the docseek command-line tool.
//! Indexes local documents and searches them by meaning or exact phrase.

mod commands;

use clap::{Parser, Subcommand};
use commands::{IngestCommand, ListCommand, ResetCommand, SearchCommand, StatsCommand};
use docseek_core::{config::AppConfig, logging, AppResult};
use docseek_retrieval::SearchService;
use std::path::PathBuf;

/// docseek - local document indexing and retrieval
#[derive(Parser, Debug)]
#[command(name = "docseek")]
#[command(about = "Local document indexing and retrieval", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "DOCSEEK_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "DOCSEEK_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Embedding provider used when a store is first created (trigram, tfidf, ollama)
    #[arg(short, long, global = true, env = "DOCSEEK_PROVIDER")]
    provider: Option<String>,

    /// Embedding model identifier
    #[arg(short, long, global = true, env = "DOCSEEK_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Index documents from files and directories
    Ingest(IngestCommand),

    /// Search indexed documents
    Search(SearchCommand),

    /// Delete every indexed document
    Reset(ResetCommand),

    /// Show store statistics
    Stats(StatsCommand),

    /// List indexed documents
    List(ListCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let config = AppConfig::load_with(cli.workspace, cli.config)?;

    // Apply CLI overrides
    let config = config.with_overrides(
        None,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("docseek starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!(
        "Embedding: {} / {} ({} dimensions)",
        config.embedding.provider,
        config.embedding.model,
        config.embedding.dimensions
    );

    config.ensure_data_dir()?;
    let service = SearchService::new(config)?;

    let command_name = match &cli.command {
        Commands::Ingest(_) => "ingest",
        Commands::Search(_) => "search",
        Commands::Reset(_) => "reset",
        Commands::Stats(_) => "stats",
        Commands::List(_) => "list",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Ingest(cmd) => cmd.execute(&service).await,
        Commands::Search(cmd) => cmd.execute(&service).await,
        Commands::Reset(cmd) => cmd.execute(&service).await,
        Commands::Stats(cmd) => cmd.execute(&service).await,
        Commands::List(cmd) => cmd.execute(&service).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}

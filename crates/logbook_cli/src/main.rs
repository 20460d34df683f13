use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use logbook_cli::commands;
use logbook_cli::config::Config;
use logbook_db::LogbookRepository;
use logbook_service::LogbookService;

#[derive(Parser)]
#[command(name = "logbook")]
#[command(about = "Residency logbook operator tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the database schema from embedded assets
    Rebuild(commands::rebuild::RebuildArgs),

    /// Manage student batches
    #[command(subcommand)]
    Batch(commands::batch::BatchCommand),

    /// Assign reviewers to batches or students
    #[command(subcommand)]
    Assign(commands::assign::AssignCommand),

    /// Print the log kinds, categories and fields
    Catalog(commands::catalog::CatalogArgs),

    /// Validate an entry JSON file against a kind's rules
    Validate(commands::validate::ValidateArgs),

    /// Export a student's signed logbook to disk
    Export(commands::export::ExportArgs),

    /// Mint a development session token
    Token(commands::token::TokenArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    // 1. Load config (fails fast if invalid)
    let config = Config::from_env()?;

    // 2. Parse arguments and route to the correct command
    let cli = Cli::parse();

    match cli.command {
        Commands::Rebuild(args) => {
            let pool = config.connect().await?;
            commands::rebuild::execute(pool, args).await?;
        }
        Commands::Batch(command) => {
            let repo = LogbookRepository::new(config.connect().await?);
            commands::batch::execute(&repo, command).await?;
        }
        Commands::Assign(command) => {
            let repo = LogbookRepository::new(config.connect().await?);
            commands::assign::execute(&repo, command).await?;
        }
        Commands::Catalog(args) => {
            // Pure lookup, no database needed.
            commands::catalog::run(args)?;
        }
        Commands::Validate(args) => {
            commands::validate::run(args)?;
        }
        Commands::Export(args) => {
            let repo = LogbookRepository::new(config.connect().await?);
            let service = LogbookService::new(Arc::new(repo));
            commands::export::execute(&service, args).await?;
        }
        Commands::Token(args) => {
            commands::token::run(args)?;
        }
    }

    Ok(())
}

use anyhow::Result;
use clap::{Args, Subcommand};

use logbook_core::models::Batch;
use logbook_db::LogbookStore;

#[derive(Debug, Subcommand)]
pub enum BatchCommand {
    /// Create a cohort of students
    Create(CreateBatchArgs),

    /// List every batch, newest admission year first
    List,
}

#[derive(Debug, Args)]
pub struct CreateBatchArgs {
    #[arg(long)]
    pub name: String,

    /// Admission year, e.g. 2025
    #[arg(long)]
    pub year: i32,
}

pub async fn execute(store: &dyn LogbookStore, command: BatchCommand) -> Result<()> {
    match command {
        BatchCommand::Create(args) => {
            let batch = Batch::new(args.name, args.year);
            store.create_batch(&batch).await?;
            tracing::info!(batch_id = %batch.id, name = %batch.name, "batch created");
            println!("✅ Batch '{}' created.", batch.name);
            println!("   Primary Key (UUID): {}", batch.id);
        }
        BatchCommand::List => {
            let batches = store.list_batches().await?;
            if batches.is_empty() {
                println!("No batches yet.");
            }
            for batch in batches {
                println!("{}  {:<6} {}", batch.id, batch.admission_year, batch.name);
            }
        }
    }
    Ok(())
}

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use logbook_core::models::UserId;
use logbook_service::LogbookService;

use crate::commands::operator;

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Student whose signed entries are exported
    #[arg(long)]
    pub student: String,

    /// Directory to write logbook.csv, logbook.pdf and sha256.txt into
    #[arg(long)]
    pub output: PathBuf,
}

pub async fn execute(service: &LogbookService, args: ExportArgs) -> Result<()> {
    println!("📦 Exporting logbook for {}...", args.student);

    let summary = service
        .export_logbook(&operator(), &UserId::new(args.student.as_str()), &args.output)
        .await?;

    tracing::info!(student = %args.student, entries = summary.entries, "logbook exported");
    println!("✅ {} signed entries written to {:?}", summary.entries, summary.output_dir);
    for (hash, name) in &summary.files {
        println!("   {}  {}", hash, name);
    }
    Ok(())
}

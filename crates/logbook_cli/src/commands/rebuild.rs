use anyhow::{Context, Result};
use clap::Args;
use sqlx::{Executor, PgPool};

use logbook_db::rebuild_database;

#[derive(Debug, Args)]
pub struct RebuildArgs {
    /// Drop every table in the public schema first. Destroys all logbook data.
    #[arg(long)]
    pub reset: bool,
}

const RESET_SQL: &str = "DROP SCHEMA public CASCADE; CREATE SCHEMA public;";

pub async fn execute(pool: PgPool, args: RebuildArgs) -> Result<()> {
    if args.reset {
        tracing::warn!("dropping the public schema");
        pool.execute(RESET_SQL)
            .await
            .context("Failed to reset the public schema")?;
    }

    let applied = rebuild_database(&pool)
        .await
        .context("Failed to apply the logbook schema")?;
    tracing::info!(files = applied.len(), reset = args.reset, "schema applied");

    println!("Applied {} schema file(s){}:", applied.len(), if args.reset { " after reset" } else { "" });
    for file in &applied {
        println!("  {}", file);
    }
    Ok(())
}

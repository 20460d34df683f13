use anyhow::Result;
use clap::Args;

use logbook_core::catalog::{catalog, LogKind};

#[derive(Debug, Args)]
pub struct CatalogArgs {
    /// Print a single kind (e.g. procedure)
    #[arg(long)]
    pub kind: Option<LogKind>,

    /// Emit JSON instead of a text listing
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: CatalogArgs) -> Result<()> {
    let kinds: Vec<_> = match args.kind {
        Some(kind) => vec![kind.descriptor()],
        None => catalog(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&kinds)?);
        return Ok(());
    }

    for descriptor in kinds {
        println!("{} ({})", descriptor.label, descriptor.kind);
        println!("  categories: {}", descriptor.categories.join(", "));
        for field in descriptor.fields {
            let marker = if field.required { "*" } else { " " };
            println!("  {} {:<18} {:?}", marker, field.name, field.kind);
        }
        println!();
    }
    Ok(())
}

use anyhow::{bail, Context, Result};
use clap::Args;
use serde_json::{Map, Value};
use std::fs;
use std::path::PathBuf;

use logbook_core::catalog::LogKind;
use logbook_core::standard_validator;
use logbook_core::validation::{EntryCandidate, FieldIssue, Stage};

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Log kind the entry belongs to (e.g. case_presentation)
    #[arg(short, long)]
    pub kind: LogKind,

    /// JSON file shaped like `{"category": "...", "fields": {...}}`
    #[arg(short, long)]
    pub file: PathBuf,

    /// Apply submission rules (required fields) instead of draft rules
    #[arg(long)]
    pub submit: bool,
}

/// Checks an entry file against the kind's rules. Returns the issues found.
pub fn check(args: &ValidateArgs) -> Result<Vec<FieldIssue>> {
    let raw = fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read file: {}", args.file.display()))?;
    let doc: Value = serde_json::from_str(&raw).context("The file is not valid JSON")?;

    let category = doc.get("category").and_then(Value::as_str).unwrap_or_default();
    let fields = match doc.get("fields") {
        Some(Value::Object(map)) => map.clone(),
        Some(_) => bail!("'fields' must be a JSON object"),
        None => Map::new(),
    };

    let candidate = EntryCandidate {
        kind: args.kind,
        category,
        fields: &fields,
        stage: if args.submit { Stage::Submission } else { Stage::Draft },
    };
    Ok(standard_validator().run(&candidate))
}

pub fn run(args: ValidateArgs) -> Result<()> {
    println!("🔍 Validating: {:?} as {}", args.file, args.kind);

    let issues = check(&args)?;
    if issues.is_empty() {
        println!("🎉 VALIDATION PASSED!");
        return Ok(());
    }

    println!("⚠️  VALIDATION FAILED: Found {} issues.", issues.len());
    println!("{:-<50}", "-");
    for issue in &issues {
        println!("🛑 [{}] {}", issue.field, issue.message);
    }
    bail!("{} validation issue(s)", issues.len())
}

use rust_embed::RustEmbed;
use sqlx::{Executor, PgPool};
use std::str;

use logbook_core::{LogbookError, Result};

#[derive(RustEmbed)]
#[folder = "schema/"]
struct SchemaAssets;

const BUILD_ORDER: &str = "00_build_order.sql";

/// Reads the build order and applies all SQL files in a single transaction.
/// Returns the included files in the order they were applied.
pub async fn rebuild_database(pool: &PgPool) -> Result<Vec<String>> {
    let script = assemble_script()?;

    let mut tx = pool.begin().await.map_err(|e| LogbookError::Database(e.to_string()))?;
    (&mut *tx)
        .execute(script.sql.as_str())
        .await
        .map_err(|e| LogbookError::Database(e.to_string()))?;
    tx.commit().await.map_err(|e| LogbookError::Database(e.to_string()))?;

    Ok(script.included)
}

struct Script {
    sql: String,
    included: Vec<String>,
}

fn assemble_script() -> Result<Script> {
    // 1. Read the manifest
    let manifest = get_file_content(BUILD_ORDER)?;

    // 2. Parse and aggregate SQL
    let mut sql = String::new();
    let mut included = Vec::new();

    for line in manifest.lines() {
        let trimmed = line.trim();

        // Parse: -- @include folder/file.sql
        if let Some(path) = parse_include_directive(trimmed) {
            tracing::info!(file = path, "including schema file");
            sql.push_str(&get_file_content(path)?);
            sql.push('\n');
            included.push(path.to_string());
        } else if !trimmed.starts_with("--") {
            // Keep normal lines (if any), ignore comments
            sql.push_str(line);
            sql.push('\n');
        }
    }

    Ok(Script { sql, included })
}

fn get_file_content(path: &str) -> Result<String> {
    let file = SchemaAssets::get(path)
        .ok_or_else(|| LogbookError::Internal(format!("missing schema file: {}", path)))?;
    str::from_utf8(file.data.as_ref())
        .map(str::to_string)
        .map_err(|e| LogbookError::Internal(format!("schema file {} is not UTF-8: {}", path, e)))
}

fn parse_include_directive(line: &str) -> Option<&str> {
    if line.starts_with("--") && line.contains("@include") {
        line.split_whitespace().last()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logbook_core::catalog::LogKind;

    #[test]
    fn test_include_directive() {
        assert_eq!(parse_include_directive("-- @include tables/users.sql"), Some("tables/users.sql"));
        assert_eq!(parse_include_directive("-- plain comment"), None);
        assert_eq!(parse_include_directive("SELECT 1;"), None);
    }

    #[test]
    fn test_script_creates_every_log_table() {
        let script = assemble_script().unwrap();
        assert_eq!(script.included.first().map(String::as_str), Some("tables/batches.sql"));
        for kind in LogKind::ALL {
            let ddl = format!("CREATE TABLE IF NOT EXISTS {} (", kind.table());
            assert!(script.sql.contains(&ddl), "missing table for {}", kind);
        }
        assert!(script.sql.contains("UNIQUE (entity_type, entity_id)"));
    }
}

use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub session_secret: String,
    pub session_issuers: Vec<String>,
    pub webhook_secret: String,
    pub apply_schema: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok(); // Load .env if present

        Ok(Config {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,

            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),

            db_max_connections: match env::var("DB_MAX_CONNECTIONS") {
                Ok(raw) => raw
                    .parse()
                    .with_context(|| format!("DB_MAX_CONNECTIONS is not a number: {}", raw))?,
                Err(_) => 5,
            },

            session_secret: env::var("SESSION_SECRET").context("SESSION_SECRET must be set")?,

            session_issuers: parse_list(
                &env::var("SESSION_ISSUERS").unwrap_or_else(|_| "residency-logbook".to_string()),
            ),

            webhook_secret: env::var("WEBHOOK_SECRET").context("WEBHOOK_SECRET must be set")?,

            apply_schema: env::var("APPLY_SCHEMA")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),
        })
    }
}

/// Comma separated, blanks dropped.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_flag(raw: &str) -> bool {
    !matches!(raw.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off")
}

use anyhow::{Context, Result};
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: Option<String>,
    pub db_max_connections: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok(); // Load .env if present

        Ok(Config {
            database_url: env::var("DATABASE_URL").ok(),

            db_max_connections: match env::var("DB_MAX_CONNECTIONS") {
                Ok(raw) => raw
                    .parse()
                    .with_context(|| format!("DB_MAX_CONNECTIONS is not a number: {}", raw))?,
                Err(_) => 5,
            },
        })
    }

    /// Only commands that touch the database require `DATABASE_URL`.
    pub async fn connect(&self) -> Result<PgPool> {
        let url = self
            .database_url
            .as_deref()
            .context("DATABASE_URL must be set")?;
        PgPoolOptions::new()
            .max_connections(self.db_max_connections)
            .connect(url)
            .await
            .context("Failed to connect to DATABASE_URL")
    }
}

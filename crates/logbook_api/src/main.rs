use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use logbook_api::auth::SessionKeys;
use logbook_api::config::Config;
use logbook_api::routes::app_router;
use logbook_api::webhook::WebhookVerifier;
use logbook_api::AppState;
use logbook_db::{rebuild_database, LogbookRepository};
use logbook_service::LogbookService;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // 1. Load config (fails fast if invalid)
    let config = Config::from_env()?;

    // 2. Connect to Postgres
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to DATABASE_URL")?;

    if config.apply_schema {
        let applied = rebuild_database(&pool).await?;
        tracing::info!(files = applied.len(), "schema applied");
    }

    // 3. Wire the service
    let service = LogbookService::new(Arc::new(LogbookRepository::new(pool)));
    let sessions = SessionKeys::new(&config.session_secret, &config.session_issuers);
    let webhook = WebhookVerifier::from_secret(&config.webhook_secret).context("WEBHOOK_SECRET is invalid")?;
    let app = app_router(AppState::new(service, sessions, webhook));

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

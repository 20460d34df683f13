pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod routes;
pub mod webhook;

use std::sync::Arc;

use logbook_service::LogbookService;

use crate::auth::SessionKeys;
use crate::webhook::WebhookVerifier;

#[derive(Clone)]
pub struct AppState {
    pub service: LogbookService,
    pub sessions: Arc<SessionKeys>,
    pub webhook: Arc<WebhookVerifier>,
}

impl AppState {
    pub fn new(service: LogbookService, sessions: SessionKeys, webhook: WebhookVerifier) -> Self {
        Self {
            service,
            sessions: Arc::new(sessions),
            webhook: Arc::new(webhook),
        }
    }
}

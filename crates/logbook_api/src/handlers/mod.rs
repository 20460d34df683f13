pub mod entries;
pub mod review;
pub mod students;
pub mod webhooks;

use axum::Json;
use serde_json::{json, Value};

use logbook_core::catalog::{catalog, KindDescriptor, LogKind};

use crate::error::ApiError;

pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn get_catalog() -> Json<Vec<KindDescriptor>> {
    Json(catalog())
}

/// Unknown kinds answer 404 with the usual JSON body.
pub(crate) fn parse_kind(raw: &str) -> Result<LogKind, ApiError> {
    raw.parse::<LogKind>()
        .map_err(|msg| ApiError(logbook_core::LogbookError::NotFound(msg)))
}

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

use logbook_core::validation::FieldIssue;
use logbook_core::LogbookError;
use logbook_service::{IdentityEvent, IdentityOutcome};

use crate::error::ApiError;
use crate::AppState;

/// Identity provider callbacks. The raw body is verified before parsing.
pub async fn identity(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<IdentityOutcome>, ApiError> {
    if let Err(e) = state.webhook.verify(&headers, &body) {
        tracing::warn!(error = %e, "rejected identity webhook");
        return Err(LogbookError::Unauthorized.into());
    }

    let event: IdentityEvent = serde_json::from_slice(&body).map_err(|e| {
        LogbookError::Validation(vec![FieldIssue::new("body", e.to_string())])
    })?;

    Ok(Json(state.service.apply_identity_event(event).await?))
}

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use logbook_core::models::LogEntry;
use logbook_service::{BulkSignReport, PendingSummary, RejectRequest, SignOutcome};

use crate::auth::Session;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::handlers::parse_kind;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct BulkSignRequest {
    pub ids: Vec<Uuid>,
}

pub async fn sign_entry(
    State(state): State<AppState>,
    Session(ctx): Session,
    ApiPath((kind, id)): ApiPath<(String, Uuid)>,
) -> Result<Json<SignOutcome>, ApiError> {
    let kind = parse_kind(&kind)?;
    Ok(Json(state.service.sign_entry(&ctx, kind, id).await?))
}

pub async fn reject_entry(
    State(state): State<AppState>,
    Session(ctx): Session,
    ApiPath((kind, id)): ApiPath<(String, Uuid)>,
    ApiJson(request): ApiJson<RejectRequest>,
) -> Result<Json<LogEntry>, ApiError> {
    let kind = parse_kind(&kind)?;
    Ok(Json(state.service.reject_entry(&ctx, kind, id, request).await?))
}

pub async fn bulk_sign(
    State(state): State<AppState>,
    Session(ctx): Session,
    ApiPath(kind): ApiPath<String>,
    ApiJson(request): ApiJson<BulkSignRequest>,
) -> Result<Json<BulkSignReport>, ApiError> {
    let kind = parse_kind(&kind)?;
    Ok(Json(state.service.bulk_sign(&ctx, kind, &request.ids).await?))
}

pub async fn pending(
    State(state): State<AppState>,
    Session(ctx): Session,
) -> Result<Json<PendingSummary>, ApiError> {
    Ok(Json(state.service.pending_counts(&ctx).await?))
}

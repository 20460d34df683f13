use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use logbook_core::models::{EntryUpdate, LogEntry, NewEntry};
use logbook_service::ListQuery;

use crate::auth::Session;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::handlers::parse_kind;
use crate::AppState;

pub async fn list_entries(
    State(state): State<AppState>,
    Session(ctx): Session,
    ApiPath(kind): ApiPath<String>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<Vec<LogEntry>>, ApiError> {
    let kind = parse_kind(&kind)?;
    Ok(Json(state.service.list_entries(&ctx, kind, query).await?))
}

pub async fn create_entry(
    State(state): State<AppState>,
    Session(ctx): Session,
    ApiPath(kind): ApiPath<String>,
    ApiJson(input): ApiJson<NewEntry>,
) -> Result<(StatusCode, Json<LogEntry>), ApiError> {
    let kind = parse_kind(&kind)?;
    let entry = state.service.create_entry(&ctx, kind, input).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn get_entry(
    State(state): State<AppState>,
    Session(ctx): Session,
    ApiPath((kind, id)): ApiPath<(String, Uuid)>,
) -> Result<Json<LogEntry>, ApiError> {
    let kind = parse_kind(&kind)?;
    Ok(Json(state.service.get_entry(&ctx, kind, id).await?))
}

pub async fn update_entry(
    State(state): State<AppState>,
    Session(ctx): Session,
    ApiPath((kind, id)): ApiPath<(String, Uuid)>,
    ApiJson(update): ApiJson<EntryUpdate>,
) -> Result<Json<LogEntry>, ApiError> {
    let kind = parse_kind(&kind)?;
    Ok(Json(state.service.update_entry(&ctx, kind, id, update).await?))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Session(ctx): Session,
    ApiPath((kind, id)): ApiPath<(String, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let kind = parse_kind(&kind)?;
    state.service.delete_entry(&ctx, kind, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn submit_entry(
    State(state): State<AppState>,
    Session(ctx): Session,
    ApiPath((kind, id)): ApiPath<(String, Uuid)>,
) -> Result<Json<LogEntry>, ApiError> {
    let kind = parse_kind(&kind)?;
    Ok(Json(state.service.submit_entry(&ctx, kind, id).await?))
}

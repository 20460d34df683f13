use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::IntoResponse;
use axum::Json;

use logbook_core::models::UserId;
use logbook_service::StudentProgress;

use crate::auth::Session;
use crate::error::ApiError;
use crate::extract::ApiPath;
use crate::AppState;

pub async fn progress(
    State(state): State<AppState>,
    Session(ctx): Session,
    ApiPath(student_id): ApiPath<String>,
) -> Result<Json<StudentProgress>, ApiError> {
    let student_id = UserId::new(student_id);
    Ok(Json(state.service.student_progress(&ctx, &student_id).await?))
}

pub async fn logbook_csv(
    State(state): State<AppState>,
    Session(ctx): Session,
    ApiPath(student_id): ApiPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    let student_id = UserId::new(student_id);
    let csv = state.service.logbook_csv(&ctx, &student_id).await?;
    let disposition = format!(
        "attachment; filename=\"logbook-{}.csv\"",
        filename_safe(student_id.as_str())
    );
    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}

/// Keeps `[A-Za-z0-9_-]` so the id cannot break out of the quoted filename.
fn filename_safe(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        "student".to_string()
    } else {
        cleaned
    }
}

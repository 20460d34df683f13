use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use logbook_core::LogbookError;

/// HTTP face of [`LogbookError`]. Every handler returns this on failure.
#[derive(Debug)]
pub struct ApiError(pub LogbookError);

impl From<LogbookError> for ApiError {
    fn from(e: LogbookError) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            LogbookError::Unauthorized => StatusCode::UNAUTHORIZED,
            LogbookError::Forbidden(_) => StatusCode::FORBIDDEN,
            LogbookError::NotFound(_) => StatusCode::NOT_FOUND,
            LogbookError::Validation(_) => StatusCode::BAD_REQUEST,
            LogbookError::Conflict(_) => StatusCode::CONFLICT,
            LogbookError::Database(_) | LogbookError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self.0 {
            LogbookError::Validation(issues) => json!({
                "error": "Validation failed",
                "issues": issues,
            }),
            LogbookError::Database(_) | LogbookError::Internal(_) => {
                tracing::error!(error = %self.0, "request failed");
                json!({ "error": "Internal server error" })
            }
            other => json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

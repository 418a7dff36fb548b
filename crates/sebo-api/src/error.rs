use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

/// The full error surface of the API. Every handler failure is one of
/// these; store and library errors are translated locally and only a
/// static message ever reaches the client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(&'static str),
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(&'static str),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, *m),
            ApiError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, *m),
            ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, *m),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, *m),
            ApiError::Conflict(m) => (StatusCode::CONFLICT, *m),
            ApiError::Internal(e) => {
                // Detail goes to the server log, never to the client.
                error!("internal error: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

// Malformed or untyped JSON bodies surface as 400, not axum's default 422.
impl From<JsonRejection> for ApiError {
    fn from(_: JsonRejection) -> Self {
        ApiError::BadRequest("malformed request body")
    }
}

//! Error types for the HTTP API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use database::DatabaseError;
use habit_engine::EngineError;
use thiserror::Error;
use tracing::{error, warn};

/// Errors returned by handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Missing X-User-Id header")]
    MissingUser,

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        ApiError::Engine(err.into())
    }
}

impl ApiError {
    /// HTTP status and machine-readable code.
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Engine(err) => match err {
                EngineError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
                EngineError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
                EngineError::AlreadyExists { .. } => (StatusCode::CONFLICT, "already_exists"),
                EngineError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
                EngineError::Feed(_) | EngineError::Database(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
                }
            },
            ApiError::Unauthorized | ApiError::MissingUser => (StatusCode::UNAUTHORIZED, "auth_error"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status();

        let message = if status.is_server_error() {
            error!("Request failed: {}", self);
            "Internal server error".to_string()
        } else {
            warn!(code, "Request rejected: {}", self);
            self.to_string()
        };

        let body = serde_json::json!({
            "error": {
                "message": message,
                "code": code
            }
        });

        (status, Json(body)).into_response()
    }
}

/// Result type for handlers.
pub type Result<T> = std::result::Result<T, ApiError>;

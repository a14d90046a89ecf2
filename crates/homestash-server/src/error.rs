use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use homestash_store::StoreError;

/// Request-level errors, mapped onto the HTTP surface.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required field is missing or malformed.
    #[error("{0}")]
    InvalidInput(String),

    /// Missing, malformed, expired, or otherwise invalid credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// The referenced entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// A uniqueness rule was violated, or a deletion is blocked by existing
    /// references.
    #[error("{0}")]
    Conflict(String),

    /// Unexpected failure.  The detail is logged server-side and never
    /// reaches the client.
    #[error("Internal server error")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(detail) => {
                tracing::error!(detail = %detail, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => ApiError::NotFound("Record not found".to_string()),
            StoreError::Constraint(detail) => {
                // The store message may name tables and columns; keep that
                // server-side.
                tracing::debug!(detail = %detail, "constraint violation");
                ApiError::Conflict("Conflicts with existing data".to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

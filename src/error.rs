use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// ApiError
///
/// Every failure a handler can produce. Each variant maps to exactly one HTTP status
/// and is rendered as `{"message": "..."}` at the request boundary.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed or missing input: bad JSON, failed field validation, bad id or pagination.
    #[error("{0}")]
    Validation(String),

    /// Missing/invalid token or bad credentials.
    #[error("{0}")]
    Unauthenticated(String),

    /// The requester is known but lacks the role or ownership for this action.
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// Duplicate email or title, surfaced from the database unique constraints.
    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn invalid_id() -> Self {
        ApiError::Validation("Invalid ID. Please enter a valid ID".to_string())
    }

    pub fn unauthorized_access() -> Self {
        ApiError::Forbidden("Unauthorized access".to_string())
    }

    pub fn bad_credentials() -> Self {
        ApiError::Unauthenticated("Incorrect email or password".to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// MessageResponse
///
/// The body of every error response and of the bodiless successes (e.g. deletes).
#[derive(Debug, Clone, Serialize, serde::Deserialize, ToSchema, ts_rs::TS)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Database(e) => {
                tracing::error!("database error: {:?}", e);
                "An internal error occurred".to_string()
            }
            ApiError::Internal(msg) => {
                tracing::error!("internal error: {}", msg);
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(MessageResponse { message })).into_response()
    }
}

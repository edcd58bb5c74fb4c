use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::shared::types::ApiResponse;

/// Error taxonomy for the intake and staging pipeline.
///
/// `Unauthorized` deliberately carries no detail about *why* a credential
/// failed; unknown client, inactive client and bad secret are
/// indistinguishable to the caller. `Storage` is the only transient,
/// retryable variant; `Structural` and `LoadFailure` describe defective
/// input or a failed staging commit and map onto terminal file statuses.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Policy violation: {0}")]
    PolicyViolation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Structural error: {0}")]
    Structural(String),

    #[error("Load failure: {0}")]
    LoadFailure(String),
}

impl AppError {
    /// Transient errors may be retried by the actor that raised them.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Storage(_) | AppError::Database(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error occurred".to_string(),
                    None,
                )
            }
            AppError::NotFound(ref msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            AppError::Validation(ref msg) => (
                StatusCode::BAD_REQUEST,
                msg.clone(),
                Some(vec![msg.clone()]),
            ),
            AppError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
            AppError::Unauthorized(ref msg) => (StatusCode::UNAUTHORIZED, msg.clone(), None),
            AppError::PolicyViolation(ref msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                msg.clone(),
                Some(vec![msg.clone()]),
            ),
            AppError::Storage(ref msg) => {
                tracing::error!("Storage error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "Storage error occurred".to_string(),
                    None,
                )
            }
            AppError::Structural(ref msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone(), None),
            AppError::LoadFailure(ref msg) => {
                tracing::error!("Load failure: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone(), None)
            }
        };

        let body = Json(ApiResponse::<()>::error(Some(message), errors));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_are_retryable() {
        assert!(AppError::Storage("timeout".into()).is_retryable());
        assert!(!AppError::Structural("bad csv".into()).is_retryable());
        assert!(!AppError::PolicyViolation("too large".into()).is_retryable());
        assert!(!AppError::Unauthorized("invalid client credentials".into()).is_retryable());
    }
}

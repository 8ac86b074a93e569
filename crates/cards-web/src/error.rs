//! Error types for the cards web interface.

use alerting::AlertingError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use database::DatabaseError;
use thiserror::Error;

/// Errors that can occur while serving a request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Lifecycle or pipeline error.
    #[error(transparent)]
    Alerting(#[from] AlertingError),

    /// Database error.
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// Malformed request.
    #[error("{0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Alerting(err) => match err {
                AlertingError::CardNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
                AlertingError::AlreadyReceived(_)
                | AlertingError::NotReceived(_)
                | AlertingError::AlreadyAttached(_) => (StatusCode::BAD_REQUEST, err.to_string()),
                AlertingError::Storage(_) | AlertingError::Dispatch(_) => {
                    tracing::error!("Request failed: {}", err);
                    (StatusCode::BAD_REQUEST, "Error while processing request".to_string())
                }
            },
            ApiError::Database(err) => match err {
                DatabaseError::NotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
                DatabaseError::AlreadyExists { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
                _ => {
                    tracing::error!("Database error: {}", err);
                    (StatusCode::BAD_REQUEST, "Error while processing request".to_string())
                }
            },
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        };

        let body = serde_json::json!({
            "message": message
        });

        (status, Json(body)).into_response()
    }
}

/// Result type for request handlers.
pub type Result<T> = std::result::Result<T, ApiError>;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Error types for service-record operations
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Service type not found")]
    ServiceTypeNotFound,

    #[error("Service record not found")]
    NotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<sqlx::Error> for RecordError {
    fn from(err: sqlx::Error) -> Self {
        RecordError::DatabaseError(err.to_string())
    }
}

impl IntoResponse for RecordError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            RecordError::DatabaseError(msg) => {
                tracing::error!("Record database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            RecordError::ServiceTypeNotFound => (
                StatusCode::NOT_FOUND,
                "Service type not found".to_string(),
            ),
            RecordError::NotFound => (
                StatusCode::NOT_FOUND,
                "Service record not found".to_string(),
            ),
            RecordError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

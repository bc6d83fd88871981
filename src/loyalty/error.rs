use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Error types for loyalty ledger operations
#[derive(Debug, thiserror::Error)]
pub enum LoyaltyError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Service type not found")]
    ServiceTypeNotFound,

    #[error("Loyalty account not found")]
    AccountNotFound,

    #[error("Insufficient balance: {available} points available, {requested} requested")]
    InsufficientBalance { available: i32, requested: i32 },

    #[error("Concurrent update conflict")]
    ConcurrencyConflict,

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<sqlx::Error> for LoyaltyError {
    fn from(err: sqlx::Error) -> Self {
        // SQLSTATE 40001 (serialization_failure) and 40P01 (deadlock_detected)
        // are transient: the orchestrator retries them before surfacing
        if let Some(code) = err.as_database_error().and_then(|db_err| db_err.code()) {
            if code == "40001" || code == "40P01" {
                return LoyaltyError::ConcurrencyConflict;
            }
        }
        LoyaltyError::DatabaseError(err.to_string())
    }
}

impl IntoResponse for LoyaltyError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            LoyaltyError::DatabaseError(msg) => {
                tracing::error!("Loyalty database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "A database error occurred" }),
                )
            }
            LoyaltyError::ServiceTypeNotFound => (
                StatusCode::NOT_FOUND,
                json!({ "error": "Service type not found" }),
            ),
            LoyaltyError::AccountNotFound => (
                StatusCode::NOT_FOUND,
                json!({ "error": "Loyalty account not found" }),
            ),
            LoyaltyError::InsufficientBalance {
                available,
                requested,
            } => (
                StatusCode::BAD_REQUEST,
                // The available balance is included so staff can show it
                json!({
                    "error": format!(
                        "Insufficient balance: {} points available, {} requested",
                        available, requested
                    ),
                    "available": available,
                }),
            ),
            LoyaltyError::ConcurrencyConflict => (
                StatusCode::CONFLICT,
                json!({ "error": "The account was updated concurrently, please retry" }),
            ),
            LoyaltyError::ValidationError(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlx_error_maps_to_database_error() {
        let err: LoyaltyError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, LoyaltyError::DatabaseError(_)));
    }

    #[test]
    fn test_insufficient_balance_message_carries_amounts() {
        let err = LoyaltyError::InsufficientBalance {
            available: 10,
            requested: 25,
        };
        let message = err.to_string();
        assert!(message.contains("10"));
        assert!(message.contains("25"));
    }
}

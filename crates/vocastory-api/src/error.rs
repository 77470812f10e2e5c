//! Vocastory: API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use vocastory_core::error::DomainError;

/// Startup errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The tracing pipeline could not be installed.
    #[error("telemetry error: {0}")]
    Telemetry(String),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer error that implements `IntoResponse`.
#[derive(Debug)]
pub enum ApiError {
    /// A typed outcome from a command or query handler.
    Domain(DomainError),
    /// The request carried no usable user identity.
    Unauthenticated(String),
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            Self::Unauthenticated(message) => {
                (StatusCode::UNAUTHORIZED, "unauthenticated", message)
            }
            Self::Domain(err) => {
                let (status, code) = match &err {
                    DomainError::AggregateNotFound(_) => {
                        (StatusCode::NOT_FOUND, "aggregate_not_found")
                    }
                    DomainError::EntityNotFound { .. } => {
                        (StatusCode::NOT_FOUND, "entity_not_found")
                    }
                    DomainError::InvalidState(_) => (StatusCode::CONFLICT, "invalid_state"),
                    DomainError::ConcurrencyConflict { .. } => {
                        (StatusCode::CONFLICT, "concurrency_conflict")
                    }
                    DomainError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
                    DomainError::Infrastructure(_) => {
                        error!(error = %err, "request failed");
                        (StatusCode::INTERNAL_SERVER_ERROR, "infrastructure_error")
                    }
                };
                (status, code, err.to_string())
            }
        };

        let body = ErrorBody {
            error: error_code,
            message,
        };

        (status, Json(body)).into_response()
    }
}

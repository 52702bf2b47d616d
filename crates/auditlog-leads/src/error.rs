//! Lead service error types.

use auditlog_capture::error::{ConfigError, DeliveryError};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Startup errors for the lead service.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Audit dispatcher configuration is missing or invalid.
    #[error(transparent)]
    Dispatcher(#[from] ConfigError),

    /// The audit delivery client could not be built.
    #[error("audit delivery setup failed: {0}")]
    Delivery(#[from] DeliveryError),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// Request-level errors returned by the lead routes.
#[derive(Debug, Error)]
pub enum LeadError {
    /// No lead has the identifier.
    #[error("lead not found: {0}")]
    NotFound(String),

    /// The request body is invalid.
    #[error("validation error: {0}")]
    Validation(String),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Always `false`.
    pub success: bool,
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

impl IntoResponse for LeadError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
        };

        let body = ErrorBody {
            success: false,
            error: error_code,
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let response = LeadError::NotFound("L1".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_validation_maps_to_400() {
        let response = LeadError::Validation("name must not be empty".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

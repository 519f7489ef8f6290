//! # Plan Errors
//!
//! Error types for validating and compiling a query specification.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Result type for plan operations
pub type PlanResult<T> = Result<T, PlanError>;

/// Query plan errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    // ==================
    // Request Errors
    // ==================
    /// The raw URL could not be parsed
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// A filter key is not in the filter allow-list
    #[error("invalid filter key {0}, filters contains an invalid filter")]
    InvalidFilter(String),

    /// A sort name is not in the sort allow-list
    #[error("invalid sort key {0}, sorts contains an invalid sort")]
    InvalidSort(String),

    // ==================
    // Server Errors
    // ==================
    /// An allow-list or adapter configuration is malformed
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A filter or sort operation failed while being applied
    #[error("Operation failed: {0}")]
    Operation(String),
}

impl PlanError {
    /// Create an operation error from any message
    pub fn operation(message: impl Into<String>) -> Self {
        PlanError::Operation(message.into())
    }

    /// Create a configuration error from any message
    pub fn configuration(message: impl Into<String>) -> Self {
        PlanError::Configuration(message.into())
    }

    /// Whether the caller's request is at fault
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            PlanError::Url(_) => StatusCode::BAD_REQUEST,
            PlanError::InvalidFilter(_) => StatusCode::BAD_REQUEST,
            PlanError::InvalidSort(_) => StatusCode::BAD_REQUEST,

            // 500 Internal Server Error
            PlanError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PlanError::Operation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl From<PlanError> for ErrorResponse {
    fn from(err: PlanError) -> Self {
        Self {
            code: err.status_code().as_u16(),
            error: err.to_string(),
        }
    }
}

impl IntoResponse for PlanError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse::from(self));
        (status, body).into_response()
    }
}

//! API Error Types
//!
//! Defines error types for the API layer and implements conversion
//! to HTTP responses with appropriate status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::ledger::LedgerError;

/// Header carrying the caller identity on write requests
pub const IDENTITY_HEADER: &str = "x-ledger-identity";

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Write request without an identity header
    #[error("Missing x-ledger-identity header")]
    MissingIdentity,

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Ledger operation failed
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    pub request_id: String,
}

/// Error details
#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::MissingIdentity => (StatusCode::UNAUTHORIZED, "MISSING_IDENTITY"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Ledger(e) => match e {
                LedgerError::Unauthorized { .. } => (StatusCode::FORBIDDEN, "UNAUTHORIZED"),
                LedgerError::OutOfBounds { .. } => (StatusCode::NOT_FOUND, "OUT_OF_BOUNDS"),
                LedgerError::InvalidRange { .. } => (StatusCode::BAD_REQUEST, "INVALID_RANGE"),
                LedgerError::NoData => (StatusCode::UNPROCESSABLE_ENTITY, "NO_DATA"),
                LedgerError::UnknownVariant { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                LedgerError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
                LedgerError::Lock(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            },
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let request_id = uuid::Uuid::new_v4().to_string();

        if status.is_server_error() {
            tracing::error!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "API error occurred"
            );
        } else {
            tracing::debug!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "Request rejected"
            );
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: self.to_string(),
            },
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

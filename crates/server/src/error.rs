//! API error types.

use crate::metrics::record_request_error;
use assay_metadata::MetadataError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Metadata(#[from] MetadataError),

    #[error("{0}")]
    Core(#[from] assay_core::Error),
}

impl ApiError {
    /// Get the error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::Unavailable(_) => "unavailable",
            Self::Internal(_) => "internal_error",
            Self::Metadata(e) => match e {
                MetadataError::NotFound(_) => "not_found",
                MetadataError::Validation(_) => "validation_error",
                MetadataError::Reference(_) => "reference_error",
                MetadataError::Constraint(_) => "constraint_violation",
                _ => "internal_error",
            },
            Self::Core(e) => {
                if e.is_validation() {
                    "validation_error"
                } else {
                    "constraint_violation"
                }
            }
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Metadata(e) => match e {
                MetadataError::NotFound(_) => StatusCode::NOT_FOUND,
                MetadataError::Validation(_)
                | MetadataError::Reference(_)
                | MetadataError::Constraint(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Core(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Message safe to return to the caller.
    ///
    /// Infrastructure failures are logged in full and reported generically.
    fn public_message(&self) -> String {
        match self {
            Self::Internal(_) => "internal server error".to_string(),
            Self::Unavailable(_) => "metadata store unavailable".to_string(),
            Self::Metadata(
                MetadataError::Database(_)
                | MetadataError::Config(_)
                | MetadataError::Io(_)
                | MetadataError::Internal(_),
            ) => "internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        record_request_error(code);

        if status.is_server_error() {
            tracing::error!(code = code, error = %self, "request failed");
        } else {
            tracing::debug!(code = code, error = %self, "request rejected");
        }

        let body = ErrorResponse {
            code: code.to_string(),
            message: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

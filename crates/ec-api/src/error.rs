//! API error types and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ec_core::EngineError;

/// API error type.
#[derive(Debug, Error)]
pub enum ApiError {
    /// An engine error, mapped by its kind.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),

    /// Service unavailable (e.g. reload not configured).
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// JSON error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable code for programmatic handling.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Engine(err) => match err {
                EngineError::NoResponses(_) => StatusCode::NOT_FOUND,
                EngineError::UnknownItem(_) => StatusCode::UNPROCESSABLE_ENTITY,
                EngineError::EmptyExam | EngineError::InvalidThreshold(_) => {
                    StatusCode::BAD_REQUEST
                }
                EngineError::NumericInstability(_) | EngineError::InvalidConfig(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Returns the stable error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Engine(err) => err.kind_code(),
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Internal(_) => "INTERNAL_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

//! Axum-specific error types and mappings.
//!
//! Errors that surface as HTTP status codes live here; benign
//! outcomes (start while running, reset while busy) are reported in
//! 200-level `{success, message}` bodies by the handlers instead.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;

/// Axum-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Credential missing, malformed, expired or tampered.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request (invalid input).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    status: u16,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            HttpError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            HttpError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            HttpError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = ErrorBody {
            error: message,
            status: status.as_u16(),
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<AuthError> for HttpError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Signing => HttpError::Internal(err.to_string()),
            other => HttpError::Unauthorized(other.to_string()),
        }
    }
}

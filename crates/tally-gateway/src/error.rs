//! Gateway error types and Axum response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::supervisor::SupervisorError;

/// Request-level errors with HTTP status code mapping.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The caller's input was invalid.
    #[error("{0}")]
    BadRequest(String),

    /// The worker answered with an error envelope.
    #[error("{0}")]
    Worker(String),

    /// The worker could not be reached or gave a malformed answer.
    #[error("{0}")]
    Unavailable(String),

    /// The worker did not answer (or start) in time.
    #[error("{0}")]
    Timeout(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            GatewayError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            GatewayError::Worker(m) => (StatusCode::INTERNAL_SERVER_ERROR, m),
            GatewayError::Unavailable(m) => (StatusCode::INTERNAL_SERVER_ERROR, m),
            GatewayError::Timeout(m) => (StatusCode::GATEWAY_TIMEOUT, m),
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<SupervisorError> for GatewayError {
    fn from(e: SupervisorError) -> Self {
        match e {
            SupervisorError::StartTimeout(_) => GatewayError::Timeout(e.to_string()),
            _ => GatewayError::Unavailable(e.to_string()),
        }
    }
}

//! Error types for the ban probe service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Request-scoped probe errors. None of these are fatal to the process.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Send {{ number: \"+6281234...\" }} in request body")]
    NumberRequired,

    #[error("Number must be digits with country code (E.164 recommended): {0}")]
    InvalidNumber(String),

    #[error("Too many requests (limit {limit}/min)")]
    RateLimited { limit: u32 },

    #[error("Upstream unreachable after {attempts} attempts: {message}")]
    Network { attempts: u32, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failures of a single transport call. Every variant is transient.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("upstream call timed out")]
    Timeout,

    #[error("upstream request failed: {0}")]
    Request(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ProbeError {
    /// Stable machine-readable code for the wire.
    pub fn code(&self) -> &'static str {
        match self {
            ProbeError::MethodNotAllowed => "method_not_allowed",
            ProbeError::NumberRequired => "number_required",
            ProbeError::InvalidNumber(_) => "invalid_number",
            ProbeError::RateLimited { .. } => "rate_limited",
            ProbeError::Network { .. } => "proxy_or_network_failed",
            ProbeError::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ProbeError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ProbeError::NumberRequired | ProbeError::InvalidNumber(_) => StatusCode::BAD_REQUEST,
            ProbeError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ProbeError::Network { .. } => StatusCode::BAD_GATEWAY,
            ProbeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProbeError {
    fn into_response(self) -> Response {
        let status = self.status();

        let details = match &self {
            ProbeError::Network { attempts, message } => Some(serde_json::json!({
                "error": "network_error",
                "message": message,
                "attempts": attempts,
            })),
            _ => None,
        };

        let body = ErrorResponse {
            error: self.code().to_string(),
            message: self.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Request(e.to_string())
        }
    }
}

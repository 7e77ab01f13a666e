// ABOUTME: Gateway error taxonomy and its mapping to HTTP status codes
// ABOUTME: Every failure is classified once and never retried internally

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Gateway error type. Each variant maps to exactly one response status;
/// internal detail stays in the logs, not in the client-facing message.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Structurally invalid request path or payload
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Key prefix not on the allow-list
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Upload body exceeds the configured cap
    #[error("payload too large: {0}")]
    TooLarge(String),
    /// Object absent from the backing store
    #[error("not found: {0}")]
    NotFound(String),
    /// Storage unreachable during a read; caller may retry with backoff
    #[error("storage read failed: {0}")]
    Storage(String),
    /// Storage unreachable during a write; caller owns retry policy
    #[error("storage write failed: {0}")]
    Upstream(String),
    /// Anything uncaught
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::Forbidden(_) => StatusCode::FORBIDDEN,
            GatewayError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Storage(_) | GatewayError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            GatewayError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Client-facing message. Storage and internal failures are collapsed
    /// to a generic line so backend detail never leaks.
    pub fn message(&self) -> String {
        match self {
            GatewayError::Storage(_) | GatewayError::Upstream(_) | GatewayError::Internal(_) => {
                "internal error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        if self.status_code().is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (
            self.status_code(),
            Json(serde_json::json!({ "error": self.message() })),
        )
            .into_response()
    }
}

//! Error taxonomy for the client pipeline.
//!
//! Every failure that leaves the HTTP client boundary is one of these
//! variants. Transport failures (no response at all) are kept distinct
//! from HTTP-status failures, which are kept distinct from logical
//! failures reported inside a 200 envelope.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single client-side validation failure for one form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Name of the offending field.
    pub field: String,

    /// Human-readable message for that field.
    pub message: String,
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Errors produced by the client pipeline.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// No response was received from the server.
    #[error("network error: {0}")]
    Network(String),

    /// The per-request deadline elapsed before a response arrived.
    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    /// The session is expired or invalid and could not be refreshed.
    #[error("session expired, sign in again")]
    Auth,

    /// The server rejected the request with 403.
    #[error("you do not have permission to perform this action")]
    Permission,

    /// The server rejected the request with 404.
    #[error("resource not found: {resource}")]
    NotFound { resource: String },

    /// Any other 4xx/5xx status, with a canned or server-supplied message.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The transport succeeded but the envelope carried a non-success code.
    #[error("{message}")]
    Business { code: i64, message: String },

    /// Client-side validation rejected the form before submission.
    #[error("validation failed for {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    /// The response body did not match the expected envelope or payload.
    #[error("unexpected response body: {0}")]
    Decode(String),

    /// Reading or writing the persisted session failed.
    #[error("session storage error: {0}")]
    Storage(String),
}

/// Result type for client pipeline operations.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// True when the failure happened before any response arrived.
    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::Timeout(_))
    }
}

/// Canned user-facing message for a status the server explained no further.
pub(crate) fn status_message(status: u16) -> &'static str {
    match status {
        400 => "the request was invalid",
        401 => "authentication required",
        403 => "you do not have permission to perform this action",
        404 => "the requested resource was not found",
        408 => "the server took too long to respond",
        409 => "the request conflicts with the current state",
        422 => "the submitted data could not be processed",
        429 => "too many requests, slow down",
        500 => "the server encountered an internal error",
        502 => "the server is temporarily unreachable",
        503 => "the service is temporarily unavailable",
        504 => "the server took too long to respond",
        _ => "the request failed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiError::Timeout(10);
        assert_eq!(err.to_string(), "request timed out after 10 seconds");

        let err = ApiError::Business {
            code: 4001,
            message: "insufficient balance".to_string(),
        };
        assert_eq!(err.to_string(), "insufficient balance");

        let err = ApiError::NotFound {
            resource: "/orders/42".to_string(),
        };
        assert!(err.to_string().contains("/orders/42"));
    }

    #[test]
    fn test_network_classification() {
        assert!(ApiError::Network("connection refused".into()).is_network());
        assert!(ApiError::Timeout(10).is_network());
        assert!(!ApiError::Auth.is_network());
        assert!(!ApiError::Http {
            status: 500,
            message: "boom".into()
        }
        .is_network());
    }

    #[test]
    fn test_canned_messages() {
        assert_eq!(status_message(403), "you do not have permission to perform this action");
        assert_eq!(status_message(418), "the request failed");
    }
}

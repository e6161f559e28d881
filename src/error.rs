//! Error taxonomy for calls against the OKR backend
//!
//! Transient failures (network unreachable, timeout) are the only ones the
//! retry combinator acts on; HTTP error statuses and request construction
//! problems surface to the caller immediately.

use thiserror::Error;

/// Failure of a single backend operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Backend could not be reached (DNS, refused connection, reset, broken body)
    #[error("Network unreachable: {0}")]
    NetworkUnreachable(String),

    /// Request exceeded the configured timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Backend answered with a 4xx/5xx status
    #[error("HTTP {code}: {body}")]
    HttpStatus {
        /// Status code returned by the backend
        code: u16,
        /// Raw response body, kept for display
        body: String,
    },

    /// Request could not be built (bad URL, bad header, wrong payload shape)
    #[error("Malformed request: {0}")]
    MalformedRequest(String),
}

impl ApiError {
    /// True for failures worth another attempt
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::NetworkUnreachable(_) | ApiError::Timeout(_))
    }

    /// Status code for `HttpStatus`, `None` otherwise
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::HttpStatus { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            ApiError::MalformedRequest(err.to_string())
        } else if err.is_timeout() {
            ApiError::Timeout(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::HttpStatus {
                code: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            ApiError::NetworkUnreachable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::MalformedRequest(format!("payload serialization failed: {err}"))
    }
}

/// Result alias for backend operations
pub type Result<T> = std::result::Result<T, ApiError>;

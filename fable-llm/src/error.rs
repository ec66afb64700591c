//! Backend error types.
//!
//! These errors never cross the adapter boundary — [`crate::adapter`]
//! converts every one of them into a documented fallback value.

use thiserror::Error;

/// Errors that can occur while talking to the generative backend.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP request failed.
    #[error("backend request failed: {0}")]
    RequestFailed(String),

    /// Response was not valid JSON or did not match the expected shape.
    #[error("failed to parse backend response: {0}")]
    ParseError(String),

    /// Request timed out.
    #[error("backend request timed out after {0}ms")]
    Timeout(u64),

    /// No backend is configured or the endpoint is unreachable.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// Configuration error (bad provider name, missing API key).
    #[error("backend configuration error: {0}")]
    ConfigError(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout(0)
        } else if err.is_connect() {
            LlmError::Unavailable(err.to_string())
        } else {
            LlmError::RequestFailed(err.to_string())
        }
    }
}

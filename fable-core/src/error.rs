//! Error types for the Fable core library.
//!
//! Expected-absence lookups (unknown character, unmatched location name)
//! return `Option`/`bool` rather than errors; this type covers the cases
//! that genuinely fail — configuration and I/O.

use thiserror::Error;

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, CoreError>;

//! Engine error types.

use thiserror::Error;

/// Errors surfaced by the turn engine and its persistence layer.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("core error: {0}")]
    Core(#[from] fable_core::CoreError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session error: {0}")]
    Session(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

//! Common error types for turnplay

use thiserror::Error;

/// Common result type for turnplay operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across turnplay crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON payload (wraps serde_json::Error)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transcription collaborator reported a failure instead of turns
    #[error("Transcription failed: {0}")]
    Transcription(String),
}

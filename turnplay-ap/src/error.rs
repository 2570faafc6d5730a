//! Error types for turnplay-ap
//!
//! Core playback operations never fail; a segment that cannot be loaded is
//! skipped by the sequencer. Errors only arise while setting a session up.

use thiserror::Error;

/// Main error type for turnplay-ap
#[derive(Error, Debug)]
pub enum Error {
    /// No segments to play; the caller should hide the playback UI
    #[error("No segments to play")]
    EmptyInput,

    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Audio probing errors
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Console command could not be parsed
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// No async runtime available to drive audio resources
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Playback engine task is no longer running
    #[error("Playback engine stopped")]
    EngineStopped,
}

/// Convenience Result type using turnplay-ap Error
pub type Result<T> = std::result::Result<T, Error>;

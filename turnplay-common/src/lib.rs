//! # turnplay Common Library
//!
//! Shared code for the turnplay crates including:
//! - Event types (PlayerEvent enum) and the EventBus
//! - Transcription API types (turn descriptors)
//! - Configuration loading and root folder resolution
//! - Timestamp utilities

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod time;

pub use error::{Error, Result};

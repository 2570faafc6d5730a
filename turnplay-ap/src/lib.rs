//! # turnplay Audio Player Library (turnplay-ap)
//!
//! Plays the per-turn clips of a diarized transcript as one continuous
//! recording: one global timeline, one play/pause control, one seek bar,
//! automatic advance from clip to clip and active-turn notifications.
//!
//! **Architecture:** a single-threaded, event-driven sequencer drives exactly
//! one audio resource at a time through a [`playback::PlaybackSlot`]. Resource
//! events are stamped with a bind generation so that events from superseded
//! resources are discarded.

pub mod audio;
pub mod config;
pub mod control;
pub mod error;
pub mod playback;

pub use error::{Error, Result};
pub use playback::{PlaybackEngine, Sequencer, SequencerState};

//! Types exchanged with the upload/transcription collaborator
//!
//! The transcription service answers an upload with an ordered list of speaker
//! turns, each pointing at its own audio clip. Only the ordering and the
//! `audio_path` of each turn matter for playback; the rest is carried through
//! for presentation.

pub mod types;

pub use types::{parse_transcription, TranscriptionResponse, TurnDescriptor, TurnMethod};

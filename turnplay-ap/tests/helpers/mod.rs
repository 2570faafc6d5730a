//! Test helpers for turnplay-ap integration tests
//!
//! - MockBackend: records every slot operation, never produces events itself
//! - Audio generator: deterministic WAV clips for clock backend tests
//! - Event helpers: drain the EventBus and pick out event kinds

#![allow(dead_code)]

pub mod audio_generator;
pub mod mock_backend;

pub use audio_generator::{generate_sine_wav, write_transcript_clips};
pub use mock_backend::{MockBackend, MockCall};

use tokio::sync::broadcast;
use turnplay_common::api::{TurnDescriptor, TurnMethod};
use turnplay_common::events::{PlaybackIntent, PlayerEvent};

/// Turn descriptor with the given audio path
pub fn turn(audio_path: &str) -> TurnDescriptor {
    TurnDescriptor {
        speaker: "SPEAKER_00".to_string(),
        text: format!("text for {}", audio_path),
        audio_path: audio_path.to_string(),
        method: TurnMethod::Diarization,
    }
}

pub fn turns(audio_paths: &[&str]) -> Vec<TurnDescriptor> {
    audio_paths.iter().map(|p| turn(p)).collect()
}

/// Everything currently buffered on a subscriber
pub fn drain(rx: &mut broadcast::Receiver<PlayerEvent>) -> Vec<PlayerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn active_changes(events: &[PlayerEvent]) -> Vec<Option<usize>> {
    events
        .iter()
        .filter_map(|e| match e {
            PlayerEvent::ActiveSegmentChanged { index, .. } => Some(*index),
            _ => None,
        })
        .collect()
}

pub fn intent_changes(events: &[PlayerEvent]) -> Vec<PlaybackIntent> {
    events
        .iter()
        .filter_map(|e| match e {
            PlayerEvent::PlaybackStateChanged { new_state, .. } => Some(*new_state),
            _ => None,
        })
        .collect()
}

pub fn progress_ratios(events: &[PlayerEvent]) -> Vec<f64> {
    events
        .iter()
        .filter_map(|e| match e {
            PlayerEvent::PlaybackProgress { ratio, .. } => Some(*ratio),
            _ => None,
        })
        .collect()
}

//! Playback session state

use turnplay_common::events::PlaybackIntent;
use uuid::Uuid;

/// Sequencer lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SequencerState {
    /// No segments loaded
    #[default]
    Idle,
    /// Segments loaded, nothing bound yet
    Ready,
    Playing,
    Paused,
    /// Ran past the last segment
    Finished,
}

impl std::fmt::Display for SequencerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SequencerState::Idle => write!(f, "idle"),
            SequencerState::Ready => write!(f, "ready"),
            SequencerState::Playing => write!(f, "playing"),
            SequencerState::Paused => write!(f, "paused"),
            SequencerState::Finished => write!(f, "finished"),
        }
    }
}

/// Per-session playback state
///
/// Recreated on every load; nothing here outlives the transcript it was built for.
#[derive(Debug, Clone)]
pub struct PlaybackState {
    pub session_id: Uuid,
    /// Segment bound to the global slot (or last bound, once finished)
    pub active_index: Option<usize>,
    pub intent: PlaybackIntent,
    /// Known durations of the segments before `active_index`
    pub elapsed_before_active: f64,
}

impl PlaybackState {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            active_index: None,
            intent: PlaybackIntent::Stopped,
            elapsed_before_active: 0.0,
        }
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new()
    }
}

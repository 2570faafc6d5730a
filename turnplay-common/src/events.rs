//! Event types for the turnplay event system
//!
//! Provides the outbound notifications consumed by UI collaborators and the
//! EventBus used to broadcast them.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// User-requested playback mode
///
/// Independent of whether a resource is currently loaded: a session can be
/// `Playing` while the next clip is still probing its metadata.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackIntent {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl std::fmt::Display for PlaybackIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackIntent::Stopped => write!(f, "stopped"),
            PlaybackIntent::Playing => write!(f, "playing"),
            PlaybackIntent::Paused => write!(f, "paused"),
        }
    }
}

/// The three values a UI needs to render the global player
///
/// Play/pause icon from `playback_intent`, progress bar from `progress_ratio`
/// (scale to 0-100 for display), highlight from `active_segment_index`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    /// Global progress in [0, 1]
    pub progress_ratio: f64,
    /// Segment currently bound for global playback
    pub active_segment_index: Option<usize>,
    pub playback_intent: PlaybackIntent,
}

impl Default for PlaybackSnapshot {
    fn default() -> Self {
        Self {
            progress_ratio: 0.0,
            active_segment_index: None,
            playback_intent: PlaybackIntent::Stopped,
        }
    }
}

/// turnplay event types
///
/// Events are broadcast via EventBus and can be serialized for transport to a UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerEvent {
    /// Playback intent changed (Playing / Paused / Stopped)
    ///
    /// Triggers:
    /// - UI: Toggle global play/pause buttons
    PlaybackStateChanged {
        session_id: Uuid,
        old_state: PlaybackIntent,
        new_state: PlaybackIntent,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Segment bound to the global player changed
    ///
    /// Emitted once per change, never per position tick.
    ///
    /// Triggers:
    /// - UI: Highlight the active turn and scroll it into view
    ActiveSegmentChanged {
        session_id: Uuid,
        index: Option<usize>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Global progress update
    ///
    /// Emitted on every position tick and every sequencer transition.
    PlaybackProgress {
        session_id: Uuid,
        /// Progress in [0, 1]
        ratio: f64,
        /// Elapsed seconds on the global timeline
        elapsed_secs: f64,
        /// Sum of the durations known so far (lower bound)
        total_secs: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A segment's audio could not be loaded and was skipped
    SegmentLoadFailed {
        session_id: Uuid,
        index: usize,
        reason: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Global playback ran past the last segment
    SessionFinished {
        session_id: Uuid,
        /// False when the session ended because the remaining segments failed to load
        completed: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Per-turn standalone player progress
    LocalProgress {
        index: usize,
        /// Progress in [0, 1]
        ratio: f64,
        playing: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl PlayerEvent {
    /// Event type name, matching the serialized `type` tag
    pub fn event_type(&self) -> &str {
        match self {
            PlayerEvent::PlaybackStateChanged { .. } => "PlaybackStateChanged",
            PlayerEvent::ActiveSegmentChanged { .. } => "ActiveSegmentChanged",
            PlayerEvent::PlaybackProgress { .. } => "PlaybackProgress",
            PlayerEvent::SegmentLoadFailed { .. } => "SegmentLoadFailed",
            PlayerEvent::SessionFinished { .. } => "SessionFinished",
            PlayerEvent::LocalProgress { .. } => "LocalProgress",
        }
    }
}

/// Central event distribution bus
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use turnplay_common::events::{EventBus, PlaybackIntent, PlayerEvent};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(PlayerEvent::PlaybackStateChanged {
///     session_id: uuid::Uuid::new_v4(),
///     old_state: PlaybackIntent::Paused,
///     new_state: PlaybackIntent::Playing,
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PlayerEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: PlayerEvent,
    ) -> Result<usize, broadcast::error::SendError<PlayerEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: PlayerEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

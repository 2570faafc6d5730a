//! Progress publisher
//!
//! Turns sequencer state into outbound [`PlayerEvent`]s. Keeps just enough
//! memory to avoid re-announcing an unchanged active segment.

use turnplay_common::events::{EventBus, PlaybackIntent, PlayerEvent};
use turnplay_common::time;
use uuid::Uuid;

/// Global progress ratio
///
/// 0 while nothing is known about durations, otherwise `elapsed / total`
/// clamped to [0, 1]. Because `total` is a lower bound, the ratio may jump
/// backwards when a new duration becomes known.
pub fn ratio(elapsed: f64, total: f64) -> f64 {
    if !(total > 0.0) || elapsed.is_nan() {
        return 0.0;
    }
    (elapsed / total).clamp(0.0, 1.0)
}

pub struct ProgressPublisher {
    bus: EventBus,
    session_id: Uuid,
    last_ratio: f64,
    last_active: Option<usize>,
}

impl ProgressPublisher {
    pub fn new(bus: EventBus) -> Self {
        Self {
            bus,
            session_id: Uuid::nil(),
            last_ratio: 0.0,
            last_active: None,
        }
    }

    /// Start publishing for a new session
    pub fn reset(&mut self, session_id: Uuid) {
        self.session_id = session_id;
        self.last_ratio = 0.0;
        self.last_active = None;
    }

    pub fn last_ratio(&self) -> f64 {
        self.last_ratio
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Publish the current global position
    pub fn publish(&mut self, elapsed: f64, total: f64) -> f64 {
        let value = ratio(elapsed, total);
        self.last_ratio = value;
        self.bus.emit_lossy(PlayerEvent::PlaybackProgress {
            session_id: self.session_id,
            ratio: value,
            elapsed_secs: elapsed.max(0.0),
            total_secs: total,
            timestamp: time::now(),
        });
        value
    }

    /// Publish an explicit ratio (session start and finish)
    pub fn force(&mut self, value: f64, total: f64) {
        let value = value.clamp(0.0, 1.0);
        self.last_ratio = value;
        self.bus.emit_lossy(PlayerEvent::PlaybackProgress {
            session_id: self.session_id,
            ratio: value,
            elapsed_secs: value * total,
            total_secs: total,
            timestamp: time::now(),
        });
    }

    /// Announce the active segment if it differs from the last one announced
    pub fn active_changed(&mut self, index: Option<usize>) -> bool {
        if self.last_active == index {
            return false;
        }
        self.last_active = index;
        self.bus.emit_lossy(PlayerEvent::ActiveSegmentChanged {
            session_id: self.session_id,
            index,
            timestamp: time::now(),
        });
        true
    }

    pub fn intent_changed(&self, old_state: PlaybackIntent, new_state: PlaybackIntent) {
        if old_state == new_state {
            return;
        }
        self.bus.emit_lossy(PlayerEvent::PlaybackStateChanged {
            session_id: self.session_id,
            old_state,
            new_state,
            timestamp: time::now(),
        });
    }

    pub fn segment_failed(&self, index: usize, reason: &str) {
        self.bus.emit_lossy(PlayerEvent::SegmentLoadFailed {
            session_id: self.session_id,
            index,
            reason: reason.to_string(),
            timestamp: time::now(),
        });
    }

    pub fn finished(&self, completed: bool) {
        self.bus.emit_lossy(PlayerEvent::SessionFinished {
            session_id: self.session_id,
            completed,
            timestamp: time::now(),
        });
    }
}

//! Standalone per-turn player
//!
//! Each turn gets its own play/pause/seek control that is fully independent of
//! the global sequencer: it owns a separate [`PlaybackSlot`] and never touches
//! the global one, so a turn may be auditioned while the transcript plays.

use crate::playback::events::{ResourceEvent, SlotEvent};
use crate::playback::progress::ratio;
use crate::playback::slot::{AudioBackend, PlaybackSlot};
use tracing::{debug, warn};
use turnplay_common::events::{EventBus, PlayerEvent};
use turnplay_common::time;

pub struct LocalPlayer<B: AudioBackend> {
    index: usize,
    slot: PlaybackSlot<B>,
    bus: EventBus,
    progress: f64,
    failed: bool,
}

impl<B: AudioBackend> LocalPlayer<B> {
    /// Create the player and start loading its clip (paused)
    pub fn new(index: usize, source_ref: &str, backend: B, bus: EventBus) -> Self {
        let mut slot = PlaybackSlot::new(backend);
        slot.bind(source_ref);
        Self {
            index,
            slot,
            bus,
            progress: 0.0,
            failed: false,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn play(&mut self) {
        if self.failed {
            debug!("Local player {}: clip failed to load, ignoring play", self.index);
            return;
        }
        self.slot.play();
        self.emit();
    }

    pub fn pause(&mut self) {
        self.slot.pause();
        self.emit();
    }

    /// Seek to a fraction of the clip; ignored until the duration is known
    pub fn seek_to_ratio(&mut self, value: f64) {
        let Some(duration) = self.slot.duration() else {
            debug!("Local player {}: duration unknown, ignoring seek", self.index);
            return;
        };

        let value = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
        self.slot.seek_to(value * duration);
        self.progress = value;
        self.emit();
    }

    /// Apply a resource event; returns the accepted event
    pub fn handle_slot_event(&mut self, event: SlotEvent) -> Option<ResourceEvent> {
        let event = self.slot.accept(event)?;

        match &event {
            ResourceEvent::PositionTick(offset) => {
                if let Some(duration) = self.slot.duration() {
                    self.progress = ratio(*offset, duration);
                }
            }
            ResourceEvent::MetadataReady(_) => {}
            ResourceEvent::Ended => {
                self.progress = 1.0;
            }
            ResourceEvent::LoadError(reason) => {
                warn!("Local player {}: {}", self.index, reason);
                self.failed = true;
            }
        }

        self.emit();
        Some(event)
    }

    pub fn is_playing(&self) -> bool {
        self.slot.is_playing()
    }

    /// Progress within the clip, in [0, 1]
    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn duration(&self) -> Option<f64> {
        self.slot.duration()
    }

    pub fn close(&mut self) {
        self.slot.close();
    }

    fn emit(&self) {
        self.bus.emit_lossy(PlayerEvent::LocalProgress {
            index: self.index,
            ratio: self.progress,
            playing: self.slot.is_playing(),
            timestamp: time::now(),
        });
    }
}

//! Global playback sequencer
//!
//! Plays the segments of one transcript back to back through a single
//! [`PlaybackSlot`], as if they were one recording.
//!
//! **State machine:**
//! ```text
//! Idle --load--> Ready --play--> Playing <--pause/play--> Paused
//!                                   |
//!                                   +--ended/loadError on last segment--> Finished --play--> Playing
//! ```
//!
//! Every input (user command or resource event) goes through
//! [`Sequencer::handle`]. Resource events are first filtered by the slot's bind
//! generation, so a late event from a clip the user has already seeked away
//! from never reaches the transition logic.
//!
//! A segment that fails to load is skipped like one that ended. Chaining from
//! one segment to the next never passes through `Paused` or `Stopped`.

use crate::error::Result;
use crate::playback::events::{ResourceEvent, SlotEvent};
use crate::playback::progress::ProgressPublisher;
use crate::playback::registry::SegmentRegistry;
use crate::playback::slot::{AudioBackend, PlaybackSlot};
use crate::playback::state::{PlaybackState, SequencerState};
use tracing::{debug, info, warn};
use turnplay_common::api::TurnDescriptor;
use turnplay_common::events::{EventBus, PlaybackIntent, PlaybackSnapshot};
use uuid::Uuid;

/// Anything that can drive a sequencer transition
#[derive(Debug, Clone, PartialEq)]
pub enum SequencerInput {
    Play,
    Pause,
    /// Seek to a fraction of the known global timeline
    SeekToRatio(f64),
    /// Notification from the global slot's resource
    Slot(SlotEvent),
}

pub struct Sequencer<B: AudioBackend> {
    slot: PlaybackSlot<B>,
    registry: Option<SegmentRegistry>,
    state: SequencerState,
    session: PlaybackState,
    publisher: ProgressPublisher,
}

impl<B: AudioBackend> Sequencer<B> {
    pub fn new(backend: B, bus: EventBus) -> Self {
        Self {
            slot: PlaybackSlot::new(backend),
            registry: None,
            state: SequencerState::Idle,
            session: PlaybackState::new(),
            publisher: ProgressPublisher::new(bus),
        }
    }

    /// Start a new session from transcript turns
    ///
    /// Discards any previous session. On [`crate::Error::EmptyInput`] the
    /// sequencer is left idle.
    pub fn load(&mut self, turns: &[TurnDescriptor]) -> Result<Uuid> {
        match SegmentRegistry::load(turns) {
            Ok(registry) => Ok(self.load_registry(registry)),
            Err(e) => {
                self.unload();
                Err(e)
            }
        }
    }

    /// Start a new session from an already built registry
    ///
    /// Listeners see the previous session wind down (intent stopped, no
    /// active segment) before the new one is announced.
    pub fn load_registry(&mut self, registry: SegmentRegistry) -> Uuid {
        self.unload();

        self.session = PlaybackState::new();
        self.publisher.reset(self.session.session_id);
        info!(
            "Session {} loaded with {} segments",
            self.session.session_id,
            registry.len()
        );

        self.registry = Some(registry);
        self.state = SequencerState::Ready;
        self.publisher.force(0.0, 0.0);

        self.session.session_id
    }

    /// Drop the current session and return to idle
    pub fn unload(&mut self) {
        self.slot.close();
        self.registry = None;
        self.state = SequencerState::Idle;
        self.set_intent(PlaybackIntent::Stopped);
        self.session.active_index = None;
        self.session.elapsed_before_active = 0.0;
        self.publisher.active_changed(None);
    }

    pub fn play(&mut self) {
        self.handle(SequencerInput::Play);
    }

    pub fn pause(&mut self) {
        self.handle(SequencerInput::Pause);
    }

    pub fn seek_to_ratio(&mut self, ratio: f64) {
        self.handle(SequencerInput::SeekToRatio(ratio));
    }

    pub fn handle_slot_event(&mut self, event: SlotEvent) {
        self.handle(SequencerInput::Slot(event));
    }

    /// The transition function
    pub fn handle(&mut self, input: SequencerInput) {
        match (self.state, input) {
            (SequencerState::Idle, input) => {
                debug!("Ignoring {:?}: no session loaded", input);
            }

            (SequencerState::Ready | SequencerState::Finished, SequencerInput::Play) => {
                self.start_at(0);
            }
            (SequencerState::Paused, SequencerInput::Play) => self.resume(),
            (SequencerState::Playing, SequencerInput::Play) => {}

            (SequencerState::Playing, SequencerInput::Pause) => {
                self.slot.pause();
                self.state = SequencerState::Paused;
                self.set_intent(PlaybackIntent::Paused);
                self.publish();
            }
            (_, SequencerInput::Pause) => {}

            (_, SequencerInput::SeekToRatio(ratio)) => self.seek(ratio),

            (_, SequencerInput::Slot(event)) => self.on_slot_event(event),
        }
    }

    /// Record a duration learned outside the global slot (e.g. by a local player)
    pub fn record_duration(&mut self, index: usize, duration_secs: f64) {
        let learned = self
            .registry
            .as_mut()
            .map(|r| r.record_duration(index, duration_secs))
            .unwrap_or(false);

        if learned && matches!(self.state, SequencerState::Playing | SequencerState::Paused) {
            self.publish();
        }
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub fn intent(&self) -> PlaybackIntent {
        self.session.intent
    }

    pub fn active_index(&self) -> Option<usize> {
        self.session.active_index
    }

    pub fn progress_ratio(&self) -> f64 {
        self.publisher.last_ratio()
    }

    pub fn session_id(&self) -> Uuid {
        self.session.session_id
    }

    pub fn registry(&self) -> Option<&SegmentRegistry> {
        self.registry.as_ref()
    }

    pub fn slot(&self) -> &PlaybackSlot<B> {
        &self.slot
    }

    pub fn bus(&self) -> &EventBus {
        self.publisher.bus()
    }

    /// Sum of known durations before the active segment
    pub fn elapsed_before_active(&self) -> f64 {
        self.session.elapsed_before_active
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            progress_ratio: self.publisher.last_ratio(),
            active_segment_index: self.session.active_index,
            playback_intent: self.session.intent,
        }
    }

    fn start_at(&mut self, index: usize) {
        self.bind_active(index);
        self.slot.play();
        self.state = SequencerState::Playing;
        self.set_intent(PlaybackIntent::Playing);
        self.publish();
    }

    fn resume(&mut self) {
        if !self.slot.is_bound() {
            let index = self.session.active_index.unwrap_or(0);
            self.bind_active(index);
        }
        self.slot.play();
        self.state = SequencerState::Playing;
        self.set_intent(PlaybackIntent::Playing);
        self.publish();
    }

    fn seek(&mut self, ratio: f64) {
        let Some(registry) = self.registry.as_ref() else {
            return;
        };

        let ratio = if ratio.is_nan() { 0.0 } else { ratio.clamp(0.0, 1.0) };
        let total = registry.total_duration();
        let target = registry.timeline().global_to_local(ratio * total);
        debug!(
            "Seek to {:.3} of {:.3}s -> segment {} at {:.3}s",
            ratio, total, target.index, target.offset
        );

        // Always rebind, even onto the active segment, so the offset lands on a fresh resource
        self.bind_active(target.index);
        self.slot.seek_to(target.offset);

        if self.session.intent == PlaybackIntent::Playing {
            self.slot.play();
            self.state = SequencerState::Playing;
        } else {
            self.state = SequencerState::Paused;
            self.set_intent(PlaybackIntent::Paused);
        }
        self.publish();
    }

    fn on_slot_event(&mut self, event: SlotEvent) {
        let Some(event) = self.slot.accept(event) else {
            return;
        };

        match event {
            ResourceEvent::PositionTick(_) => self.publish(),
            ResourceEvent::MetadataReady(duration) => {
                if let (Some(registry), Some(index)) =
                    (self.registry.as_mut(), self.session.active_index)
                {
                    registry.record_duration(index, duration);
                }
                self.publish();
            }
            ResourceEvent::Ended => {
                debug!("Segment {:?} ended", self.session.active_index);
                self.advance(false);
            }
            ResourceEvent::LoadError(reason) => {
                if let Some(index) = self.session.active_index {
                    warn!("Segment {} failed to load, skipping: {}", index, reason);
                    self.publisher.segment_failed(index, &reason);
                }
                self.advance(true);
            }
        }
    }

    /// Move to the next segment, or finish after the last one
    fn advance(&mut self, after_error: bool) {
        let len = self.registry.as_ref().map(|r| r.len()).unwrap_or(0);
        let next = self.session.active_index.map(|i| i + 1).unwrap_or(0);

        if next < len {
            self.bind_active(next);
            if self.session.intent == PlaybackIntent::Playing {
                self.slot.play();
            }
            self.publish();
        } else {
            self.finish(!after_error);
        }
    }

    /// The active segment stays highlighted on the last one played
    fn finish(&mut self, completed: bool) {
        self.slot.close();
        self.state = SequencerState::Finished;
        self.set_intent(PlaybackIntent::Stopped);

        if completed {
            let total = self.total_duration();
            let ratio = if total > 0.0 { 1.0 } else { 0.0 };
            self.publisher.force(ratio, total);
        }

        info!(
            "Session {} finished (completed: {})",
            self.session.session_id, completed
        );
        self.publisher.finished(completed);
    }

    fn bind_active(&mut self, index: usize) {
        let Some(registry) = self.registry.as_ref() else {
            return;
        };
        let Some(segment) = registry.get(index) else {
            warn!("No segment at index {}", index);
            return;
        };

        self.slot.bind(segment.source_ref());
        self.session.active_index = Some(index);
        self.session.elapsed_before_active = registry.timeline().elapsed_before(index);
        self.publisher.active_changed(Some(index));
    }

    fn set_intent(&mut self, intent: PlaybackIntent) {
        let old = self.session.intent;
        self.session.intent = intent;
        self.publisher.intent_changed(old, intent);
    }

    fn total_duration(&self) -> f64 {
        self.registry
            .as_ref()
            .map(|r| r.total_duration())
            .unwrap_or(0.0)
    }

    /// Recompute and emit global progress
    fn publish(&mut self) {
        let Some(registry) = self.registry.as_ref() else {
            return;
        };
        let Some(index) = self.session.active_index else {
            return;
        };

        // Durations may have been learned since the bind
        let timeline = registry.timeline();
        self.session.elapsed_before_active = timeline.elapsed_before(index);
        let elapsed = self.session.elapsed_before_active + self.slot.current_offset();
        let total = timeline.total();

        self.publisher.publish(elapsed, total);
    }
}

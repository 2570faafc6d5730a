//! Playback slot
//!
//! Holds at most one audio resource at a time and filters the events it
//! produces. The slot is the only place that knows about bind generations:
//! everything downstream of [`PlaybackSlot::accept`] can assume the event came
//! from the resource that is currently bound.

use crate::playback::events::{BindGeneration, ResourceEvent, SlotEvent};
use tracing::{debug, trace};

/// Control surface of one opened audio clip
///
/// Implementations report back asynchronously through whatever channel their
/// backend was given, stamping each event with the generation passed to
/// [`AudioBackend::open`].
pub trait AudioResource: Send {
    fn play(&mut self);
    fn pause(&mut self);
    /// Move to `offset_secs` within the clip
    fn seek(&mut self, offset_secs: f64);
    /// Release the resource; no further events may be acted on
    fn close(&mut self);
}

/// Opens audio resources
pub trait AudioBackend: Send {
    type Resource: AudioResource;

    /// Begin loading `source_ref`
    ///
    /// Never fails synchronously: load problems are reported as
    /// [`ResourceEvent::LoadError`] with the given generation.
    fn open(&mut self, source_ref: &str, generation: BindGeneration) -> Self::Resource;
}

struct BoundResource<R> {
    resource: R,
    source_ref: String,
    duration: Option<f64>,
    offset: f64,
    playing: bool,
}

/// A single-occupancy holder for the currently playing clip
pub struct PlaybackSlot<B: AudioBackend> {
    backend: B,
    generation: BindGeneration,
    bound: Option<BoundResource<B::Resource>>,
}

impl<B: AudioBackend> PlaybackSlot<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            generation: BindGeneration::default(),
            bound: None,
        }
    }

    /// Release the current resource (if any) and open `source_ref`
    ///
    /// The new resource starts paused at offset 0. Returns the generation its
    /// events will carry.
    pub fn bind(&mut self, source_ref: &str) -> BindGeneration {
        self.release();
        self.generation = self.generation.next();

        debug!("Binding {} ({})", source_ref, self.generation);
        let resource = self.backend.open(source_ref, self.generation);
        self.bound = Some(BoundResource {
            resource,
            source_ref: source_ref.to_string(),
            duration: None,
            offset: 0.0,
            playing: false,
        });

        self.generation
    }

    pub fn play(&mut self) {
        if let Some(bound) = self.bound.as_mut() {
            bound.resource.play();
            bound.playing = true;
        }
    }

    pub fn pause(&mut self) {
        if let Some(bound) = self.bound.as_mut() {
            bound.resource.pause();
            bound.playing = false;
        }
    }

    /// Seek within the bound resource
    ///
    /// Clamped to `[0, duration]` when the duration is known, `[0, ∞)` otherwise.
    pub fn seek_to(&mut self, offset_secs: f64) {
        let Some(bound) = self.bound.as_mut() else {
            return;
        };

        let mut offset = if offset_secs > 0.0 { offset_secs } else { 0.0 };
        if let Some(duration) = bound.duration {
            offset = offset.min(duration);
        }

        bound.resource.seek(offset);
        bound.offset = offset;
    }

    /// Release the current resource without binding another
    ///
    /// The generation is left as is: no resource holds it any more, and any
    /// event still in flight is rejected because the slot is empty.
    pub fn close(&mut self) {
        if self.release() {
            debug!("Slot closed ({})", self.generation);
        }
    }

    /// Filter a resource event
    ///
    /// Returns the inner event when it belongs to the currently bound resource,
    /// after folding it into the slot's cached offset, duration and play flag.
    /// Stale events return `None` and have no effect.
    pub fn accept(&mut self, event: SlotEvent) -> Option<ResourceEvent> {
        let Some(bound) = self.bound.as_mut() else {
            trace!("Dropping {:?} ({}): slot empty", event.event, event.generation);
            return None;
        };

        if event.generation != self.generation {
            debug!(
                "Dropping stale {:?} ({}, current {})",
                event.event, event.generation, self.generation
            );
            return None;
        }

        match &event.event {
            ResourceEvent::PositionTick(offset) => {
                bound.offset = *offset;
            }
            ResourceEvent::MetadataReady(duration) => {
                if duration.is_finite() && *duration > 0.0 {
                    bound.duration = Some(*duration);
                }
            }
            ResourceEvent::Ended => {
                bound.playing = false;
                if let Some(duration) = bound.duration {
                    bound.offset = duration;
                }
            }
            ResourceEvent::LoadError(_) => {
                bound.playing = false;
            }
        }

        Some(event.event)
    }

    pub fn generation(&self) -> BindGeneration {
        self.generation
    }

    pub fn is_bound(&self) -> bool {
        self.bound.is_some()
    }

    /// Whether the bound resource was last told to play
    pub fn is_playing(&self) -> bool {
        self.bound.as_ref().map(|b| b.playing).unwrap_or(false)
    }

    /// Last known offset within the bound resource (0 when empty)
    pub fn current_offset(&self) -> f64 {
        self.bound.as_ref().map(|b| b.offset).unwrap_or(0.0)
    }

    /// Duration of the bound resource, once reported
    pub fn duration(&self) -> Option<f64> {
        self.bound.as_ref().and_then(|b| b.duration)
    }

    pub fn source_ref(&self) -> Option<&str> {
        self.bound.as_ref().map(|b| b.source_ref.as_str())
    }

    fn release(&mut self) -> bool {
        match self.bound.take() {
            Some(mut bound) => {
                bound.resource.close();
                true
            }
            None => false,
        }
    }
}

impl<B: AudioBackend> Drop for PlaybackSlot<B> {
    fn drop(&mut self) {
        self.release();
    }
}

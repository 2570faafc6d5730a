//! Segment registry
//!
//! Ordered list of the clips that make up one transcript. Built once per
//! session from the transcription response; segments are never reordered or
//! removed afterwards. Durations start unknown and are filled in lazily, the
//! first time the playback primitive reports metadata for a clip.

use crate::error::{Error, Result};
use crate::playback::timeline::Timeline;
use tracing::{debug, warn};
use turnplay_common::api::TurnDescriptor;

/// One playable clip
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    index: usize,
    source_ref: String,
    duration: Option<f64>,
}

impl Segment {
    /// Position in the sequence (0-based, stable)
    pub fn index(&self) -> usize {
        self.index
    }

    /// Opaque locator of the clip's audio bytes
    pub fn source_ref(&self) -> &str {
        &self.source_ref
    }

    /// Duration in seconds, once reported by the playback primitive
    pub fn duration(&self) -> Option<f64> {
        self.duration
    }
}

/// Ordered, append-free collection of segments
#[derive(Debug, Clone)]
pub struct SegmentRegistry {
    segments: Vec<Segment>,
}

impl SegmentRegistry {
    /// Build the registry from transcript turns, keeping only order and `audio_path`
    ///
    /// # Errors
    /// [`Error::EmptyInput`] when there are no turns.
    pub fn load(turns: &[TurnDescriptor]) -> Result<Self> {
        Self::from_source_refs(turns.iter().map(|t| t.audio_path.clone()))
    }

    /// Build the registry directly from clip locators
    pub fn from_source_refs<I, S>(refs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<Segment> = refs
            .into_iter()
            .enumerate()
            .map(|(index, source_ref)| Segment {
                index,
                source_ref: source_ref.into(),
                duration: None,
            })
            .collect();

        if segments.is_empty() {
            return Err(Error::EmptyInput);
        }

        debug!("Loaded {} segments into registry", segments.len());
        Ok(Self { segments })
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false for a successfully loaded registry
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Mapper over the current duration knowledge
    pub fn timeline(&self) -> Timeline<'_> {
        Timeline::new(&self.segments)
    }

    /// Sum of known durations; a lower bound until every segment has loaded once
    pub fn total_duration(&self) -> f64 {
        self.timeline().total()
    }

    pub fn all_durations_known(&self) -> bool {
        self.segments.iter().all(|s| s.duration.is_some())
    }

    /// Record a reported duration
    ///
    /// Returns true if the duration was newly learned. A known duration is
    /// never overwritten; non-positive or non-finite values are rejected.
    pub fn record_duration(&mut self, index: usize, duration_secs: f64) -> bool {
        if !(duration_secs.is_finite() && duration_secs > 0.0) {
            warn!(
                "Ignoring invalid duration {} for segment {}",
                duration_secs, index
            );
            return false;
        }

        let Some(segment) = self.segments.get_mut(index) else {
            warn!("Duration reported for unknown segment {}", index);
            return false;
        };

        match segment.duration {
            Some(known) => {
                if (known - duration_secs).abs() > f64::EPSILON {
                    debug!(
                        "Segment {} duration already known ({:.3}s), ignoring {:.3}s",
                        index, known, duration_secs
                    );
                }
                false
            }
            None => {
                segment.duration = Some(duration_secs);
                debug!("Segment {} duration learned: {:.3}s", index, duration_secs);
                true
            }
        }
    }
}

//! Global timeline mapping
//!
//! Converts between a position on the global timeline (seconds since the start
//! of the first clip) and a `(segment index, offset within segment)` pair.
//!
//! Duration knowledge is partial: a clip's duration is only known once it has
//! been loaded at least once. Unknown durations count as zero in both
//! directions, so the mapping improves monotonically as durations resolve and
//! is only guaranteed to round-trip for segments whose preceding durations are
//! all known.

use crate::playback::registry::Segment;

/// A position within one segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentPosition {
    /// Segment index
    pub index: usize,
    /// Seconds from the start of the segment
    pub offset: f64,
}

impl SegmentPosition {
    pub fn new(index: usize, offset: f64) -> Self {
        Self { index, offset }
    }
}

/// Read-only view of the segments' duration knowledge
///
/// Stateless: every call recomputes from the segment list, so a `Timeline`
/// taken after a duration is learned sees the new value.
///
/// # Examples
/// ```
/// use turnplay_ap::playback::registry::SegmentRegistry;
/// use turnplay_ap::playback::timeline::SegmentPosition;
///
/// let mut registry = SegmentRegistry::from_source_refs(["a", "b", "c"]).unwrap();
/// registry.record_duration(0, 3.0);
/// registry.record_duration(2, 2.0);
///
/// let timeline = registry.timeline();
/// assert_eq!(timeline.total(), 5.0);
///
/// // A's 3s is exhausted before 4.0s; B is unknown and takes no room
/// assert_eq!(timeline.global_to_local(4.0), SegmentPosition::new(2, 1.0));
/// assert_eq!(timeline.local_to_global(2, 1.0), 4.0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Timeline<'a> {
    segments: &'a [Segment],
}

impl<'a> Timeline<'a> {
    pub fn new(segments: &'a [Segment]) -> Self {
        Self { segments }
    }

    /// Sum of known durations
    pub fn total(&self) -> f64 {
        self.segments.iter().filter_map(|s| s.duration()).sum()
    }

    /// Resolve a global elapsed time to a segment and offset
    ///
    /// **Algorithm:**
    /// 1. Non-positive (or NaN) elapsed resolves to the start of segment 0
    /// 2. Walk segments in order accumulating known durations; the first
    ///    segment whose range `[before, before + duration)` contains `elapsed`
    ///    is the target
    /// 3. Exactly at the end of the known timeline: the last known segment, at
    ///    its full duration
    /// 4. Beyond the known timeline: the last known segment at offset 0
    ///    (best effort while later durations are unknown)
    ///
    /// With no known durations at all the result is the start of segment 0.
    pub fn global_to_local(&self, elapsed: f64) -> SegmentPosition {
        if !(elapsed > 0.0) {
            return SegmentPosition::new(0, 0.0);
        }

        let mut before = 0.0;
        let mut last_known: Option<(usize, f64)> = None;

        for segment in self.segments {
            let Some(duration) = segment.duration() else {
                continue;
            };

            if elapsed < before + duration {
                return SegmentPosition::new(segment.index(), elapsed - before);
            }

            before += duration;
            last_known = Some((segment.index(), duration));
        }

        match last_known {
            Some((index, duration)) if elapsed <= before => SegmentPosition::new(index, duration),
            Some((index, _)) => SegmentPosition::new(index, 0.0),
            None => SegmentPosition::new(0, 0.0),
        }
    }

    /// Global elapsed time of `offset` seconds into segment `index`
    ///
    /// Unknown durations before `index` count as zero.
    pub fn local_to_global(&self, index: usize, offset: f64) -> f64 {
        self.elapsed_before(index) + offset
    }

    /// Sum of known durations strictly before `index`
    pub fn elapsed_before(&self, index: usize) -> f64 {
        self.segments
            .iter()
            .take(index)
            .filter_map(|s| s.duration())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::registry::SegmentRegistry;

    fn registry(durations: &[Option<f64>]) -> SegmentRegistry {
        let mut registry =
            SegmentRegistry::from_source_refs((0..durations.len()).map(|i| format!("seg-{}", i)))
                .unwrap();
        for (i, d) in durations.iter().enumerate() {
            if let Some(d) = d {
                registry.record_duration(i, *d);
            }
        }
        registry
    }

    #[test]
    fn test_total_ignores_unknown() {
        let r = registry(&[Some(3.0), None, Some(2.0)]);
        assert_eq!(r.timeline().total(), 5.0);
    }

    #[test]
    fn test_zero_resolves_to_first_segment() {
        // Even when segment 0 has no known duration yet
        let r = registry(&[None, Some(4.0)]);
        assert_eq!(r.timeline().global_to_local(0.0), SegmentPosition::new(0, 0.0));

        let r = registry(&[Some(1.0), Some(4.0)]);
        assert_eq!(r.timeline().global_to_local(0.0), SegmentPosition::new(0, 0.0));
    }

    #[test]
    fn test_negative_and_nan_resolve_to_start() {
        let r = registry(&[Some(1.0)]);
        assert_eq!(r.timeline().global_to_local(-3.0), SegmentPosition::new(0, 0.0));
        assert_eq!(r.timeline().global_to_local(f64::NAN), SegmentPosition::new(0, 0.0));
    }

    #[test]
    fn test_boundary_belongs_to_next_segment() {
        let r = registry(&[Some(3.0), Some(2.0)]);
        assert_eq!(r.timeline().global_to_local(3.0), SegmentPosition::new(1, 0.0));
    }

    #[test]
    fn test_skips_unknown_segments() {
        let r = registry(&[Some(3.0), None, Some(2.0)]);
        assert_eq!(r.timeline().global_to_local(4.0), SegmentPosition::new(2, 1.0));
        assert_eq!(r.timeline().global_to_local(2.5), SegmentPosition::new(0, 2.5));
    }

    #[test]
    fn test_end_of_known_timeline() {
        let r = registry(&[Some(3.0), Some(2.0), None]);
        assert_eq!(r.timeline().global_to_local(5.0), SegmentPosition::new(1, 2.0));
    }

    #[test]
    fn test_beyond_known_timeline_falls_back_to_last_known_start() {
        let r = registry(&[Some(3.0), Some(2.0), None]);
        assert_eq!(r.timeline().global_to_local(7.5), SegmentPosition::new(1, 0.0));
    }

    #[test]
    fn test_no_known_durations() {
        let r = registry(&[None, None]);
        assert_eq!(r.timeline().global_to_local(10.0), SegmentPosition::new(0, 0.0));
        assert_eq!(r.timeline().total(), 0.0);
    }

    #[test]
    fn test_local_to_global_counts_unknown_as_zero() {
        let r = registry(&[Some(3.0), None, Some(2.0), Some(4.0)]);
        let t = r.timeline();
        assert_eq!(t.local_to_global(0, 1.0), 1.0);
        assert_eq!(t.local_to_global(1, 0.5), 3.5);
        assert_eq!(t.local_to_global(3, 0.0), 5.0);
        assert_eq!(t.elapsed_before(2), 3.0);
    }

    #[test]
    fn test_round_trip_when_prefix_known() {
        let r = registry(&[Some(1.25), Some(2.5), Some(0.75), None, Some(3.0)]);
        let t = r.timeline();

        for index in 0..3 {
            let duration = r.get(index).unwrap().duration().unwrap();
            for step in 0..10 {
                let offset = duration * step as f64 / 10.0;
                let global = t.local_to_global(index, offset);
                let back = t.global_to_local(global);
                assert_eq!(back.index, index, "index mismatch at ({}, {})", index, offset);
                assert!(
                    (back.offset - offset).abs() < 1e-9,
                    "offset mismatch at ({}, {}): {}",
                    index,
                    offset,
                    back.offset
                );
            }
        }
    }

    #[test]
    fn test_mapping_improves_as_durations_resolve() {
        let mut r = registry(&[Some(2.0), None, Some(2.0)]);
        assert_eq!(r.timeline().global_to_local(3.0), SegmentPosition::new(2, 1.0));

        r.record_duration(1, 4.0);
        assert_eq!(r.timeline().global_to_local(3.0), SegmentPosition::new(1, 1.0));
        assert_eq!(r.timeline().total(), 8.0);
    }
}

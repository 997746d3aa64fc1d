//! Audio segments placed on the timeline

use serde::{Deserialize, Serialize};
use wd_core::{FadeCurve, GAIN, PAN};

use crate::track::TrackId;

/// Shortest segment a resize or move may produce (ms)
pub const MIN_SEGMENT_MS: f64 = 100.0;

/// Latest time a segment edge may reach (ms), about 115 days
pub const MAX_TIMELINE_MS: f64 = 1.0e10;

/// Segment identifier, unique within a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentId(pub u64);

impl std::fmt::Display for SegmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "segment-{}", self.0)
    }
}

/// A window of a source file placed at `[start_ms, end_ms)` on a track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSegment {
    pub id: SegmentId,
    pub uri: String,
    pub track_id: TrackId,
    pub start_ms: f64,
    pub end_ms: f64,
    /// Offset into the source file (ms)
    pub source_offset_ms: f64,
    /// Length of the underlying source file (ms)
    pub source_duration_ms: f64,
    /// Linear gain (0..2)
    pub gain: f64,
    /// Pan (-1..1)
    pub pan: f64,
    pub muted: bool,
    pub fade_in_ms: f64,
    pub fade_out_ms: f64,
    #[serde(default)]
    pub fade_curve: FadeCurve,
    #[serde(default)]
    pub waveform: Option<Vec<f32>>,
    #[serde(default)]
    pub processed_waveform: Option<Vec<f32>>,
    #[serde(default)]
    pub waveform_version: u64,
}

impl AudioSegment {
    pub fn duration_ms(&self) -> f64 {
        self.end_ms - self.start_ms
    }

    pub fn contains(&self, time_ms: f64) -> bool {
        time_ms >= self.start_ms && time_ms < self.end_ms
    }

    /// Source window `[offset, offset + duration)` this segment plays
    pub fn source_window_ms(&self) -> (f64, f64) {
        (self.source_offset_ms, self.source_offset_ms + self.duration_ms())
    }

    /// Move to new bounds, enforcing the minimum width and shifting the
    /// source offset along with the start edge.
    /// A non-finite edge keeps its current position.
    pub(crate) fn set_bounds(&mut self, start_ms: f64, end_ms: f64) {
        let (start, end) = enforce_min_width(
            finite_or(start_ms, self.start_ms),
            finite_or(end_ms, self.end_ms),
        );
        let delta = start - self.start_ms;
        self.source_offset_ms = (self.source_offset_ms + delta).max(0.0);
        self.start_ms = start;
        self.end_ms = end;
        self.clamp_fades();
    }

    /// Keep both fades within the segment
    pub(crate) fn clamp_fades(&mut self) {
        let width = self.duration_ms().max(0.0);
        self.fade_in_ms = finite_or(self.fade_in_ms, 0.0).clamp(0.0, width);
        self.fade_out_ms = finite_or(self.fade_out_ms, 0.0).clamp(0.0, width);
    }

    pub(crate) fn sanitize(&mut self) {
        let (start, end) = enforce_min_width(self.start_ms, self.end_ms);
        self.start_ms = start;
        self.end_ms = end;
        self.gain = GAIN.clamp(self.gain);
        self.pan = PAN.clamp(self.pan);
        self.source_offset_ms = finite_or(self.source_offset_ms, 0.0).max(0.0);
        self.clamp_fades();
    }
}

#[inline]
pub(crate) fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}

/// Widen `[start, end]` to at least [`MIN_SEGMENT_MS`] by moving the start
/// backward. When that would cross zero the start is pinned at 0 and the
/// end is pushed forward instead. Edges are kept within
/// `[0, MAX_TIMELINE_MS]`; a non-finite start reads as 0 and a non-finite
/// end as one minimum width after the start.
pub fn enforce_min_width(start_ms: f64, end_ms: f64) -> (f64, f64) {
    let mut start = finite_or(start_ms, 0.0).clamp(0.0, MAX_TIMELINE_MS - MIN_SEGMENT_MS);
    let mut end = finite_or(end_ms, start + MIN_SEGMENT_MS).min(MAX_TIMELINE_MS);
    if end - start < MIN_SEGMENT_MS {
        start = end - MIN_SEGMENT_MS;
        if start < 0.0 {
            start = 0.0;
            end = MIN_SEGMENT_MS;
        }
    }
    (start, end)
}

/// Request for a new segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentSpec {
    pub uri: String,
    pub track_id: TrackId,
    pub start_ms: f64,
    pub end_ms: f64,
    #[serde(default)]
    pub source_offset_ms: f64,
    /// Source file length; defaults to the segment width
    #[serde(default)]
    pub source_duration_ms: Option<f64>,
}

impl SegmentSpec {
    pub fn new(uri: impl Into<String>, track_id: TrackId, start_ms: f64, end_ms: f64) -> Self {
        Self {
            uri: uri.into(),
            track_id,
            start_ms,
            end_ms,
            source_offset_ms: 0.0,
            source_duration_ms: None,
        }
    }

    pub(crate) fn into_segment(self, id: SegmentId, version: u64) -> AudioSegment {
        let (start_ms, end_ms) = enforce_min_width(self.start_ms, self.end_ms);
        AudioSegment {
            id,
            uri: self.uri,
            track_id: self.track_id,
            start_ms,
            end_ms,
            source_offset_ms: self.source_offset_ms.max(0.0),
            source_duration_ms: self
                .source_duration_ms
                .unwrap_or(end_ms - start_ms)
                .max(0.0),
            gain: 1.0,
            pan: 0.0,
            muted: false,
            fade_in_ms: 0.0,
            fade_out_ms: 0.0,
            fade_curve: FadeCurve::Linear,
            waveform: None,
            processed_waveform: None,
            waveform_version: version,
        }
    }
}

/// Partial segment update; `None` fields are left alone
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentPatch {
    pub uri: Option<String>,
    pub track_id: Option<TrackId>,
    pub start_ms: Option<f64>,
    pub end_ms: Option<f64>,
    pub source_offset_ms: Option<f64>,
    pub gain: Option<f64>,
    pub pan: Option<f64>,
    pub muted: Option<bool>,
    pub fade_in_ms: Option<f64>,
    pub fade_out_ms: Option<f64>,
    pub fade_curve: Option<FadeCurve>,
}

impl SegmentPatch {
    pub(crate) fn changes_timing(&self) -> bool {
        self.start_ms.is_some() || self.end_ms.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(start: f64, end: f64) -> AudioSegment {
        SegmentSpec::new("file:///a.wav", TrackId(1), start, end).into_segment(SegmentId(1), 1)
    }

    #[test]
    fn test_min_width() {
        assert_eq!(enforce_min_width(1000.0, 1050.0), (950.0, 1050.0));
        assert_eq!(enforce_min_width(20.0, 60.0), (0.0, 100.0));
        assert_eq!(enforce_min_width(0.0, 500.0), (0.0, 500.0));
        assert_eq!(enforce_min_width(-50.0, 500.0), (0.0, 500.0));
        assert_eq!(enforce_min_width(800.0, 300.0), (200.0, 300.0));
    }

    #[test]
    fn test_min_width_with_non_finite_edges() {
        assert_eq!(enforce_min_width(500.0, f64::NAN), (500.0, 600.0));
        assert_eq!(enforce_min_width(f64::NAN, 400.0), (0.0, 400.0));
        assert_eq!(enforce_min_width(f64::NEG_INFINITY, f64::INFINITY), (0.0, 100.0));
        assert_eq!(
            enforce_min_width(2.0e10, 3.0e10),
            (MAX_TIMELINE_MS - MIN_SEGMENT_MS, MAX_TIMELINE_MS)
        );
    }

    #[test]
    fn test_set_bounds_keeps_current_edge_when_non_finite() {
        let mut seg = segment(1000.0, 3000.0);
        seg.set_bounds(500.0, f64::NAN);
        assert_eq!((seg.start_ms, seg.end_ms), (500.0, 3000.0));

        seg.set_bounds(f64::INFINITY, 2000.0);
        assert_eq!((seg.start_ms, seg.end_ms), (500.0, 2000.0));

        seg.fade_in_ms = f64::NAN;
        seg.clamp_fades();
        assert_eq!(seg.fade_in_ms, 0.0);
    }

    #[test]
    fn test_set_bounds_shifts_source_offset() {
        let mut seg = segment(1000.0, 3000.0);
        seg.source_offset_ms = 500.0;
        seg.set_bounds(1200.0, 3000.0);
        assert_eq!(seg.source_offset_ms, 700.0);

        seg.set_bounds(0.0, 3000.0);
        assert_eq!(seg.source_offset_ms, 0.0);
    }

    #[test]
    fn test_fades_stay_inside() {
        let mut seg = segment(0.0, 1000.0);
        seg.fade_in_ms = 800.0;
        seg.fade_out_ms = 900.0;
        seg.set_bounds(0.0, 300.0);
        assert_eq!(seg.fade_in_ms, 300.0);
        assert_eq!(seg.fade_out_ms, 300.0);
    }

    #[test]
    fn test_segment_defaults() {
        let seg = segment(100.0, 600.0);
        assert_eq!(seg.source_duration_ms, 500.0);
        assert_eq!(seg.gain, 1.0);
        assert!(seg.contains(100.0));
        assert!(!seg.contains(600.0));
    }
}

//! Project: the root of the timeline model
//!
//! Owns tracks and segments and exposes every timeline edit as a method.
//! Mutators are total: an unknown id leaves the project untouched and the
//! method reports `false`/`None`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use wd_core::{IdAllocator, GAIN, PAN};

use crate::automation::AutomationCurve;
use crate::segment::{
    finite_or, AudioSegment, SegmentId, SegmentPatch, SegmentSpec, MAX_TIMELINE_MS, MIN_SEGMENT_MS,
};
use crate::track::{Track, TrackId, TrackPatch, TrackSpec, TrackType, MAX_AUDIO_TRACKS};
use crate::viewport::TimelineViewport;

/// Project-wide audio settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSettings {
    pub sample_rate: u32,
    pub bit_depth: u16,
    pub tempo_bpm: f64,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            bit_depth: 16,
            tempo_bpm: 120.0,
        }
    }
}

/// Multitrack project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub station_id: String,
    pub name: String,
    /// Recording the project was created from
    pub source_uri: Option<String>,
    pub duration_ms: f64,
    tracks: Vec<Track>,
    segments: Vec<AudioSegment>,
    pub viewport: TimelineViewport,
    pub settings: ProjectSettings,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    ids: IdAllocator,
}

impl Project {
    /// Empty project holding only the master track
    pub fn new(station_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        let mut ids = IdAllocator::new();
        let master = Track::new(TrackId(ids.next_id()), 0, "Master", TrackType::Master);
        Self {
            id: Uuid::new_v4(),
            station_id: station_id.into(),
            name: name.into(),
            source_uri: None,
            duration_ms: 0.0,
            tracks: vec![master],
            segments: Vec::new(),
            viewport: TimelineViewport::default(),
            settings: ProjectSettings::default(),
            created_at: now,
            modified_at: now,
            ids,
        }
    }

    /// Project for a finished recording: master, one audio track and one
    /// segment covering the whole take.
    pub fn from_recording(
        station_id: impl Into<String>,
        name: impl Into<String>,
        uri: impl Into<String>,
        duration_ms: f64,
    ) -> Self {
        let uri = uri.into();
        let mut project = Self::new(station_id, name);
        project.source_uri = Some(uri.clone());
        project.duration_ms = duration_ms.max(0.0);

        let track_id = project.add_track(TrackSpec::audio("Recording")).map(|t| t.id);
        if let Some(track_id) = track_id {
            let mut spec = SegmentSpec::new(uri, track_id, 0.0, project.duration_ms);
            spec.source_duration_ms = Some(project.duration_ms);
            project.add_segment(spec);
        }
        project
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // QUERIES
    // ═══════════════════════════════════════════════════════════════════════════

    /// Tracks in display order
    pub fn tracks(&self) -> Vec<&Track> {
        let mut tracks: Vec<&Track> = self.tracks.iter().collect();
        tracks.sort_by_key(|t| t.index);
        tracks
    }

    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn master_track(&self) -> Option<&Track> {
        self.tracks.iter().find(|t| t.is_master())
    }

    pub fn audio_track_count(&self) -> usize {
        self.tracks
            .iter()
            .filter(|t| t.track_type == TrackType::Audio)
            .count()
    }

    pub fn segments(&self) -> &[AudioSegment] {
        &self.segments
    }

    pub fn segment(&self, id: SegmentId) -> Option<&AudioSegment> {
        self.segments.iter().find(|s| s.id == id)
    }

    /// Segments on a track, ordered by start time
    pub fn segments_on(&self, track_id: TrackId) -> Vec<&AudioSegment> {
        let mut segments: Vec<&AudioSegment> =
            self.segments.iter().filter(|s| s.track_id == track_id).collect();
        segments.sort_by(|a, b| a.start_ms.total_cmp(&b.start_ms));
        segments
    }

    fn track_mut(&mut self, id: TrackId) -> Option<&mut Track> {
        self.tracks.iter_mut().find(|t| t.id == id)
    }

    fn segment_mut(&mut self, id: SegmentId) -> Option<&mut AudioSegment> {
        self.segments.iter_mut().find(|s| s.id == id)
    }

    fn has_track(&self, id: TrackId) -> bool {
        self.tracks.iter().any(|t| t.id == id)
    }

    fn touch(&mut self) {
        self.modified_at = Utc::now();
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // TRACKS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Append a track. Refuses a second master and audio tracks beyond
    /// [`MAX_AUDIO_TRACKS`].
    pub fn add_track(&mut self, spec: TrackSpec) -> Option<&Track> {
        match spec.track_type {
            TrackType::Master if self.master_track().is_some() => {
                log::debug!("Refusing second master track in project {}", self.id);
                return None;
            }
            TrackType::Audio if self.audio_track_count() >= MAX_AUDIO_TRACKS => {
                log::debug!("Audio track limit ({}) reached", MAX_AUDIO_TRACKS);
                return None;
            }
            _ => {}
        }

        let index = self
            .tracks
            .iter()
            .map(|t| t.index)
            .max()
            .map(|i| i + 1)
            .unwrap_or(0);
        let id = TrackId(self.ids.next_id());
        self.tracks.push(Track::new(id, index, spec.name, spec.track_type));
        self.touch();
        self.tracks.last()
    }

    /// Delete a track and every segment on it. The master track stays.
    pub fn remove_track(&mut self, id: TrackId) -> bool {
        match self.track(id) {
            Some(track) if !track.is_master() => {}
            _ => return false,
        }

        self.tracks.retain(|t| t.id != id);
        let before = self.segments.len();
        self.segments.retain(|s| s.track_id != id);
        for track in &mut self.tracks {
            track.sends.retain(|s| s.target != id);
        }
        log::debug!(
            "Removed {} with {} segment(s)",
            id,
            before - self.segments.len()
        );
        self.touch();
        true
    }

    pub fn update_track(&mut self, id: TrackId, patch: TrackPatch) -> bool {
        match self.track_mut(id) {
            Some(track) => {
                track.apply(patch);
                self.touch();
                true
            }
            None => false,
        }
    }

    /// Set an aux send; both tracks must exist and differ
    pub fn set_track_send(&mut self, from: TrackId, to: TrackId, level: f64) -> bool {
        if from == to || !self.has_track(to) {
            return false;
        }
        match self.track_mut(from) {
            Some(track) => {
                track.set_send(to, level);
                self.touch();
                true
            }
            None => false,
        }
    }

    /// Reassign display indices to follow `order`. Unknown ids are dropped;
    /// unlisted tracks keep their relative order after the listed ones.
    pub fn reorder_tracks(&mut self, order: &[TrackId]) {
        let mut sequence: Vec<TrackId> = Vec::with_capacity(self.tracks.len());
        for id in order {
            if self.has_track(*id) && !sequence.contains(id) {
                sequence.push(*id);
            }
        }
        for track in self.tracks() {
            if !sequence.contains(&track.id) {
                sequence.push(track.id);
            }
        }

        for (index, id) in sequence.into_iter().enumerate() {
            if let Some(track) = self.track_mut(id) {
                track.index = index as u32;
            }
        }
        self.touch();
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SEGMENTS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Place a new segment. `None` when the track does not exist.
    pub fn add_segment(&mut self, mut spec: SegmentSpec) -> Option<&AudioSegment> {
        if !self.has_track(spec.track_id) {
            return None;
        }
        let id = SegmentId(self.ids.next_id());
        let version = self.ids.next_version();
        spec.start_ms = self.viewport.snap(spec.start_ms);
        spec.end_ms = self.viewport.snap(spec.end_ms);
        let segment = spec.into_segment(id, version);
        self.duration_ms = self.duration_ms.max(segment.end_ms);
        self.segments.push(segment);
        self.touch();
        self.segments.last()
    }

    pub fn remove_segment(&mut self, id: SegmentId) -> bool {
        let before = self.segments.len();
        self.segments.retain(|s| s.id != id);
        let removed = self.segments.len() != before;
        if removed {
            self.touch();
        }
        removed
    }

    /// Merge a patch. Numeric fields are clamped; timing changes re-apply
    /// the minimum width; a move to an unknown track is ignored.
    pub fn update_segment(&mut self, id: SegmentId, patch: SegmentPatch) -> bool {
        let track_ok = patch.track_id.map(|t| self.has_track(t)).unwrap_or(false);
        let Some(segment) = self.segment_mut(id) else {
            return false;
        };

        if patch.changes_timing() {
            let start = patch.start_ms.unwrap_or(segment.start_ms);
            let end = patch.end_ms.unwrap_or(segment.end_ms);
            segment.set_bounds(start, end);
        }
        if let Some(uri) = patch.uri {
            segment.uri = uri;
        }
        if let (Some(track_id), true) = (patch.track_id, track_ok) {
            segment.track_id = track_id;
        }
        if let Some(offset) = patch.source_offset_ms {
            segment.source_offset_ms = offset.max(0.0);
        }
        if let Some(gain) = patch.gain {
            segment.gain = GAIN.clamp(gain);
        }
        if let Some(pan) = patch.pan {
            segment.pan = PAN.clamp(pan);
        }
        if let Some(muted) = patch.muted {
            segment.muted = muted;
        }
        if let Some(fade_in) = patch.fade_in_ms {
            segment.fade_in_ms = fade_in;
        }
        if let Some(fade_out) = patch.fade_out_ms {
            segment.fade_out_ms = fade_out;
        }
        if let Some(curve) = patch.fade_curve {
            segment.fade_curve = curve;
        }
        segment.clamp_fades();
        let end = segment.end_ms;

        self.duration_ms = self.duration_ms.max(end);
        self.touch();
        true
    }

    /// Re-parent a segment at a new start, keeping its duration
    pub fn move_segment(
        &mut self,
        id: SegmentId,
        new_track_id: TrackId,
        new_start_ms: f64,
    ) -> bool {
        let current_track = match self.segment(id) {
            Some(segment) => segment.track_id,
            None => return false,
        };
        if !self.has_track(current_track) || !self.has_track(new_track_id) {
            return false;
        }

        let snapped = self.viewport.snap(new_start_ms);
        let Some(segment) = self.segment_mut(id) else {
            return false;
        };
        let duration = segment.duration_ms().max(MIN_SEGMENT_MS);
        let start = finite_or(snapped, segment.start_ms).clamp(0.0, MAX_TIMELINE_MS - duration);
        segment.track_id = new_track_id;
        segment.start_ms = start;
        segment.end_ms = start + duration;
        let end = segment.end_ms;

        self.duration_ms = self.duration_ms.max(end);
        self.touch();
        true
    }

    /// Change both edges. Positions snap when enabled and the result is at
    /// least [`crate::MIN_SEGMENT_MS`] wide.
    pub fn resize_segment(&mut self, id: SegmentId, new_start_ms: f64, new_end_ms: f64) -> bool {
        let start = self.viewport.snap(new_start_ms);
        let end = self.viewport.snap(new_end_ms);
        let Some(segment) = self.segment_mut(id) else {
            return false;
        };
        segment.set_bounds(start, end);
        let end = segment.end_ms;

        self.duration_ms = self.duration_ms.max(end);
        self.touch();
        true
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // WAVEFORMS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Store source peaks; returns the new waveform version
    pub fn set_segment_waveform(&mut self, id: SegmentId, peaks: Vec<f32>) -> Option<u64> {
        self.bump_waveform(id, |segment| segment.waveform = Some(peaks))
    }

    /// Store peaks of the rendered (effected) audio
    pub fn set_processed_waveform(&mut self, id: SegmentId, peaks: Vec<f32>) -> Option<u64> {
        self.bump_waveform(id, |segment| segment.processed_waveform = Some(peaks))
    }

    /// Drop the processed peaks after an edit that changes the sound
    pub fn invalidate_waveform(&mut self, id: SegmentId) -> Option<u64> {
        self.bump_waveform(id, |segment| segment.processed_waveform = None)
    }

    fn bump_waveform(
        &mut self,
        id: SegmentId,
        edit: impl FnOnce(&mut AudioSegment),
    ) -> Option<u64> {
        let index = self.segments.iter().position(|s| s.id == id)?;
        let version = self.ids.next_version();
        let segment = &mut self.segments[index];
        edit(segment);
        segment.waveform_version = version;
        Some(version)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // AUTOMATION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Give a track a flat two-point curve over the project duration
    pub fn enable_automation(&mut self, track_id: TrackId, initial_value: f64) -> bool {
        let end = self.duration_ms.max(crate::MIN_SEGMENT_MS);
        match self.track_mut(track_id) {
            Some(track) => {
                if track.automation.is_none() {
                    track.automation = Some(AutomationCurve::flat(initial_value, end));
                }
                self.touch();
                true
            }
            None => false,
        }
    }

    pub fn disable_automation(&mut self, track_id: TrackId) -> bool {
        match self.track_mut(track_id) {
            Some(track) if track.automation.is_some() => {
                track.automation = None;
                self.touch();
                true
            }
            _ => false,
        }
    }

    pub fn add_automation_point(
        &mut self,
        track_id: TrackId,
        time_ms: f64,
        value: f64,
    ) -> Option<usize> {
        let curve = self.track_mut(track_id)?.automation.as_mut()?;
        let index = curve.add_point(time_ms, value);
        self.touch();
        Some(index)
    }

    pub fn update_automation_point(
        &mut self,
        track_id: TrackId,
        index: usize,
        time_ms: f64,
        value: f64,
    ) -> bool {
        let updated = self
            .track_mut(track_id)
            .and_then(|t| t.automation.as_mut())
            .map(|c| c.update_point(index, time_ms, value))
            .unwrap_or(false);
        if updated {
            self.touch();
        }
        updated
    }

    /// Remove a point; refused when the curve would keep fewer than two
    pub fn remove_automation_point(&mut self, track_id: TrackId, index: usize) -> bool {
        let removed = self
            .track_mut(track_id)
            .and_then(|t| t.automation.as_mut())
            .map(|c| c.remove_point(index))
            .unwrap_or(false);
        if removed {
            self.touch();
        }
        removed
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // VALIDATION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Repair a project that did not come from the mutators (e.g. loaded
    /// from disk). Returns the number of repairs made.
    pub fn validate(&mut self) -> usize {
        let mut repairs = 0;

        // Exactly one master
        let masters: Vec<TrackId> = self
            .tracks
            .iter()
            .filter(|t| t.is_master())
            .map(|t| t.id)
            .collect();
        if masters.is_empty() {
            let id = TrackId(self.ids.next_id());
            let index = self.tracks.iter().map(|t| t.index + 1).max().unwrap_or(0);
            self.tracks.push(Track::new(id, index, "Master", TrackType::Master));
            log::warn!("Project {} had no master track; added {}", self.id, id);
            repairs += 1;
        }
        for extra in masters.iter().skip(1) {
            if let Some(track) = self.track_mut(*extra) {
                track.track_type = TrackType::Aux;
                log::warn!("Demoted duplicate master {} to aux", extra);
                repairs += 1;
            }
        }

        for track in &mut self.tracks {
            track.sanitize();
            self.ids.reserve_id(track.id.0);
        }

        let track_ids: Vec<TrackId> = self.tracks.iter().map(|t| t.id).collect();
        let before = self.segments.len();
        self.segments.retain(|s| {
            let known = track_ids.contains(&s.track_id);
            if !known {
                log::warn!("Dropping orphan {} (missing {})", s.id, s.track_id);
            }
            known
        });
        repairs += before - self.segments.len();

        for segment in &mut self.segments {
            segment.sanitize();
            self.ids.reserve_id(segment.id.0);
            self.ids.reserve_version(segment.waveform_version);
        }

        repairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project_with_audio() -> (Project, TrackId, SegmentId) {
        let mut project = Project::new("station-1", "Morning Show");
        let track = project.add_track(TrackSpec::audio("Vox")).map(|t| t.id).unwrap();
        let segment = project
            .add_segment(SegmentSpec::new("file:///take.wav", track, 1000.0, 3000.0))
            .map(|s| s.id)
            .unwrap();
        (project, track, segment)
    }

    #[test]
    fn test_new_project_has_master() {
        let project = Project::new("s", "p");
        assert_eq!(project.tracks().len(), 1);
        assert!(project.master_track().is_some());
    }

    #[test]
    fn test_from_recording() {
        let project = Project::from_recording("s", "Take 1", "file:///rec.wav", 5000.0);
        assert_eq!(project.audio_track_count(), 1);
        assert_eq!(project.segments().len(), 1);
        assert_eq!(project.segments()[0].end_ms, 5000.0);
        assert_eq!(project.segments()[0].source_duration_ms, 5000.0);
    }

    #[test]
    fn test_master_is_unique_and_permanent() {
        let mut project = Project::new("s", "p");
        let master = project.master_track().map(|t| t.id).unwrap();
        assert!(project
            .add_track(TrackSpec { name: "M2".into(), track_type: TrackType::Master })
            .is_none());
        assert!(!project.remove_track(master));
        assert!(project.track(master).is_some());
    }

    #[test]
    fn test_audio_track_limit() {
        let mut project = Project::new("s", "p");
        for i in 0..MAX_AUDIO_TRACKS {
            assert!(project.add_track(TrackSpec::audio(format!("T{}", i))).is_some());
        }
        assert!(project.add_track(TrackSpec::audio("one too many")).is_none());
        assert!(project.add_track(TrackSpec::aux("FX")).is_some());
        assert_eq!(project.audio_track_count(), MAX_AUDIO_TRACKS);
    }

    #[test]
    fn test_new_track_index_is_appended() {
        let mut project = Project::new("s", "p");
        let a = project.add_track(TrackSpec::audio("A")).map(|t| t.index).unwrap();
        let b = project.add_track(TrackSpec::audio("B")).map(|t| t.index).unwrap();
        assert_eq!(a, 1);
        assert_eq!(b, 2);
    }

    #[test]
    fn test_remove_track_cascades() {
        let (mut project, track, _) = project_with_audio();
        let other = project.add_track(TrackSpec::aux("FX")).map(|t| t.id).unwrap();
        project.set_track_send(track, other, 0.5);
        project.add_segment(SegmentSpec::new("file:///b.wav", other, 0.0, 500.0));

        assert!(project.remove_track(other));
        assert!(project.segments().iter().all(|s| s.track_id != other));
        assert_eq!(project.segments().len(), 1);
        assert_eq!(project.track(track).unwrap().send_level(other), 0.0);
    }

    #[test]
    fn test_unknown_ids_are_noops() {
        let (mut project, _, _) = project_with_audio();
        let snapshot = project.clone();
        assert!(!project.remove_track(TrackId(999)));
        assert!(!project.update_track(TrackId(999), TrackPatch::default()));
        assert!(!project.remove_segment(SegmentId(999)));
        assert!(!project.resize_segment(SegmentId(999), 0.0, 10.0));
        assert!(!project.move_segment(SegmentId(999), TrackId(1), 0.0));
        assert!(project.set_segment_waveform(SegmentId(999), vec![]).is_none());
        assert_eq!(project.tracks, snapshot.tracks);
        assert_eq!(project.segments, snapshot.segments);
        assert_eq!(project.ids, snapshot.ids);
    }

    #[test]
    fn test_move_preserves_duration() {
        let (mut project, _, segment) = project_with_audio();
        let target = project.add_track(TrackSpec::audio("B")).map(|t| t.id).unwrap();

        assert!(project.move_segment(segment, target, 5000.0));
        let moved = project.segment(segment).unwrap();
        assert_eq!(moved.track_id, target);
        assert_eq!((moved.start_ms, moved.end_ms), (5000.0, 7000.0));

        assert!(!project.move_segment(segment, TrackId(999), 0.0));
        assert!(project.move_segment(segment, target, -300.0));
        assert_eq!(project.segment(segment).unwrap().start_ms, 0.0);
    }

    #[test]
    fn test_move_snaps() {
        let (mut project, track, segment) = project_with_audio();
        project.viewport.snap_enabled = true;
        project.viewport.snap_grid_ms = 250.0;
        project.move_segment(segment, track, 1130.0);
        assert_eq!(project.segment(segment).unwrap().start_ms, 1250.0);
    }

    #[test]
    fn test_resize_enforces_min_width() {
        let (mut project, _, segment) = project_with_audio();
        assert!(project.resize_segment(segment, 2950.0, 3000.0));
        let seg = project.segment(segment).unwrap();
        assert_eq!((seg.start_ms, seg.end_ms), (2900.0, 3000.0));

        project.resize_segment(segment, 10.0, 40.0);
        let seg = project.segment(segment).unwrap();
        assert_eq!((seg.start_ms, seg.end_ms), (0.0, 100.0));
    }

    #[test]
    fn test_non_finite_edits_keep_segment_valid() {
        let (mut project, track, segment) = project_with_audio();
        assert!(project.resize_segment(segment, 500.0, f64::NAN));
        let seg = project.segment(segment).unwrap();
        assert_eq!((seg.start_ms, seg.end_ms), (500.0, 3000.0));

        assert!(project.move_segment(segment, track, f64::INFINITY));
        let seg = project.segment(segment).unwrap();
        assert_eq!((seg.start_ms, seg.end_ms), (500.0, 3000.0));

        project.update_segment(
            segment,
            SegmentPatch {
                start_ms: Some(f64::NEG_INFINITY),
                end_ms: Some(f64::NAN),
                ..SegmentPatch::default()
            },
        );
        let seg = project.segment(segment).unwrap();
        assert_eq!((seg.start_ms, seg.end_ms), (500.0, 3000.0));
        assert!(project.duration_ms.is_finite());
    }

    #[test]
    fn test_update_segment_clamps_and_ignores_unknown_track() {
        let (mut project, track, segment) = project_with_audio();
        assert!(project.update_segment(
            segment,
            SegmentPatch {
                gain: Some(9.0),
                pan: Some(2.0),
                fade_in_ms: Some(10_000.0),
                track_id: Some(TrackId(999)),
                end_ms: Some(1020.0),
                ..SegmentPatch::default()
            }
        ));
        let seg = project.segment(segment).unwrap();
        assert_eq!(seg.gain, 2.0);
        assert_eq!(seg.pan, 1.0);
        assert_eq!(seg.track_id, track);
        assert!(seg.duration_ms() >= crate::MIN_SEGMENT_MS);
        assert!(seg.fade_in_ms <= seg.duration_ms());
    }

    #[test]
    fn test_reorder_tracks() {
        let mut project = Project::new("s", "p");
        let master = project.master_track().map(|t| t.id).unwrap();
        let a = project.add_track(TrackSpec::audio("A")).map(|t| t.id).unwrap();
        let b = project.add_track(TrackSpec::audio("B")).map(|t| t.id).unwrap();

        project.reorder_tracks(&[b, TrackId(999), a]);
        let order: Vec<TrackId> = project.tracks().iter().map(|t| t.id).collect();
        assert_eq!(order, vec![b, a, master]);
    }

    #[test]
    fn test_waveform_versions_increase() {
        let (mut project, _, segment) = project_with_audio();
        let v1 = project.set_segment_waveform(segment, vec![0.1, 0.2]).unwrap();
        let v2 = project.set_processed_waveform(segment, vec![0.1]).unwrap();
        let v3 = project.invalidate_waveform(segment).unwrap();
        assert!(v1 < v2 && v2 < v3);
        assert!(project.segment(segment).unwrap().processed_waveform.is_none());
        assert!(project.segment(segment).unwrap().waveform.is_some());
    }

    #[test]
    fn test_automation_lifecycle() {
        let (mut project, track, _) = project_with_audio();
        assert!(project.add_automation_point(track, 100.0, 0.5).is_none());
        assert!(project.enable_automation(track, 1.0));
        assert_eq!(project.add_automation_point(track, 1500.0, 0.5), Some(1));
        assert!(project.remove_automation_point(track, 1));
        assert!(!project.remove_automation_point(track, 0));
        assert!(project.update_automation_point(track, 0, 4000.0, 0.2));

        let curve = project.track(track).unwrap().automation.as_ref().unwrap();
        assert!(curve.points().windows(2).all(|w| w[0].time_ms <= w[1].time_ms));
        assert!(project.disable_automation(track));
    }

    #[test]
    fn test_validate_repairs() {
        let (mut project, track, segment) = project_with_audio();
        project.segments[0].track_id = TrackId(777);
        project.tracks.retain(|t| !t.is_master());
        project.tracks[0].gain = 7.0;

        let repairs = project.validate();
        assert_eq!(repairs, 2);
        assert!(project.master_track().is_some());
        assert!(project.segment(segment).is_none());
        assert_eq!(project.track(track).unwrap().gain, 2.0);
    }
}

//! Render job definitions

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use wd_dsp::ChainSettings;
use wd_state::{Project, SegmentId};

use crate::error::{OfflineError, OfflineResult};

/// Unique job identifier
pub type JobId = u64;

static JOB_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Local path for a `file://` URI or a plain path
pub fn uri_to_path(uri: &str) -> PathBuf {
    PathBuf::from(uri.strip_prefix("file://").unwrap_or(uri))
}

// ═══════════════════════════════════════════════════════════════════════════════
// RENDER SOURCE
// ═══════════════════════════════════════════════════════════════════════════════

/// One input file and the window of it to render
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSource {
    pub path: PathBuf,
    /// Window start (ms), default start of file
    pub trim_start_ms: Option<f64>,
    /// Window end (ms), default end of file
    pub trim_end_ms: Option<f64>,
    /// Linear clip gain applied before the effects chain
    pub gain: f64,
}

impl RenderSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            trim_start_ms: None,
            trim_end_ms: None,
            gain: 1.0,
        }
    }

    pub fn trim(mut self, start_ms: f64, end_ms: f64) -> Self {
        self.trim_start_ms = Some(start_ms);
        self.trim_end_ms = Some(end_ms);
        self
    }

    pub fn trim_start(mut self, start_ms: f64) -> Self {
        self.trim_start_ms = Some(start_ms);
        self
    }

    pub fn trim_end(mut self, end_ms: f64) -> Self {
        self.trim_end_ms = Some(end_ms);
        self
    }

    pub fn gain(mut self, gain: f64) -> Self {
        self.gain = gain;
        self
    }

    fn validate(&self, index: usize) -> OfflineResult<()> {
        let bad_time = |t: Option<f64>| t.is_some_and(|t| !t.is_finite() || t < 0.0);
        if bad_time(self.trim_start_ms) || bad_time(self.trim_end_ms) {
            return Err(OfflineError::InvalidConfig(format!(
                "source {} has a negative or non-finite trim",
                index
            )));
        }
        if let (Some(start), Some(end)) = (self.trim_start_ms, self.trim_end_ms) {
            if start >= end {
                return Err(OfflineError::InvalidConfig(format!(
                    "source {} has an empty range ({} ms..{} ms)",
                    index, start, end
                )));
            }
        }
        if !self.gain.is_finite() || self.gain < 0.0 {
            return Err(OfflineError::InvalidConfig(format!(
                "source {} has invalid gain {}",
                index, self.gain
            )));
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RENDER JOB
// ═══════════════════════════════════════════════════════════════════════════════

/// Everything one render needs. Sources play back to back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderJob {
    pub id: JobId,
    pub name: String,
    pub sources: Vec<RenderSource>,
    pub output: PathBuf,
    pub chain: ChainSettings,
    /// Silence before the rendered audio (ms)
    pub pad_head_ms: f64,
    /// Silence after the rendered audio (ms)
    pub pad_tail_ms: f64,
}

impl RenderJob {
    pub fn builder() -> RenderJobBuilder {
        RenderJobBuilder::new()
    }

    /// Job for one timeline segment: its source window, gain, fades and
    /// curve, with the owning track's effect settings.
    pub fn from_segment(
        project: &Project,
        segment_id: SegmentId,
        output: impl Into<PathBuf>,
    ) -> OfflineResult<Self> {
        let segment = project
            .segment(segment_id)
            .ok_or_else(|| OfflineError::SegmentNotFound(segment_id.to_string()))?;
        let track = project
            .track(segment.track_id)
            .ok_or_else(|| OfflineError::TrackNotFound(segment.track_id.to_string()))?;

        let effects = &track.effects;
        let normalize_db = effects.normalize_gain_db();
        let chain = ChainSettings {
            normalize_gain_db: (normalize_db != 0.0).then_some(normalize_db),
            fade_in_ms: segment.fade_in_ms,
            fade_out_ms: segment.fade_out_ms,
            fade_curve: segment.fade_curve,
            gate: *effects.gate(),
            eq: *effects.eq(),
            compressor: *effects.compressor(),
        };

        let (window_start, window_end) = segment.source_window_ms();
        let gain = if segment.muted { 0.0 } else { segment.gain };

        RenderJob::builder()
            .name(format!("{} / {}", project.name, segment_id))
            .source(
                RenderSource::new(uri_to_path(&segment.uri))
                    .trim(window_start, window_end)
                    .gain(gain),
            )
            .output(output)
            .chain(chain)
            .build()
    }

    pub fn validate(&self) -> OfflineResult<()> {
        if self.sources.is_empty() {
            return Err(OfflineError::InvalidConfig("no sources".to_string()));
        }
        for (i, source) in self.sources.iter().enumerate() {
            source.validate(i)?;
        }
        if self.output.as_os_str().is_empty() {
            return Err(OfflineError::InvalidConfig("no output path".to_string()));
        }
        for pad in [self.pad_head_ms, self.pad_tail_ms] {
            if !pad.is_finite() || pad < 0.0 {
                return Err(OfflineError::InvalidConfig(format!("invalid padding {}", pad)));
            }
        }
        Ok(())
    }
}

/// Builder for [`RenderJob`]
#[derive(Debug, Default)]
pub struct RenderJobBuilder {
    name: Option<String>,
    sources: Vec<RenderSource>,
    output: Option<PathBuf>,
    chain: ChainSettings,
    pad_head_ms: f64,
    pad_tail_ms: f64,
}

impl RenderJobBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render the whole of `path`
    pub fn input<P: Into<PathBuf>>(self, path: P) -> Self {
        self.source(RenderSource::new(path))
    }

    /// Append a source
    pub fn source(mut self, source: RenderSource) -> Self {
        self.sources.push(source);
        self
    }

    pub fn output<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output = Some(path.into());
        self
    }

    pub fn chain(mut self, chain: ChainSettings) -> Self {
        self.chain = chain;
        self
    }

    /// Silence around the rendered audio
    pub fn pad(mut self, head_ms: f64, tail_ms: f64) -> Self {
        self.pad_head_ms = head_ms;
        self.pad_tail_ms = tail_ms;
        self
    }

    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn build(self) -> OfflineResult<RenderJob> {
        let output = self
            .output
            .ok_or_else(|| OfflineError::InvalidConfig("output path required".to_string()))?;
        let id = JOB_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        let name = self.name.unwrap_or_else(|| default_name(&output, id));

        let job = RenderJob {
            id,
            name,
            sources: self.sources,
            output,
            chain: self.chain,
            pad_head_ms: self.pad_head_ms,
            pad_tail_ms: self.pad_tail_ms,
        };
        job.validate()?;
        Ok(job)
    }
}

fn default_name(output: &Path, id: JobId) -> String {
    output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("render-{}", id))
}

// ═══════════════════════════════════════════════════════════════════════════════
// RESULTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Summary of a finished render
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderReport {
    pub job_id: JobId,
    pub output: PathBuf,
    /// Frames written, padding included
    pub frames: usize,
    pub channels: usize,
    pub sample_rate: u32,
    pub duration_ms: f64,
    /// Sample peak (dBFS)
    pub peak_db: f64,
    /// Integrated loudness (LUFS)
    pub lufs: f64,
    pub waveform: Vec<f32>,
}

/// How a render ended when it did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    Completed(RenderReport),
    Cancelled,
}

impl RenderOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RenderOutcome::Cancelled)
    }

    pub fn report(&self) -> Option<&RenderReport> {
        match self {
            RenderOutcome::Completed(report) => Some(report),
            RenderOutcome::Cancelled => None,
        }
    }
}

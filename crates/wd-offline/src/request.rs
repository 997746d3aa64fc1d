//! JSON render requests, sidecars and job status
//!
//! These are the wire shapes exchanged with the host app, so field names
//! are camelCase.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wd_dsp::ChainSettings;

use crate::error::{OfflineError, OfflineResult};
use crate::job::{uri_to_path, RenderJob, RenderOutcome, RenderSource};

/// One slice of a source to render
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSegment {
    pub uri: String,
    pub start_ms: f64,
    pub end_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gain_db: Option<f64>,
}

/// Effects requested for a render
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RequestFx {
    pub normalize_gain_db: Option<f64>,
    pub fade_in_ms: Option<f64>,
    pub fade_out_ms: Option<f64>,
    pub pad_head_ms: Option<f64>,
    pub pad_tail_ms: Option<f64>,
}

impl RequestFx {
    /// True when any field asks for a change to the audio
    pub fn has_effects(&self) -> bool {
        let positive = |v: Option<f64>| v.is_some_and(|v| v > 0.0);
        self.normalize_gain_db.is_some()
            || positive(self.fade_in_ms)
            || positive(self.fade_out_ms)
            || positive(self.pad_head_ms)
            || positive(self.pad_tail_ms)
    }

    pub fn chain_settings(&self) -> ChainSettings {
        let mut chain = ChainSettings::default().with_fades(
            self.fade_in_ms.unwrap_or(0.0),
            self.fade_out_ms.unwrap_or(0.0),
        );
        if let Some(db) = self.normalize_gain_db {
            chain = chain.with_normalize(db);
        }
        chain
    }
}

/// Render request sent by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    pub base_uri: String,
    #[serde(default)]
    pub segments: Vec<RequestSegment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fx: Option<RequestFx>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_ext: Option<String>,
}

impl RenderRequest {
    pub fn from_json(json: &str) -> OfflineResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> OfflineResult<Self> {
        Ok(wd_file::read_json(path)?)
    }

    /// Requested effects, empty when none were sent
    pub fn fx(&self) -> RequestFx {
        self.fx.clone().unwrap_or_default()
    }

    /// True when the base and every segment source are `.wav` files
    pub fn is_wav(&self) -> bool {
        std::iter::once(self.base_uri.as_str())
            .chain(self.segments.iter().map(|s| s.uri.as_str()))
            .all(has_wav_extension)
    }

    /// DSP runs only for WAV input with at least one effect; everything
    /// else is a plain copy of the base file.
    pub fn wants_dsp(&self) -> bool {
        self.is_wav() && self.fx().has_effects()
    }

    /// Extension of the produced file
    pub fn output_extension(&self) -> String {
        if let Some(ext) = &self.out_ext {
            return ext.trim_start_matches('.').to_string();
        }
        if self.wants_dsp() {
            return "wav".to_string();
        }
        uri_to_path(&self.base_uri)
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| "wav".to_string())
    }

    /// Job rendering the segments back to back, or the whole base file
    /// when there are none.
    pub fn to_job(&self, output: impl Into<PathBuf>) -> OfflineResult<RenderJob> {
        let fx = self.fx();
        let mut builder = RenderJob::builder()
            .output(output)
            .chain(fx.chain_settings())
            .pad(fx.pad_head_ms.unwrap_or(0.0), fx.pad_tail_ms.unwrap_or(0.0));

        if self.segments.is_empty() {
            builder = builder.input(uri_to_path(&self.base_uri));
        }
        for segment in &self.segments {
            if segment.end_ms <= segment.start_ms {
                return Err(OfflineError::InvalidRequest(format!(
                    "segment {} has end {} <= start {}",
                    segment.uri, segment.end_ms, segment.start_ms
                )));
            }
            let gain = wd_core::db_to_gain(segment.gain_db.unwrap_or(0.0));
            builder = builder.source(
                RenderSource::new(uri_to_path(&segment.uri))
                    .trim(segment.start_ms, segment.end_ms)
                    .gain(gain),
            );
        }
        builder.build()
    }
}

fn has_wav_extension(uri: &str) -> bool {
    uri_to_path(uri)
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("wav"))
}

// ═══════════════════════════════════════════════════════════════════════════════
// SIDECAR
// ═══════════════════════════════════════════════════════════════════════════════

/// Written next to a rendered file as `<output>.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderSidecar {
    pub baked: bool,
    pub normalize_gain_db: Option<f64>,
    pub fade_in_ms: f64,
    pub fade_out_ms: f64,
    pub created_at: DateTime<Utc>,
}

impl RenderSidecar {
    pub fn new(fx: &RequestFx) -> Self {
        Self {
            baked: true,
            normalize_gain_db: fx.normalize_gain_db,
            fade_in_ms: fx.fade_in_ms.unwrap_or(0.0),
            fade_out_ms: fx.fade_out_ms.unwrap_or(0.0),
            created_at: Utc::now(),
        }
    }

    /// `<output>.json`, e.g. `take.wav.json`
    pub fn path_for(output: &Path) -> PathBuf {
        let mut name = output.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".json");
        output.with_file_name(name)
    }

    pub fn write(&self, output: &Path) -> OfflineResult<PathBuf> {
        let path = Self::path_for(output);
        wd_file::write_json(&path, self)?;
        Ok(path)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// JOB STATUS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Rendering,
    Done,
    Failed,
    Cancelled,
}

/// Status reported back to the host for a render job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatusReport {
    pub status: JobStatus,
    pub lufs: Option<f64>,
    pub waveform: Vec<f32>,
}

impl JobStatusReport {
    pub fn from_outcome(outcome: &OfflineResult<RenderOutcome>) -> Self {
        match outcome {
            Ok(RenderOutcome::Completed(report)) => Self {
                status: JobStatus::Done,
                lufs: report.lufs.is_finite().then_some(report.lufs),
                waveform: report.waveform.clone(),
            },
            Ok(RenderOutcome::Cancelled) => Self::empty(JobStatus::Cancelled),
            Err(_) => Self::empty(JobStatus::Failed),
        }
    }

    pub fn empty(status: JobStatus) -> Self {
        Self {
            status,
            lufs: None,
            waveform: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_request() {
        let json = r#"{
            "baseUri": "file:///rec/show.wav",
            "segments": [
                { "uri": "file:///rec/show.wav", "startMs": 1000, "endMs": 4000 },
                { "uri": "file:///rec/bed.wav", "startMs": 0, "endMs": 2000, "gainDb": -6 }
            ],
            "fx": { "normalizeGainDb": -3, "fadeInMs": 100 },
            "outExt": "wav"
        }"#;
        let request = RenderRequest::from_json(json).unwrap();
        assert_eq!(request.segments.len(), 2);
        assert_eq!(request.segments[1].gain_db, Some(-6.0));
        assert!(request.wants_dsp());

        let job = request.to_job("/out/show.wav").unwrap();
        assert_eq!(job.sources.len(), 2);
        assert_eq!(job.sources[0].path, PathBuf::from("/rec/show.wav"));
        assert_eq!(job.sources[0].trim_start_ms, Some(1000.0));
        assert!((job.sources[1].gain - 0.501187).abs() < 1e-5);
        assert_eq!(job.chain.normalize_gain_db, Some(-3.0));
        assert_eq!(job.chain.fade_in_ms, 100.0);
    }

    #[test]
    fn test_minimal_request_renders_whole_base() {
        let request = RenderRequest::from_json(r#"{ "baseUri": "/rec/a.wav" }"#).unwrap();
        assert!(!request.wants_dsp());
        let job = request.to_job("/out/a.wav").unwrap();
        assert_eq!(job.sources.len(), 1);
        assert_eq!(job.sources[0].trim_start_ms, None);
    }

    #[test]
    fn test_non_wav_skips_dsp() {
        let request = RenderRequest::from_json(
            r#"{ "baseUri": "/rec/a.m4a", "fx": { "fadeInMs": 200 } }"#,
        )
        .unwrap();
        assert!(!request.is_wav());
        assert!(!request.wants_dsp());
        assert_eq!(request.output_extension(), "m4a");
    }

    #[test]
    fn test_inverted_segment_rejected() {
        let request = RenderRequest::from_json(
            r#"{ "baseUri": "/a.wav", "segments": [{ "uri": "/a.wav", "startMs": 500, "endMs": 100 }] }"#,
        )
        .unwrap();
        assert!(matches!(
            request.to_job("/out.wav"),
            Err(OfflineError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_sidecar_shape() {
        let fx = RequestFx {
            normalize_gain_db: Some(-1.5),
            fade_out_ms: Some(300.0),
            ..RequestFx::default()
        };
        let value = serde_json::to_value(RenderSidecar::new(&fx)).unwrap();
        assert_eq!(value["baked"], true);
        assert_eq!(value["normalizeGainDb"], -1.5);
        assert_eq!(value["fadeInMs"], 0.0);
        assert_eq!(value["fadeOutMs"], 300.0);
        assert!(value["createdAt"].is_string());

        assert_eq!(
            RenderSidecar::path_for(Path::new("/out/take.wav")),
            PathBuf::from("/out/take.wav.json")
        );
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let value = serde_json::to_value(JobStatusReport::empty(JobStatus::Cancelled)).unwrap();
        assert_eq!(value["status"], "cancelled");
        assert!(value["lufs"].is_null());
    }
}

//! Render service: requests in, files (and uploads) out

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use uuid::Uuid;
use wd_file::{cache_key, partial_path, MetadataCache, WavInfo, WaveformCache};

use crate::cancel::CancellationToken;
use crate::config::OfflineConfig;
use crate::error::{OfflineError, OfflineResult};
use crate::job::{uri_to_path, RenderOutcome, RenderReport};
use crate::pipeline::{OfflinePipeline, ProgressReport};
use crate::request::{JobStatus, JobStatusReport, RenderRequest, RenderSidecar};
use crate::upload::{UploadItem, UploadQueue};

/// How an export produced its file
#[derive(Debug, Clone, PartialEq)]
pub enum ExportKind {
    /// Effects were rendered into the file
    Rendered(RenderReport),
    /// The base file was copied unchanged
    Copied,
    /// The render was cancelled; no file was produced
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportResult {
    pub output: PathBuf,
    pub kind: ExportKind,
    /// Set when the file was handed to the upload queue
    pub upload_id: Option<Uuid>,
}

struct UploadTarget {
    queue: Arc<dyn UploadQueue>,
    station_id: String,
}

/// Runs render requests and hands results to an optional upload queue.
/// Format probes and waveform peaks go through the service's caches.
pub struct RenderService {
    config: OfflineConfig,
    metadata: Arc<MetadataCache>,
    waveforms: Arc<WaveformCache>,
    upload: Option<UploadTarget>,
}

impl RenderService {
    pub fn new(config: OfflineConfig) -> Self {
        Self {
            config,
            metadata: Arc::new(MetadataCache::default()),
            waveforms: Arc::new(WaveformCache::default()),
            upload: None,
        }
    }

    /// Share caches with the host (or other services)
    pub fn with_caches(
        mut self,
        metadata: Arc<MetadataCache>,
        waveforms: Arc<WaveformCache>,
    ) -> Self {
        self.metadata = metadata;
        self.waveforms = waveforms;
        self
    }

    /// Queue every exported file for upload under `station_id`
    pub fn with_upload_queue(
        mut self,
        queue: Arc<dyn UploadQueue>,
        station_id: impl Into<String>,
    ) -> Self {
        self.upload = Some(UploadTarget {
            queue,
            station_id: station_id.into(),
        });
        self
    }

    pub fn config(&self) -> &OfflineConfig {
        &self.config
    }

    /// Format of a WAV file, cached by path
    pub fn probe(&self, path: &Path) -> OfflineResult<WavInfo> {
        Ok(self.metadata.probe(path)?)
    }

    /// Waveform peaks of a WAV file, cached by path
    pub fn waveform(&self, path: &Path) -> OfflineResult<Arc<[f32]>> {
        Ok(self.waveforms.peaks_for(path, self.config.waveform_points)?)
    }

    /// Status for the host. Copies carry the peaks of the copied file when
    /// it is a readable WAV.
    pub fn status(&self, result: &ExportResult) -> JobStatusReport {
        match &result.kind {
            ExportKind::Rendered(report) => {
                JobStatusReport::from_outcome(&Ok(RenderOutcome::Completed(report.clone())))
            }
            ExportKind::Copied => {
                let mut status = JobStatusReport::empty(JobStatus::Done);
                match self.waveform(&result.output) {
                    Ok(waveform) => status.waveform = waveform.to_vec(),
                    Err(e) => log::debug!("No waveform for {}: {}", result.output.display(), e),
                }
                status
            }
            ExportKind::Cancelled => JobStatusReport::empty(JobStatus::Cancelled),
        }
    }

    /// Drop cached entries for a file that was just (re)written
    fn forget(&self, path: &Path) {
        let key = cache_key(path);
        self.metadata.remove(&key);
        self.waveforms.remove(&key);
    }

    /// Render a request through the pipeline and write the sidecar on
    /// success. Sources are probed first so unreadable input fails before
    /// any decoding. No fallback; a sidecar that cannot be written is only
    /// logged.
    pub fn render_request<F>(
        &self,
        request: &RenderRequest,
        output: &Path,
        token: &CancellationToken,
        on_progress: F,
    ) -> OfflineResult<RenderOutcome>
    where
        F: FnMut(&ProgressReport),
    {
        let job = request.to_job(output)?;
        for source in &job.sources {
            self.probe(&source.path)?;
        }
        let mut pipeline = OfflinePipeline::new(self.config.clone());
        let outcome = pipeline.render(&job, token, on_progress)?;

        if let RenderOutcome::Completed(report) = &outcome {
            self.forget(&report.output);
            self.waveforms.insert(cache_key(&report.output), report.waveform.as_slice().into());

            if self.config.write_sidecar {
                match RenderSidecar::new(&request.fx()).write(&report.output) {
                    Ok(sidecar) => log::debug!("Wrote sidecar {}", sidecar.display()),
                    Err(e) => log::warn!(
                        "Rendered {} but could not write its sidecar: {}",
                        report.output.display(),
                        e
                    ),
                }
            }
        }
        Ok(outcome)
    }

    /// Produce an output file for `request`, always. Requests that need no
    /// DSP are copied; a failed render logs a warning and falls back to a
    /// copy of the base file. Cancellation does not fall back.
    pub fn export<F>(
        &self,
        request: &RenderRequest,
        output: &Path,
        token: &CancellationToken,
        on_progress: F,
    ) -> OfflineResult<ExportResult>
    where
        F: FnMut(&ProgressReport),
    {
        let kind = if request.wants_dsp() {
            match self.render_request(request, output, token, on_progress) {
                Ok(RenderOutcome::Completed(report)) => ExportKind::Rendered(report),
                Ok(RenderOutcome::Cancelled) => {
                    return Ok(ExportResult {
                        output: output.to_path_buf(),
                        kind: ExportKind::Cancelled,
                        upload_id: None,
                    });
                }
                Err(e) => {
                    log::warn!("Render failed, exporting original instead: {}", e);
                    copy_original(&request.base_uri, output)?;
                    self.forget(output);
                    ExportKind::Copied
                }
            }
        } else {
            copy_original(&request.base_uri, output)?;
            self.forget(output);
            ExportKind::Copied
        };

        let upload_id = self.hand_off(output, &kind)?;
        Ok(ExportResult {
            output: output.to_path_buf(),
            kind,
            upload_id,
        })
    }

    fn hand_off(&self, output: &Path, kind: &ExportKind) -> OfflineResult<Option<Uuid>> {
        let Some(target) = &self.upload else {
            return Ok(None);
        };
        let baked = matches!(kind, ExportKind::Rendered(_));
        let metadata = serde_json::json!({ "baked": baked });
        let item = UploadItem::new(
            target.station_id.clone(),
            format!("file://{}", output.display()),
            metadata,
        );
        let id = target.queue.enqueue(item)?;
        log::info!("Queued {} for upload ({})", output.display(), id);
        Ok(Some(id))
    }
}

/// Copy the base file to `output` through a `.part` sibling
fn copy_original(base_uri: &str, output: &Path) -> OfflineResult<()> {
    let source = uri_to_path(base_uri);
    if !source.exists() {
        return Err(OfflineError::InputNotFound(source.display().to_string()));
    }
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let partial = partial_path(output);
    let result = fs::copy(&source, &partial).and_then(|_| fs::rename(&partial, output));
    if let Err(e) = result {
        let _ = fs::remove_file(&partial);
        return Err(e.into());
    }
    Ok(())
}

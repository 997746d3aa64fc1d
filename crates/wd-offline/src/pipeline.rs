//! Offline render pipeline
//!
//! Runs one [`RenderJob`] through a fixed sequence of stages:
//! 1. Load every source through the WAV codec
//! 2. Analyze: resolve trim windows, check formats agree
//! 3. Process block by block through one effects chain per channel
//! 4. Save: pad, encode and write via a `.part` file
//!
//! Progress is reported through a caller-supplied callback and only ever
//! moves forward. Cancellation is polled before each block.

use std::ops::Range;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use wd_core::{gain_to_db, ms_to_samples, samples_to_ms};
use wd_dsp::EffectsChain;
use wd_file::{encode_wav, peaks, read_wav, write_atomic, AudioBuffer};

use crate::analysis::integrated_loudness;
use crate::cancel::CancellationToken;
use crate::config::OfflineConfig;
use crate::error::{OfflineError, OfflineResult};
use crate::job::{RenderJob, RenderOutcome, RenderReport};

/// Status text of the final report of a cancelled render
pub const CANCELLED_STATUS: &str = "Processing cancelled";

// Progress reached at the end of each stage
const LOAD_END: f64 = 0.2;
const ANALYZE_END: f64 = 0.3;
const PROCESS_END: f64 = 0.8;
const ENCODE_END: f64 = 0.9;

// ═══════════════════════════════════════════════════════════════════════════════
// PIPELINE STATE
// ═══════════════════════════════════════════════════════════════════════════════

/// Pipeline execution state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PipelineState {
    #[default]
    Idle,
    Loading,
    Analyzing,
    Processing,
    Saving,
    Done,
    Failed,
    Cancelled,
}

impl PipelineState {
    /// True once no further transitions can happen
    pub fn is_finished(self) -> bool {
        matches!(
            self,
            PipelineState::Done | PipelineState::Failed | PipelineState::Cancelled
        )
    }
}

/// One progress notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressReport {
    pub state: PipelineState,
    /// Overall progress, 0.0 - 1.0
    pub progress: f64,
    pub status: String,
}

/// Wraps the caller's callback and keeps progress non-decreasing
struct ProgressTracker<'a> {
    callback: &'a mut dyn FnMut(&ProgressReport),
    last: f64,
}

impl<'a> ProgressTracker<'a> {
    fn new(callback: &'a mut dyn FnMut(&ProgressReport)) -> Self {
        Self { callback, last: 0.0 }
    }

    fn report(&mut self, state: PipelineState, progress: f64, status: impl Into<String>) {
        let progress = progress.clamp(0.0, 1.0).max(self.last);
        self.last = progress;
        (self.callback)(&ProgressReport {
            state,
            progress,
            status: status.into(),
        });
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// OFFLINE PIPELINE
// ═══════════════════════════════════════════════════════════════════════════════

/// Single-render pipeline. Reusable; each call to [`render`](Self::render)
/// starts from fresh chain state.
pub struct OfflinePipeline {
    config: OfflineConfig,
    state: PipelineState,
}

impl OfflinePipeline {
    pub fn new(config: OfflineConfig) -> Self {
        Self {
            config,
            state: PipelineState::Idle,
        }
    }

    pub fn config(&self) -> &OfflineConfig {
        &self.config
    }

    /// State reached by the last render
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Render `job`. Cancellation is `Ok(RenderOutcome::Cancelled)`; every
    /// failure is an error and leaves no output file behind.
    pub fn render<F>(
        &mut self,
        job: &RenderJob,
        token: &CancellationToken,
        mut on_progress: F,
    ) -> OfflineResult<RenderOutcome>
    where
        F: FnMut(&ProgressReport),
    {
        let mut tracker = ProgressTracker::new(&mut on_progress);
        match self.run(job, token, &mut tracker) {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                log::error!("Render job {} failed: {}", job.id, e);
                self.state = PipelineState::Failed;
                let last = tracker.last;
                tracker.report(PipelineState::Failed, last, e.to_string());
                Err(e)
            }
        }
    }

    fn enter(
        &mut self,
        tracker: &mut ProgressTracker<'_>,
        state: PipelineState,
        progress: f64,
        status: &str,
    ) {
        log::debug!("Pipeline {:?} -> {:?}", self.state, state);
        self.state = state;
        tracker.report(state, progress, status);
    }

    fn run(
        &mut self,
        job: &RenderJob,
        token: &CancellationToken,
        tracker: &mut ProgressTracker<'_>,
    ) -> OfflineResult<RenderOutcome> {
        self.state = PipelineState::Idle;
        self.config.validate()?;
        job.validate()?;

        // Loading
        self.enter(tracker, PipelineState::Loading, 0.0, "Loading audio");
        let count = job.sources.len();
        let mut buffers = Vec::with_capacity(count);
        for (i, source) in job.sources.iter().enumerate() {
            buffers.push(read_wav(&source.path)?);
            tracker.report(
                PipelineState::Loading,
                LOAD_END * (i + 1) as f64 / count as f64,
                format!("Loaded {}", source.path.display()),
            );
        }

        // Analyzing
        self.enter(tracker, PipelineState::Analyzing, LOAD_END, "Analyzing audio");
        let ranges = resolve_ranges(job, &buffers)?;
        tracker.report(PipelineState::Analyzing, ANALYZE_END, "Analysis complete");

        // Processing
        self.enter(tracker, PipelineState::Processing, ANALYZE_END, "Processing audio");
        let Some(rendered) = self.process(job, &buffers, &ranges, token, tracker) else {
            log::info!("Render job {} cancelled", job.id);
            self.state = PipelineState::Cancelled;
            let last = tracker.last;
            tracker.report(PipelineState::Cancelled, last, CANCELLED_STATUS);
            return Ok(RenderOutcome::Cancelled);
        };

        // Saving
        self.enter(tracker, PipelineState::Saving, PROCESS_END, "Saving");
        let sample_rate = buffers.first().map(|b| b.sample_rate).unwrap_or_default();
        let head = ms_to_samples(job.pad_head_ms, sample_rate);
        let tail = ms_to_samples(job.pad_tail_ms, sample_rate);
        let data = rendered
            .into_iter()
            .map(|channel| {
                let mut padded = Vec::with_capacity(head + channel.len() + tail);
                padded.resize(head, 0.0);
                padded.extend(channel);
                padded.resize(padded.len() + tail, 0.0);
                padded
            })
            .collect();
        let output = AudioBuffer::from_channels(data, sample_rate)?;
        let bytes = encode_wav(&output)?;
        tracker.report(PipelineState::Saving, ENCODE_END, "Writing file");
        write_atomic(&job.output, &bytes)?;

        let report = RenderReport {
            job_id: job.id,
            output: job.output.clone(),
            frames: output.length,
            channels: output.channels,
            sample_rate,
            duration_ms: output.duration_ms(),
            peak_db: gain_to_db(output.peak() as f64),
            lufs: integrated_loudness(&output),
            waveform: peaks(&output, self.config.waveform_points),
        };
        self.enter(tracker, PipelineState::Done, 1.0, "Render complete");
        log::info!(
            "Rendered {} ({} frames, {:.1} LUFS) to {}",
            job.name,
            report.frames,
            report.lufs,
            report.output.display()
        );
        Ok(RenderOutcome::Completed(report))
    }

    /// Run every source window through the chains. `None` when cancelled.
    fn process(
        &mut self,
        job: &RenderJob,
        buffers: &[AudioBuffer],
        ranges: &[Range<usize>],
        token: &CancellationToken,
        tracker: &mut ProgressTracker<'_>,
    ) -> Option<Vec<Vec<f32>>> {
        let (sample_rate, channels) = buffers
            .first()
            .map(|b| (b.sample_rate, b.channels))
            .unwrap_or_default();
        let block_size = self.config.block_size;
        let total: usize = ranges.iter().map(|r| r.len()).sum();
        let total_blocks: usize = ranges.iter().map(|r| r.len().div_ceil(block_size)).sum();
        let window_end_ms = samples_to_ms(total, sample_rate);
        let chain_active = job.chain.has_effects();

        let mut chains: Vec<EffectsChain> = (0..channels)
            .map(|_| EffectsChain::new(job.chain, sample_rate as f64))
            .collect();
        let mut out: Vec<Vec<f32>> = (0..channels).map(|_| Vec::with_capacity(total)).collect();

        let mut done = 0;
        let mut block = 0;
        for ((buffer, range), source) in buffers.iter().zip(ranges).zip(&job.sources) {
            let clip_gain = source.gain;
            let mut pos = range.start;
            while pos < range.end {
                if token.is_cancelled() {
                    return None;
                }
                let end = (pos + block_size).min(range.end);

                for ((input, output), chain) in buffer
                    .data
                    .iter()
                    .zip(out.iter_mut())
                    .zip(chains.iter_mut())
                {
                    for (i, &sample) in input[pos..end].iter().enumerate() {
                        let s = sample as f64;
                        let magnitude = s.abs() * clip_gain;
                        let shaped = if chain_active {
                            let time_ms = samples_to_ms(done + i, sample_rate);
                            chain.process(magnitude, time_ms, 0.0, window_end_ms)
                        } else {
                            magnitude
                        };
                        let value = if s == 0.0 || clip_gain == 0.0 {
                            0.0
                        } else {
                            shaped.copysign(s)
                        };
                        output.push(value as f32);
                    }
                }

                done += end - pos;
                pos = end;
                block += 1;
                tracker.report(
                    PipelineState::Processing,
                    ANALYZE_END + (PROCESS_END - ANALYZE_END) * done as f64 / total as f64,
                    format!("Processing block {}/{}", block, total_blocks),
                );
            }
        }
        Some(out)
    }
}

/// Frame range of every source, after checking all sources agree on
/// sample rate and channel count.
fn resolve_ranges(job: &RenderJob, buffers: &[AudioBuffer]) -> OfflineResult<Vec<Range<usize>>> {
    let first = buffers
        .first()
        .ok_or_else(|| OfflineError::InvalidConfig("no sources".to_string()))?;

    buffers
        .iter()
        .zip(&job.sources)
        .enumerate()
        .map(|(i, (buffer, source))| {
            if buffer.sample_rate != first.sample_rate {
                return Err(OfflineError::SampleRateMismatch {
                    expected: first.sample_rate,
                    actual: buffer.sample_rate,
                });
            }
            if buffer.channels != first.channels {
                return Err(OfflineError::ChannelMismatch {
                    expected: first.channels,
                    actual: buffer.channels,
                });
            }

            let to_frames = |ms: f64| ms_to_samples(ms, buffer.sample_rate).min(buffer.length);
            let start = source.trim_start_ms.map(to_frames).unwrap_or(0);
            let end = source.trim_end_ms.map(to_frames).unwrap_or(buffer.length);
            if start >= end {
                return Err(OfflineError::InvalidConfig(format!(
                    "source {} has an empty range (frames {}..{} of {})",
                    i, start, end, buffer.length
                )));
            }
            Ok(start..end)
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// BATCH RENDERER
// ═══════════════════════════════════════════════════════════════════════════════

/// Renders independent jobs concurrently, one pipeline per job
pub struct BatchRenderer {
    config: OfflineConfig,
}

impl BatchRenderer {
    pub fn new(config: OfflineConfig) -> Self {
        Self { config }
    }

    /// Render all jobs; results come back in job order. One token cancels
    /// the whole batch.
    pub fn render_all(
        &self,
        jobs: &[RenderJob],
        token: &CancellationToken,
    ) -> Vec<OfflineResult<RenderOutcome>> {
        let render = |job: &RenderJob| {
            let mut pipeline = OfflinePipeline::new(self.config.clone());
            pipeline.render(job, token, |report: &ProgressReport| {
                log::trace!("job {}: {:?} {:.2}", job.id, report.state, report.progress);
            })
        };

        if self.config.max_parallel_jobs == 0 {
            return jobs.par_iter().map(&render).collect();
        }

        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.max_parallel_jobs)
            .build()
        {
            Ok(pool) => pool.install(|| jobs.par_iter().map(&render).collect()),
            Err(e) => {
                log::warn!("Falling back to the global pool: {}", e);
                jobs.par_iter().map(&render).collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::RenderSource;

    fn write_tone(
        dir: &std::path::Path,
        name: &str,
        frames: usize,
        sample_rate: u32,
    ) -> std::path::PathBuf {
        let data: Vec<f32> = (0..frames).map(|i| if i % 2 == 0 { 0.5 } else { -0.5 }).collect();
        let buffer = AudioBuffer::from_channels(vec![data], sample_rate).unwrap();
        let path = dir.join(name);
        wd_file::write_wav(&path, &buffer).unwrap();
        path
    }

    #[test]
    fn test_plain_trim_is_bit_exact() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_tone(dir.path(), "in.wav", 8000, 8000);
        let job = RenderJob::builder()
            .source(RenderSource::new(&input).trim(250.0, 750.0))
            .output(dir.path().join("out.wav"))
            .build()
            .unwrap();

        let mut pipeline = OfflinePipeline::new(OfflineConfig::default());
        let outcome = pipeline.render(&job, &CancellationToken::new(), |_| {}).unwrap();
        assert_eq!(pipeline.state(), PipelineState::Done);

        let report = outcome.report().unwrap();
        assert_eq!(report.frames, 4000);
        let out = read_wav(&report.output).unwrap();
        let original = read_wav(&input).unwrap();
        assert_eq!(out.data[0], original.data[0][2000..6000].to_vec());
    }

    #[test]
    fn test_padding() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_tone(dir.path(), "in.wav", 1000, 8000);
        let job = RenderJob::builder()
            .input(&input)
            .output(dir.path().join("out.wav"))
            .pad(125.0, 250.0)
            .build()
            .unwrap();

        let outcome = OfflinePipeline::new(OfflineConfig::default())
            .render(&job, &CancellationToken::new(), |_| {})
            .unwrap();
        let out = read_wav(&outcome.report().unwrap().output).unwrap();
        assert_eq!(out.length, 1000 + 1000 + 2000);
        assert!(out.data[0][..1000].iter().all(|&s| s == 0.0));
        assert!(out.data[0][2000..].iter().all(|&s| s == 0.0));
        assert!((out.data[0][1000] - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_sources_play_back_to_back() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_tone(dir.path(), "a.wav", 300, 8000);
        let b = write_tone(dir.path(), "b.wav", 500, 8000);
        let job = RenderJob::builder()
            .input(&a)
            .source(RenderSource::new(&b).gain(0.5))
            .output(dir.path().join("out.wav"))
            .build()
            .unwrap();

        let outcome = OfflinePipeline::new(OfflineConfig::default().with_block_size(128))
            .render(&job, &CancellationToken::new(), |_| {})
            .unwrap();
        let out = read_wav(&outcome.report().unwrap().output).unwrap();
        assert_eq!(out.length, 800);
        assert!((out.data[0][299] + 0.5).abs() < 1e-4);
        assert!((out.data[0][300] - 0.25).abs() < 1e-4);
    }

    #[test]
    fn test_mismatched_sources_fail() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_tone(dir.path(), "a.wav", 300, 8000);
        let b = write_tone(dir.path(), "b.wav", 300, 16000);
        let output = dir.path().join("out.wav");
        let job = RenderJob::builder().input(&a).input(&b).output(&output).build().unwrap();

        let mut states = Vec::new();
        let result = OfflinePipeline::new(OfflineConfig::default())
            .render(&job, &CancellationToken::new(), |r| states.push(r.state));
        assert!(matches!(result, Err(OfflineError::SampleRateMismatch { .. })));
        assert_eq!(states.last(), Some(&PipelineState::Failed));
        assert!(!output.exists());
    }

    #[test]
    fn test_trim_past_end_is_empty_range() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_tone(dir.path(), "in.wav", 100, 1000);
        let job = RenderJob::builder()
            .source(RenderSource::new(&input).trim(500.0, 900.0))
            .output(dir.path().join("out.wav"))
            .build()
            .unwrap();
        let result = OfflinePipeline::new(OfflineConfig::default())
            .render(&job, &CancellationToken::new(), |_| {});
        assert!(matches!(result, Err(OfflineError::InvalidConfig(_))));
    }

    #[test]
    fn test_batch_renders_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let jobs: Vec<RenderJob> = (0..4)
            .map(|i| {
                let input = write_tone(dir.path(), &format!("in{}.wav", i), 1000 * (i + 1), 8000);
                RenderJob::builder()
                    .input(input)
                    .output(dir.path().join(format!("out{}.wav", i)))
                    .build()
                    .unwrap()
            })
            .collect();

        let batch = BatchRenderer::new(OfflineConfig::default().with_max_parallel_jobs(2));
        let results = batch.render_all(&jobs, &CancellationToken::new());
        for (i, result) in results.iter().enumerate() {
            let report = result.as_ref().unwrap().report().unwrap();
            assert_eq!(report.job_id, jobs[i].id);
            assert_eq!(report.frames, 1000 * (i + 1));
        }
    }
}

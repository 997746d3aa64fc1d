//! WaveDesk command-line renderer
//!
//! Usage:
//!   wavedesk render <input> <output> [effects]  - Trim and process one WAV file
//!   wavedesk job <request.json> <output>        - Run a host render request
//!   wavedesk probe <file>                       - Print format and loudness
//!
//! Set `RUST_LOG=info` for progress lines.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use wd_core::{CompressorSettings, EqBand, EqSettings, GateSettings};
use wd_dsp::ChainSettings;
use wd_offline::{
    integrated_loudness, CancellationToken, OfflineConfig, OfflinePipeline, ProgressReport,
    RenderJob, RenderOutcome, RenderRequest, RenderService, RenderSource,
};

#[derive(Parser)]
#[command(name = "wavedesk", about = "WaveDesk offline renderer", version)]
struct Cli {
    /// Offline config (JSON); defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Trim and process one WAV file
    Render {
        input: PathBuf,
        output: PathBuf,
        #[command(flatten)]
        effects: EffectArgs,
    },
    /// Run a JSON render request (falls back to a copy on failure)
    Job { request: PathBuf, output: PathBuf },
    /// Print WAV format and integrated loudness
    Probe { file: PathBuf },
}

#[derive(clap::Args, Debug)]
struct EffectArgs {
    /// Window start (ms)
    #[arg(long)]
    trim_start: Option<f64>,
    /// Window end (ms)
    #[arg(long)]
    trim_end: Option<f64>,
    /// Fade-in length (ms)
    #[arg(long, default_value_t = 0.0)]
    fade_in: f64,
    /// Fade-out length (ms)
    #[arg(long, default_value_t = 0.0)]
    fade_out: f64,
    /// Normalization gain (dB, clamped to ±12)
    #[arg(long, allow_hyphen_values = true)]
    normalize_db: Option<f64>,
    /// Enable the noise gate at this threshold (dB)
    #[arg(long, allow_hyphen_values = true)]
    gate_threshold: Option<f64>,
    /// Enable the compressor at this threshold (dB)
    #[arg(long, allow_hyphen_values = true)]
    compress_threshold: Option<f64>,
    /// Compressor ratio
    #[arg(long, default_value_t = 4.0, requires = "compress_threshold")]
    ratio: f64,
    /// Enable the EQ with low,mid,high band gains (dB)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    eq: Option<Vec<f64>>,
}

impl EffectArgs {
    fn chain_settings(&self) -> Result<ChainSettings> {
        let mut chain = ChainSettings::default().with_fades(self.fade_in, self.fade_out);
        if let Some(db) = self.normalize_db {
            chain = chain.with_normalize(db);
        }
        if let Some(threshold_db) = self.gate_threshold {
            chain = chain.with_gate(
                GateSettings {
                    enabled: true,
                    threshold_db,
                    ..GateSettings::default()
                }
                .clamped(),
            );
        }
        if let Some(threshold_db) = self.compress_threshold {
            chain = chain.with_compressor(
                CompressorSettings {
                    enabled: true,
                    threshold_db,
                    ratio: self.ratio,
                    ..CompressorSettings::default()
                }
                .clamped(),
            );
        }
        if let Some(gains) = &self.eq {
            let [low, mid, high] = gains.as_slice() else {
                bail!("--eq takes exactly three gains (low,mid,high), got {}", gains.len());
            };
            let defaults = EqSettings::default();
            chain = chain.with_eq(
                EqSettings {
                    enabled: true,
                    low: EqBand::new(*low, defaults.low.freq_hz),
                    mid: EqBand::new(*mid, defaults.mid.freq_hz),
                    high: EqBand::new(*high, defaults.high.freq_hz),
                }
                .clamped(),
            );
        }
        Ok(chain)
    }

    fn source(&self, input: &Path) -> RenderSource {
        let mut source = RenderSource::new(input);
        if let Some(start) = self.trim_start {
            source = source.trim_start(start);
        }
        if let Some(end) = self.trim_end {
            source = source.trim_end(end);
        }
        source
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => OfflineConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => OfflineConfig::default(),
    };

    match cli.command {
        Commands::Render {
            input,
            output,
            effects,
        } => render(config, &input, &output, &effects),
        Commands::Job { request, output } => run_job(config, &request, &output),
        Commands::Probe { file } => probe(config, &file),
    }
}

/// Logs every tenth of progress plus every state change
fn progress_logger() -> impl FnMut(&ProgressReport) {
    let mut last_state = None;
    let mut last_decile = -1i32;
    move |report: &ProgressReport| {
        let decile = (report.progress * 10.0).floor() as i32;
        if last_state != Some(report.state) || decile > last_decile {
            log::info!("{:>3.0}% {:?}: {}", report.progress * 100.0, report.state, report.status);
            last_state = Some(report.state);
            last_decile = decile;
        }
    }
}

fn render(config: OfflineConfig, input: &Path, output: &Path, effects: &EffectArgs) -> Result<()> {
    let job = RenderJob::builder()
        .source(effects.source(input))
        .output(output)
        .chain(effects.chain_settings()?)
        .build()
        .context("Invalid render settings")?;

    let mut pipeline = OfflinePipeline::new(config);
    let outcome = pipeline
        .render(&job, &CancellationToken::new(), progress_logger())
        .with_context(|| format!("Failed to render {}", input.display()))?;

    match outcome {
        RenderOutcome::Completed(report) => {
            println!(
                "{}: {} frames, {:.1} ms, peak {:.1} dBFS, {:.1} LUFS",
                report.output.display(),
                report.frames,
                report.duration_ms,
                report.peak_db,
                report.lufs
            );
            Ok(())
        }
        RenderOutcome::Cancelled => bail!("Render cancelled"),
    }
}

fn run_job(config: OfflineConfig, request_path: &Path, output: &Path) -> Result<()> {
    let request = RenderRequest::load(request_path)
        .with_context(|| format!("Failed to read request {}", request_path.display()))?;

    let service = RenderService::new(config);
    let result = service
        .export(&request, output, &CancellationToken::new(), progress_logger())
        .context("Export failed")?;

    let status = service.status(&result);
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

fn probe(config: OfflineConfig, file: &Path) -> Result<()> {
    let service = RenderService::new(config);
    let info = service
        .probe(file)
        .with_context(|| format!("Failed to probe {}", file.display()))?;
    let waveform = service.waveform(file)?;
    let buffer = wd_file::read_wav(file)?;

    println!("{}", file.display());
    println!("  sample rate : {} Hz", info.sample_rate);
    println!("  channels    : {}", info.channels);
    println!("  bit depth   : {}", info.bits_per_sample);
    println!("  frames      : {}", info.frames);
    println!("  duration    : {:.1} ms", info.duration_ms);
    println!("  waveform    : {} points", waveform.len());
    println!("  peak        : {:.1} dBFS", wd_core::gain_to_db(buffer.peak() as f64));
    println!("  loudness    : {:.1} LUFS", integrated_loudness(&buffer));
    Ok(())
}

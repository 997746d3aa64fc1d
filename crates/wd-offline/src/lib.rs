//! wd-offline: Offline render pipeline for WaveDesk
//!
//! Turns timeline segments and host render requests into finished WAV files:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         RenderService                             │
//! │                                                                   │
//! │  ┌─────────┐   ┌──────────┐   ┌───────────────┐   ┌───────────┐  │
//! │  │  Load   │ → │ Analyze  │ → │ Process       │ → │   Save    │  │
//! │  │ (codec) │   │ (trims)  │   │ (chain/block) │   │ (.part →) │  │
//! │  └─────────┘   └──────────┘   └───────────────┘   └───────────┘  │
//! │                                                                   │
//! │  sidecar.json · loudness · waveform · upload queue hand-off       │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wd_offline::{CancellationToken, OfflineConfig, OfflinePipeline, RenderJob, RenderSource};
//! use wd_dsp::ChainSettings;
//!
//! let job = RenderJob::builder()
//!     .source(RenderSource::new("take.wav").trim(500.0, 1500.0))
//!     .output("clip.wav")
//!     .chain(ChainSettings::default().with_fades(100.0, 100.0).with_normalize(-3.0))
//!     .build()?;
//!
//! let mut pipeline = OfflinePipeline::new(OfflineConfig::default());
//! let outcome = pipeline.render(&job, &CancellationToken::new(), |p| println!("{:.0}%", p.progress * 100.0))?;
//! ```

mod analysis;
mod cancel;
mod config;
mod error;
mod job;
mod pipeline;
mod render;
mod request;
mod upload;

pub use analysis::*;
pub use cancel::*;
pub use config::*;
pub use error::*;
pub use job::*;
pub use pipeline::*;
pub use render::*;
pub use request::*;
pub use upload::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! wd-file: Audio file I/O for WaveDesk
//!
//! - `wav` - 16-bit PCM WAV codec and the planar `AudioBuffer`
//! - `waveform` - peak extraction for timeline thumbnails
//! - `cache` - bounded metadata and waveform caches
//! - `persist` - atomic writes and JSON documents

mod cache;
mod error;
mod persist;
mod waveform;
mod wav;

pub use cache::*;
pub use error::*;
pub use persist::*;
pub use waveform::*;
pub use wav::*;

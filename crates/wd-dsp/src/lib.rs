//! wd-dsp: Effect units for WaveDesk offline renders
//!
//! All units work in the gain domain: they receive a per-sample magnitude
//! and return a transformed magnitude. The render pipeline re-applies the
//! sample sign afterwards.
//!
//! ## Modules
//! - `envelope` - attack/release envelope follower
//! - `eq` - heuristic three-band EQ simulator (non-spectral)
//! - `dynamics` - compressor and noise gate / expander
//! - `chain` - fixed-order effects chain used by the renderer

pub mod chain;
pub mod dynamics;
pub mod envelope;
pub mod eq;

pub use chain::{ChainSettings, EffectsChain};
pub use dynamics::{Compressor, NoiseGate};
pub use envelope::EnvelopeFollower;
pub use eq::EqSimulator;

/// Trait for all stateful processors
pub trait Processor: Send + Sync {
    /// Reset processor state
    fn reset(&mut self);
}

/// Single-input processor
pub trait MonoProcessor: Processor {
    /// Process a single value
    fn process_sample(&mut self, input: f64) -> f64;

    /// Process a block in place
    fn process_block(&mut self, buffer: &mut [f64]) {
        for sample in buffer.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }
}

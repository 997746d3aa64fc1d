//! Dynamics processors: compressor and noise gate / expander
//!
//! Both work on a per-sample magnitude and keep their own envelope follower.
//! Gain changes are smoothed with a fixed per-call step, so results depend
//! only on the input sequence, not on block boundaries.

use wd_core::{db_to_gain, CompressorSettings, GateSettings};

use crate::envelope::EnvelopeFollower;
use crate::{MonoProcessor, Processor};

/// Fraction of the distance to the target gain reduction covered per call
const COMP_SMOOTHING: f64 = 0.1;
const COMP_MIN_OUTPUT: f64 = 0.01;
const COMP_MAX_OUTPUT: f64 = 2.0;

/// Fraction of the distance to the target gate gain covered per call
const GATE_SMOOTHING: f64 = 0.05;
const GATE_FLOOR: f64 = 0.01;

// ═══════════════════════════════════════════════════════════════════════════════
// COMPRESSOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Feed-forward compressor with smoothed gain reduction
#[derive(Debug, Clone)]
pub struct Compressor {
    settings: CompressorSettings,
    envelope: EnvelopeFollower,
    threshold: f64,
    makeup: f64,
    gain_reduction: f64,
    sample_rate: f64,
}

impl Compressor {
    pub fn new(settings: CompressorSettings, sample_rate: f64) -> Self {
        let mut comp = Self {
            settings,
            envelope: EnvelopeFollower::new(sample_rate),
            threshold: 1.0,
            makeup: 1.0,
            gain_reduction: 1.0,
            sample_rate,
        };
        comp.set_settings(settings);
        comp
    }

    pub fn set_settings(&mut self, settings: CompressorSettings) {
        self.settings = settings;
        self.threshold = db_to_gain(settings.threshold_db);
        self.makeup = db_to_gain(settings.makeup_db);
        self.envelope.set_times(settings.attack_ms, settings.release_ms);
    }

    pub fn settings(&self) -> &CompressorSettings {
        &self.settings
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Current smoothed gain reduction (1.0 = none)
    pub fn gain_reduction(&self) -> f64 {
        self.gain_reduction
    }

    fn target_reduction(&self, level: f64) -> f64 {
        if level > self.threshold {
            let over = level / self.threshold;
            let compressed = 1.0 + (over - 1.0) / self.settings.ratio.max(1.0);
            compressed / over
        } else {
            1.0
        }
    }
}

impl Processor for Compressor {
    fn reset(&mut self) {
        self.envelope.reset();
        self.gain_reduction = 1.0;
    }
}

impl MonoProcessor for Compressor {
    #[inline]
    fn process_sample(&mut self, input: f64) -> f64 {
        let level = self.envelope.process(input);
        let target = self.target_reduction(level);
        self.gain_reduction += (target - self.gain_reduction) * COMP_SMOOTHING;
        (input * self.gain_reduction * self.makeup).clamp(COMP_MIN_OUTPUT, COMP_MAX_OUTPUT)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// NOISE GATE
// ═══════════════════════════════════════════════════════════════════════════════

/// Noise gate with hold and downward expansion below threshold
#[derive(Debug, Clone)]
pub struct NoiseGate {
    settings: GateSettings,
    envelope: EnvelopeFollower,
    threshold: f64,
    hold_samples: u64,
    hold_counter: u64,
    is_open: bool,
    gain: f64,
    sample_rate: f64,
}

impl NoiseGate {
    pub fn new(settings: GateSettings, sample_rate: f64) -> Self {
        let mut gate = Self {
            settings,
            envelope: EnvelopeFollower::new(sample_rate),
            threshold: 0.0,
            hold_samples: 0,
            hold_counter: 0,
            is_open: true,
            gain: 1.0,
            sample_rate,
        };
        gate.set_settings(settings);
        gate
    }

    pub fn set_settings(&mut self, settings: GateSettings) {
        self.settings = settings;
        self.threshold = db_to_gain(settings.threshold_db);
        self.hold_samples = (settings.hold_ms.max(0.0) * 0.001 * self.sample_rate) as u64;
        self.envelope.set_times(settings.attack_ms, settings.release_ms);
    }

    pub fn settings(&self) -> &GateSettings {
        &self.settings
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Current smoothed gate gain
    pub fn gain(&self) -> f64 {
        self.gain
    }

    /// Expansion gain for a level under the threshold
    fn expansion_gain(&self, level: f64) -> f64 {
        let below = self.threshold / level.max(1e-10) - 1.0;
        let target = 1.0 / (1.0 + below * (self.settings.ratio - 1.0).max(0.0));
        target.max(GATE_FLOOR)
    }
}

impl Processor for NoiseGate {
    fn reset(&mut self) {
        self.envelope.reset();
        self.hold_counter = 0;
        self.is_open = true;
        self.gain = 1.0;
    }
}

impl MonoProcessor for NoiseGate {
    #[inline]
    fn process_sample(&mut self, input: f64) -> f64 {
        let level = self.envelope.process(input);

        let target = if level < self.threshold {
            if self.is_open {
                self.is_open = false;
                self.hold_counter = self.hold_samples;
            }
            if self.hold_counter > 0 {
                self.hold_counter -= 1;
                1.0
            } else {
                self.expansion_gain(level)
            }
        } else {
            self.is_open = true;
            self.hold_counter = 0;
            1.0
        };

        self.gain += (target - self.gain) * GATE_SMOOTHING;
        input * self.gain
    }
}

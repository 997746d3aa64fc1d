//! Heuristic three-band EQ simulator
//!
//! This is not a filter. It tracks how fast the signal is changing and
//! shifts a set of low/mid/high "content weights" toward the band that
//! motion suggests, then applies the weighted mix of the band gains as a
//! single scalar. Output must stay reproducible sample for sample, so the
//! update rule is fixed.

use wd_core::{Decibels, EqSettings, EQ_GAIN_DB};

use crate::Processor;

/// Change above which content is treated as high-frequency
const RAPID_DELTA: f64 = 0.05;
/// Change below which content is treated as low-frequency
const STEADY_DELTA: f64 = 0.005;
const WEIGHT_FLOOR: f64 = 0.05;
const MIN_EQ_GAIN: f64 = 0.1;
const MAX_EQ_GAIN: f64 = 3.0;

const LOW: usize = 0;
const MID: usize = 1;
const HIGH: usize = 2;

#[derive(Debug, Clone)]
pub struct EqSimulator {
    settings: EqSettings,
    /// Linear band gains (low, mid, high)
    band_gains: [f64; 3],
    /// Content weights (low, mid, high), always summing to 1
    weights: [f64; 3],
    last_level: f64,
}

impl EqSimulator {
    pub fn new(settings: EqSettings) -> Self {
        let mut eq = Self {
            settings,
            band_gains: [1.0; 3],
            weights: [1.0 / 3.0; 3],
            last_level: 0.0,
        };
        eq.set_settings(settings);
        eq
    }

    pub fn set_settings(&mut self, settings: EqSettings) {
        self.settings = settings;
        self.band_gains = [
            Decibels(settings.low.gain_db).to_gain_clamped(EQ_GAIN_DB),
            Decibels(settings.mid.gain_db).to_gain_clamped(EQ_GAIN_DB),
            Decibels(settings.high.gain_db).to_gain_clamped(EQ_GAIN_DB),
        ];
    }

    pub fn settings(&self) -> &EqSettings {
        &self.settings
    }

    /// Current content weights (low, mid, high)
    pub fn weights(&self) -> [f64; 3] {
        self.weights
    }

    /// Shift the content weights using the previous output of the chain
    pub fn update_content(&mut self, previous_output: f64) {
        let delta = (previous_output - self.last_level).abs();
        self.last_level = previous_output;

        if delta > RAPID_DELTA {
            self.weights[HIGH] += 0.02;
            self.weights[LOW] -= 0.01;
        } else if delta < STEADY_DELTA {
            self.weights[LOW] += 0.02;
            self.weights[HIGH] -= 0.01;
        } else {
            self.weights[MID] += 0.01;
        }

        for w in &mut self.weights {
            *w = w.max(WEIGHT_FLOOR);
        }
        let sum: f64 = self.weights.iter().sum();
        for w in &mut self.weights {
            *w /= sum;
        }
    }

    /// Weighted band gain, clamped to [0.1, 3.0]
    pub fn gain(&self) -> f64 {
        let mix: f64 = self
            .weights
            .iter()
            .zip(self.band_gains.iter())
            .map(|(w, g)| w * g)
            .sum();
        mix.clamp(MIN_EQ_GAIN, MAX_EQ_GAIN)
    }

    #[inline]
    pub fn process(&self, input: f64) -> f64 {
        input * self.gain()
    }
}

impl Processor for EqSimulator {
    fn reset(&mut self) {
        self.weights = [1.0 / 3.0; 3];
        self.last_level = 0.0;
    }
}

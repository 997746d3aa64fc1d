//! Envelope follower

use crate::Processor;

/// Single-pole attack/release smoothing of the rectified input
#[derive(Debug, Clone)]
pub struct EnvelopeFollower {
    attack_coeff: f64,
    release_coeff: f64,
    level: f64,
    sample_rate: f64,
}

impl EnvelopeFollower {
    pub fn new(sample_rate: f64) -> Self {
        Self::with_times(sample_rate, 10.0, 100.0)
    }

    pub fn with_times(sample_rate: f64, attack_ms: f64, release_ms: f64) -> Self {
        let mut follower = Self {
            attack_coeff: 0.0,
            release_coeff: 0.0,
            level: 0.0,
            sample_rate,
        };
        follower.set_times(attack_ms, release_ms);
        follower
    }

    /// Set attack and release times in milliseconds
    pub fn set_times(&mut self, attack_ms: f64, release_ms: f64) {
        self.attack_coeff = time_coeff(attack_ms, self.sample_rate);
        self.release_coeff = time_coeff(release_ms, self.sample_rate);
    }

    #[inline(always)]
    pub fn process(&mut self, input: f64) -> f64 {
        let abs_input = input.abs();
        let coeff = if abs_input > self.level {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.level = abs_input + coeff * (self.level - abs_input);
        self.level
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn attack_coeff(&self) -> f64 {
        self.attack_coeff
    }

    pub fn release_coeff(&self) -> f64 {
        self.release_coeff
    }
}

impl Processor for EnvelopeFollower {
    fn reset(&mut self) {
        self.level = 0.0;
    }
}

/// `exp(-1 / (ms * 0.001 * sr))`. Zero or negative times give an instant response.
#[inline]
fn time_coeff(time_ms: f64, sample_rate: f64) -> f64 {
    let samples = time_ms * 0.001 * sample_rate;
    if samples <= 0.0 {
        0.0
    } else {
        (-1.0 / samples).exp()
    }
}

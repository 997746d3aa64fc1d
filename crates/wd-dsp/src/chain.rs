//! Effects chain orchestrator
//!
//! Composes every gain-domain stage in a fixed order:
//!
//! 1. normalization gain (clamped to ±12 dB)
//! 2. fade-in from the window start
//! 3. fade-out toward the window end
//! 4. noise gate
//! 5. EQ simulator (content weights updated from the previous output first)
//! 6. compressor
//! 7. final clamp to [0.001, 3.0]
//!
//! The order is a property of [`EffectsChain::process`]; settings only say
//! which stages are active.

use serde::{Deserialize, Serialize};
use wd_core::{
    CompressorSettings, Decibels, EqSettings, FadeCurve, GateSettings, NORMALIZE_GAIN_DB,
};

use crate::dynamics::{Compressor, NoiseGate};
use crate::eq::EqSimulator;
use crate::{MonoProcessor, Processor};

pub const CHAIN_MIN_OUTPUT: f64 = 0.001;
pub const CHAIN_MAX_OUTPUT: f64 = 3.0;

/// Everything the chain needs for one render
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainSettings {
    /// Normalization gain (dB), `None` to skip the stage
    pub normalize_gain_db: Option<f64>,
    /// Fade-in length (ms), 0 disables
    pub fade_in_ms: f64,
    /// Fade-out length (ms), 0 disables
    pub fade_out_ms: f64,
    pub fade_curve: FadeCurve,
    pub gate: GateSettings,
    pub eq: EqSettings,
    pub compressor: CompressorSettings,
}

impl ChainSettings {
    /// True when at least one stage would change the signal
    pub fn has_effects(&self) -> bool {
        self.normalize_gain_db.is_some()
            || self.fade_in_ms > 0.0
            || self.fade_out_ms > 0.0
            || self.gate.enabled
            || self.eq.enabled
            || self.compressor.enabled
    }

    pub fn with_normalize(mut self, gain_db: f64) -> Self {
        self.normalize_gain_db = Some(gain_db);
        self
    }

    pub fn with_fades(mut self, fade_in_ms: f64, fade_out_ms: f64) -> Self {
        self.fade_in_ms = fade_in_ms.max(0.0);
        self.fade_out_ms = fade_out_ms.max(0.0);
        self
    }

    pub fn with_fade_curve(mut self, curve: FadeCurve) -> Self {
        self.fade_curve = curve;
        self
    }

    pub fn with_gate(mut self, gate: GateSettings) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_eq(mut self, eq: EqSettings) -> Self {
        self.eq = eq;
        self
    }

    pub fn with_compressor(mut self, compressor: CompressorSettings) -> Self {
        self.compressor = compressor;
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EFFECTS CHAIN
// ═══════════════════════════════════════════════════════════════════════════════

/// Stateful per-channel effects chain
#[derive(Debug, Clone)]
pub struct EffectsChain {
    settings: ChainSettings,
    normalize_gain: Option<f64>,
    gate: NoiseGate,
    eq: EqSimulator,
    compressor: Compressor,
    last_output: f64,
}

impl EffectsChain {
    pub fn new(settings: ChainSettings, sample_rate: f64) -> Self {
        Self {
            settings,
            normalize_gain: settings
                .normalize_gain_db
                .map(|db| Decibels(db).to_gain_clamped(NORMALIZE_GAIN_DB)),
            gate: NoiseGate::new(settings.gate, sample_rate),
            eq: EqSimulator::new(settings.eq),
            compressor: Compressor::new(settings.compressor, sample_rate),
            last_output: 0.0,
        }
    }

    pub fn settings(&self) -> &ChainSettings {
        &self.settings
    }

    /// Transform one gain value at `position_ms` inside the window
    /// `[start_ms, end_ms]`.
    pub fn process(&mut self, gain: f64, position_ms: f64, start_ms: f64, end_ms: f64) -> f64 {
        let mut value = gain;

        if let Some(normalize) = self.normalize_gain {
            value *= normalize;
        }

        if self.settings.fade_in_ms > 0.0 {
            let progress = ((position_ms - start_ms) / self.settings.fade_in_ms).clamp(0.0, 1.0);
            value *= self.settings.fade_curve.apply(progress);
        }

        if self.settings.fade_out_ms > 0.0 {
            let progress = ((end_ms - position_ms) / self.settings.fade_out_ms).clamp(0.0, 1.0);
            value *= self.settings.fade_curve.apply(progress);
        }

        if self.settings.gate.enabled {
            value = self.gate.process_sample(value);
        }

        if self.settings.eq.enabled {
            self.eq.update_content(self.last_output);
            value = self.eq.process(value);
        }

        if self.settings.compressor.enabled {
            value = self.compressor.process_sample(value);
        }

        let out = value.clamp(CHAIN_MIN_OUTPUT, CHAIN_MAX_OUTPUT);
        self.last_output = out;
        out
    }
}

impl Processor for EffectsChain {
    fn reset(&mut self) {
        self.gate.reset();
        self.eq.reset();
        self.compressor.reset();
        self.last_output = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_settings_have_no_effects() {
        assert!(!ChainSettings::default().has_effects());
        assert!(ChainSettings::default().with_fades(10.0, 0.0).has_effects());
    }

    #[test]
    fn test_passthrough_clamps_only() {
        let mut chain = EffectsChain::new(ChainSettings::default(), 44100.0);
        assert_eq!(chain.process(0.5, 10.0, 0.0, 1000.0), 0.5);
        assert_eq!(chain.process(0.0, 10.0, 0.0, 1000.0), CHAIN_MIN_OUTPUT);
        assert_eq!(chain.process(5.0, 10.0, 0.0, 1000.0), CHAIN_MAX_OUTPUT);
    }

    #[test]
    fn test_normalize_is_clamped() {
        let mut chain = EffectsChain::new(ChainSettings::default().with_normalize(40.0), 44100.0);
        let out = chain.process(0.1, 500.0, 0.0, 1000.0);
        assert_relative_eq!(out, 0.1 * Decibels(12.0).to_gain(), epsilon = 1e-12);
    }

    #[test]
    fn test_linear_fades() {
        let mut chain =
            EffectsChain::new(ChainSettings::default().with_fades(100.0, 100.0), 44100.0);
        assert_relative_eq!(chain.process(1.0, 50.0, 0.0, 1000.0), 0.5);
        assert_relative_eq!(chain.process(1.0, 500.0, 0.0, 1000.0), 1.0);
        assert_relative_eq!(chain.process(1.0, 975.0, 0.0, 1000.0), 0.25);
        assert_eq!(chain.process(1.0, 0.0, 0.0, 1000.0), CHAIN_MIN_OUTPUT);
    }

    #[test]
    fn test_fade_curve_applies() {
        let mut chain = EffectsChain::new(
            ChainSettings::default()
                .with_fades(100.0, 0.0)
                .with_fade_curve(FadeCurve::Exponential),
            44100.0,
        );
        assert_relative_eq!(chain.process(1.0, 50.0, 0.0, 1000.0), 0.25);
    }

    #[test]
    fn test_compressor_runs_after_eq() {
        // Boosted EQ followed by a hard compressor: the compressor must see
        // the boosted signal, so its steady-state output is reduced.
        let mut eq = EqSettings { enabled: true, ..EqSettings::default() };
        eq.low.gain_db = 6.0;
        eq.mid.gain_db = 6.0;
        eq.high.gain_db = 6.0;
        let compressor = CompressorSettings {
            enabled: true,
            threshold_db: -6.0,
            ratio: 20.0,
            attack_ms: 0.1,
            release_ms: 10.0,
            makeup_db: 0.0,
        };

        let mut eq_only = EffectsChain::new(ChainSettings::default().with_eq(eq), 44100.0);
        let mut both = EffectsChain::new(
            ChainSettings::default().with_eq(eq).with_compressor(compressor),
            44100.0,
        );

        let (mut a, mut b) = (0.0, 0.0);
        for _ in 0..5000 {
            a = eq_only.process(0.5, 500.0, 0.0, 1000.0);
            b = both.process(0.5, 500.0, 0.0, 1000.0);
        }
        assert_relative_eq!(a, 0.5 * Decibels(6.0).to_gain(), epsilon = 1e-9);
        assert!(b < a);
        assert!(b <= 2.0);
    }

    #[test]
    fn test_reset_reproduces_output() {
        let settings = ChainSettings::default()
            .with_normalize(-3.0)
            .with_gate(GateSettings { enabled: true, ..GateSettings::default() })
            .with_eq(EqSettings { enabled: true, ..EqSettings::default() })
            .with_compressor(CompressorSettings { enabled: true, ..CompressorSettings::default() });
        let mut chain = EffectsChain::new(settings, 48000.0);

        let input: Vec<f64> = (0..2000).map(|i| ((i as f64) * 0.01).sin().abs()).collect();
        let run = |chain: &mut EffectsChain| -> Vec<f64> {
            input
                .iter()
                .enumerate()
                .map(|(i, &g)| chain.process(g, i as f64 / 48.0, 0.0, 2000.0 / 48.0))
                .collect()
        };

        let first = run(&mut chain);
        chain.reset();
        let second = run(&mut chain);
        assert_eq!(first, second);
    }

    #[test]
    fn test_settings_serde_defaults() {
        let settings: ChainSettings = serde_json::from_str(r#"{"fade_in_ms": 100.0}"#).unwrap();
        assert_eq!(settings.fade_in_ms, 100.0);
        assert_eq!(settings.normalize_gain_db, None);
        assert!(!settings.compressor.enabled);
    }
}

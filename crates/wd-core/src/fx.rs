//! Effect settings shared by the timeline model and the DSP chain

use serde::{Deserialize, Serialize};

use crate::params::*;

// ═══════════════════════════════════════════════════════════════════════════════
// EQ
// ═══════════════════════════════════════════════════════════════════════════════

/// One band of the three-band EQ
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EqBand {
    /// Gain (dB)
    pub gain_db: f64,
    /// Nominal frequency (Hz). Display only, the simulator does not filter.
    pub freq_hz: f64,
}

impl EqBand {
    pub const fn new(gain_db: f64, freq_hz: f64) -> Self {
        Self { gain_db, freq_hz }
    }

    pub fn clamped(self) -> Self {
        Self {
            gain_db: EQ_GAIN_DB.clamp(self.gain_db),
            freq_hz: EQ_FREQ_HZ.clamp(self.freq_hz),
        }
    }
}

/// Three-band EQ settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EqSettings {
    pub enabled: bool,
    pub low: EqBand,
    pub mid: EqBand,
    pub high: EqBand,
}

impl Default for EqSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            low: EqBand::new(0.0, 100.0),
            mid: EqBand::new(0.0, 1000.0),
            high: EqBand::new(0.0, 8000.0),
        }
    }
}

impl EqSettings {
    pub fn clamped(self) -> Self {
        Self {
            enabled: self.enabled,
            low: self.low.clamped(),
            mid: self.mid.clamped(),
            high: self.high.clamped(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DYNAMICS
// ═══════════════════════════════════════════════════════════════════════════════

/// Compressor settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressorSettings {
    pub enabled: bool,
    /// Threshold (dB)
    pub threshold_db: f64,
    /// Ratio (x:1)
    pub ratio: f64,
    /// Attack (ms)
    pub attack_ms: f64,
    /// Release (ms)
    pub release_ms: f64,
    /// Makeup gain (dB)
    pub makeup_db: f64,
}

impl Default for CompressorSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold_db: -18.0,
            ratio: 4.0,
            attack_ms: 10.0,
            release_ms: 100.0,
            makeup_db: 0.0,
        }
    }
}

impl CompressorSettings {
    pub fn clamped(self) -> Self {
        Self {
            enabled: self.enabled,
            threshold_db: COMP_THRESHOLD_DB.clamp(self.threshold_db),
            ratio: COMP_RATIO.clamp(self.ratio),
            attack_ms: COMP_ATTACK_MS.clamp(self.attack_ms),
            release_ms: COMP_RELEASE_MS.clamp(self.release_ms),
            makeup_db: COMP_MAKEUP_DB.clamp(self.makeup_db),
        }
    }
}

/// Noise gate / downward expander settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateSettings {
    pub enabled: bool,
    /// Threshold (dB)
    pub threshold_db: f64,
    /// Expansion ratio below threshold
    pub ratio: f64,
    /// Attack (ms)
    pub attack_ms: f64,
    /// Release (ms)
    pub release_ms: f64,
    /// Hold (ms)
    pub hold_ms: f64,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold_db: -50.0,
            ratio: 4.0,
            attack_ms: 1.0,
            release_ms: 100.0,
            hold_ms: 50.0,
        }
    }
}

impl GateSettings {
    pub fn clamped(self) -> Self {
        Self {
            enabled: self.enabled,
            threshold_db: GATE_THRESHOLD_DB.clamp(self.threshold_db),
            ratio: GATE_RATIO.clamp(self.ratio),
            attack_ms: GATE_ATTACK_MS.clamp(self.attack_ms),
            release_ms: GATE_RELEASE_MS.clamp(self.release_ms),
            hold_ms: GATE_HOLD_MS.clamp(self.hold_ms),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// REVERB
// ═══════════════════════════════════════════════════════════════════════════════

/// Reverb settings. Stored for the mixer UI, never rendered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReverbSettings {
    pub enabled: bool,
    pub mix: f64,
    pub room_size: f64,
}

impl Default for ReverbSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            mix: 0.2,
            room_size: 0.5,
        }
    }
}

impl ReverbSettings {
    pub fn clamped(self) -> Self {
        Self {
            enabled: self.enabled,
            mix: REVERB_MIX.clamp(self.mix),
            room_size: REVERB_ROOM_SIZE.clamp(self.room_size),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FADES
// ═══════════════════════════════════════════════════════════════════════════════

/// Fade curve shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FadeCurve {
    #[default]
    Linear,
    Exponential,
    Logarithmic,
}

impl FadeCurve {
    /// Map fade progress (0..1) to gain (0..1)
    #[inline]
    pub fn apply(self, progress: f64) -> f64 {
        let p = progress.clamp(0.0, 1.0);
        match self {
            FadeCurve::Linear => p,
            FadeCurve::Exponential => p * p,
            FadeCurve::Logarithmic => (p * 9.0 + 1.0).log10(),
        }
    }
}

//! Parameter ranges
//!
//! Every user-facing number in the timeline model has a documented range.
//! Mutators clamp into these ranges; the renderer trusts what it is given.

use serde::{Deserialize, Serialize};

/// Inclusive numeric range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamRange {
    pub min: f64,
    pub max: f64,
}

impl ParamRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Clamp into the range. NaN falls back to the minimum.
    #[inline]
    pub fn clamp(self, value: f64) -> f64 {
        if value.is_nan() {
            self.min
        } else {
            value.clamp(self.min, self.max)
        }
    }

    #[inline]
    pub fn contains(self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TRACK / SEGMENT
// ═══════════════════════════════════════════════════════════════════════════════

/// Linear gain for tracks and segments
pub const GAIN: ParamRange = ParamRange::new(0.0, 2.0);
/// Stereo pan
pub const PAN: ParamRange = ParamRange::new(-1.0, 1.0);
/// Aux send level
pub const SEND_LEVEL: ParamRange = ParamRange::new(0.0, 1.0);

// ═══════════════════════════════════════════════════════════════════════════════
// EFFECTS
// ═══════════════════════════════════════════════════════════════════════════════

pub const EQ_GAIN_DB: ParamRange = ParamRange::new(-12.0, 12.0);
pub const EQ_FREQ_HZ: ParamRange = ParamRange::new(20.0, 20_000.0);

pub const COMP_THRESHOLD_DB: ParamRange = ParamRange::new(-60.0, 0.0);
pub const COMP_RATIO: ParamRange = ParamRange::new(1.0, 20.0);
pub const COMP_ATTACK_MS: ParamRange = ParamRange::new(0.1, 200.0);
pub const COMP_RELEASE_MS: ParamRange = ParamRange::new(10.0, 2000.0);
pub const COMP_MAKEUP_DB: ParamRange = ParamRange::new(0.0, 24.0);

pub const GATE_THRESHOLD_DB: ParamRange = ParamRange::new(-80.0, 0.0);
pub const GATE_RATIO: ParamRange = ParamRange::new(1.0, 10.0);
pub const GATE_ATTACK_MS: ParamRange = ParamRange::new(0.1, 200.0);
pub const GATE_RELEASE_MS: ParamRange = ParamRange::new(10.0, 2000.0);
pub const GATE_HOLD_MS: ParamRange = ParamRange::new(0.0, 500.0);

pub const REVERB_MIX: ParamRange = ParamRange::new(0.0, 1.0);
pub const REVERB_ROOM_SIZE: ParamRange = ParamRange::new(0.0, 1.0);

/// Normalization gain applied ahead of the effect stages
pub const NORMALIZE_GAIN_DB: ParamRange = ParamRange::new(-12.0, 12.0);

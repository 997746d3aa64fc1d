//! wd-core: Shared types for the WaveDesk render core
//!
//! Value types used by every other crate: decibel conversion, millisecond and
//! sample arithmetic, clamped parameter ranges, effect settings and the
//! per-project id allocator.

mod fx;
mod ids;
mod params;
mod time;

pub use fx::*;
pub use ids::*;
pub use params::*;
pub use time::*;

/// Gain in decibels
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, serde::Serialize, serde::Deserialize)]
pub struct Decibels(pub f64);

impl Decibels {
    pub const ZERO: Self = Self(0.0);
    pub const NEG_INF: Self = Self(f64::NEG_INFINITY);

    #[inline]
    pub fn from_gain(gain: f64) -> Self {
        if gain <= 0.0 {
            Self::NEG_INF
        } else {
            Self(20.0 * gain.log10())
        }
    }

    #[inline]
    pub fn to_gain(self) -> f64 {
        if self.0 <= -144.0 {
            0.0
        } else {
            10.0_f64.powf(self.0 / 20.0)
        }
    }

    /// Linear gain after clamping the level into `range`
    #[inline]
    pub fn to_gain_clamped(self, range: ParamRange) -> f64 {
        Self(range.clamp(self.0)).to_gain()
    }
}

impl Default for Decibels {
    fn default() -> Self {
        Self::ZERO
    }
}

/// Linear gain for a level in dB
#[inline]
pub fn db_to_gain(db: f64) -> f64 {
    Decibels(db).to_gain()
}

/// Level in dBFS for a linear gain
#[inline]
pub fn gain_to_db(gain: f64) -> f64 {
    Decibels::from_gain(gain).0
}

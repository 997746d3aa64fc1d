//! Per-track effect chain settings

use serde::{Deserialize, Serialize};
use wd_core::{
    CompressorSettings, EqSettings, GateSettings, ReverbSettings, NORMALIZE_GAIN_DB,
};

/// Effect settings owned by a track. Setters clamp every value into its
/// documented range; the renderer never re-validates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectChain {
    eq: EqSettings,
    compressor: CompressorSettings,
    gate: GateSettings,
    reverb: ReverbSettings,
    normalize_gain_db: f64,
}

impl EffectChain {
    pub fn eq(&self) -> &EqSettings {
        &self.eq
    }

    pub fn compressor(&self) -> &CompressorSettings {
        &self.compressor
    }

    pub fn gate(&self) -> &GateSettings {
        &self.gate
    }

    pub fn reverb(&self) -> &ReverbSettings {
        &self.reverb
    }

    pub fn normalize_gain_db(&self) -> f64 {
        self.normalize_gain_db
    }

    pub fn set_eq(&mut self, eq: EqSettings) {
        self.eq = eq.clamped();
    }

    pub fn set_compressor(&mut self, compressor: CompressorSettings) {
        self.compressor = compressor.clamped();
    }

    pub fn set_gate(&mut self, gate: GateSettings) {
        self.gate = gate.clamped();
    }

    pub fn set_reverb(&mut self, reverb: ReverbSettings) {
        self.reverb = reverb.clamped();
    }

    pub fn set_normalize_gain_db(&mut self, gain_db: f64) {
        self.normalize_gain_db = NORMALIZE_GAIN_DB.clamp(gain_db);
    }

    /// Copy with every value clamped. Used on data that bypassed the setters.
    pub fn clamped(self) -> Self {
        Self {
            eq: self.eq.clamped(),
            compressor: self.compressor.clamped(),
            gate: self.gate.clamped(),
            reverb: self.reverb.clamped(),
            normalize_gain_db: NORMALIZE_GAIN_DB.clamp(self.normalize_gain_db),
        }
    }

    /// True when any rendered stage is active. Reverb is display only.
    pub fn is_active(&self) -> bool {
        self.eq.enabled
            || self.compressor.enabled
            || self.gate.enabled
            || self.normalize_gain_db != 0.0
    }
}

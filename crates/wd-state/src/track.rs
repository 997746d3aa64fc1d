//! Tracks

use serde::{Deserialize, Serialize};
use wd_core::{GAIN, PAN, SEND_LEVEL};

use crate::automation::AutomationCurve;
use crate::effects::EffectChain;

/// Upper bound on audio tracks per project (mobile limit)
pub const MAX_AUDIO_TRACKS: usize = 8;

/// Track identifier, unique within a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub u64);

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "track-{}", self.0)
    }
}

/// Track type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackType {
    Master,
    #[default]
    Audio,
    Aux,
}

/// Aux send from one track to another
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AuxSend {
    pub target: TrackId,
    /// Send level (0..1)
    pub level: f64,
}

/// Mixer track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    /// Display position
    pub index: u32,
    pub name: String,
    pub track_type: TrackType,
    /// Linear gain (0..2)
    pub gain: f64,
    /// Pan (-1..1)
    pub pan: f64,
    pub muted: bool,
    pub solo: bool,
    pub armed: bool,
    pub effects: EffectChain,
    #[serde(default)]
    pub sends: Vec<AuxSend>,
    #[serde(default)]
    pub automation: Option<AutomationCurve>,
}

impl Track {
    pub fn new(id: TrackId, index: u32, name: impl Into<String>, track_type: TrackType) -> Self {
        Self {
            id,
            index,
            name: name.into(),
            track_type,
            gain: 1.0,
            pan: 0.0,
            muted: false,
            solo: false,
            armed: false,
            effects: EffectChain::default(),
            sends: Vec::new(),
            automation: None,
        }
    }

    pub fn is_master(&self) -> bool {
        self.track_type == TrackType::Master
    }

    /// Send level toward `target`, 0 when there is no send
    pub fn send_level(&self, target: TrackId) -> f64 {
        self.sends
            .iter()
            .find(|s| s.target == target)
            .map(|s| s.level)
            .unwrap_or(0.0)
    }

    /// Set a send level; a level of 0 removes the send
    pub fn set_send(&mut self, target: TrackId, level: f64) {
        let level = SEND_LEVEL.clamp(level);
        self.sends.retain(|s| s.target != target);
        if level > 0.0 {
            self.sends.push(AuxSend { target, level });
        }
    }

    /// Merge a patch, clamping numeric fields
    pub fn apply(&mut self, patch: TrackPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(gain) = patch.gain {
            self.gain = GAIN.clamp(gain);
        }
        if let Some(pan) = patch.pan {
            self.pan = PAN.clamp(pan);
        }
        if let Some(muted) = patch.muted {
            self.muted = muted;
        }
        if let Some(solo) = patch.solo {
            self.solo = solo;
        }
        if let Some(armed) = patch.armed {
            self.armed = armed;
        }
        if let Some(effects) = patch.effects {
            self.effects = effects.clamped();
        }
    }

    /// Clamp every stored value. Used after deserialization.
    pub(crate) fn sanitize(&mut self) {
        self.gain = GAIN.clamp(self.gain);
        self.pan = PAN.clamp(self.pan);
        self.effects = self.effects.clamped();
        for send in &mut self.sends {
            send.level = SEND_LEVEL.clamp(send.level);
        }
        if self.automation.as_ref().is_some_and(|a| a.len() < 2) {
            log::warn!("Dropping invalid automation on {}", self.id);
            self.automation = None;
        }
    }
}

/// Request for a new track
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackSpec {
    pub name: String,
    pub track_type: TrackType,
}

impl TrackSpec {
    pub fn audio(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            track_type: TrackType::Audio,
        }
    }

    pub fn aux(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            track_type: TrackType::Aux,
        }
    }
}

/// Partial track update; `None` fields are left alone
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackPatch {
    pub name: Option<String>,
    pub gain: Option<f64>,
    pub pan: Option<f64>,
    pub muted: Option<bool>,
    pub solo: Option<bool>,
    pub armed: Option<bool>,
    pub effects: Option<EffectChain>,
}

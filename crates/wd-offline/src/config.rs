//! Configuration for offline rendering

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{OfflineError, OfflineResult};

/// Offline render configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfflineConfig {
    /// Frames per processing block; cancellation is checked once per block
    pub block_size: usize,

    /// Number of peaks in the waveform attached to a render report
    pub waveform_points: usize,

    /// Write the `<output>.json` sidecar after a successful render
    pub write_sidecar: bool,

    /// Maximum concurrent renders in a batch (0 = rayon default)
    pub max_parallel_jobs: usize,
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            block_size: 1024,
            waveform_points: 200,
            write_sidecar: true,
            max_parallel_jobs: 0,
        }
    }
}

impl OfflineConfig {
    /// Load from a JSON file; missing fields take their defaults
    pub fn load(path: &Path) -> OfflineResult<Self> {
        let config: Self = wd_file::read_json(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> OfflineResult<()> {
        if self.block_size == 0 {
            return Err(OfflineError::InvalidConfig(
                "block_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Set block size
    pub fn with_block_size(mut self, frames: usize) -> Self {
        self.block_size = frames;
        self
    }

    /// Set waveform resolution
    pub fn with_waveform_points(mut self, points: usize) -> Self {
        self.waveform_points = points;
        self
    }

    pub fn with_sidecar(mut self, enabled: bool) -> Self {
        self.write_sidecar = enabled;
        self
    }

    /// Set batch parallelism
    pub fn with_max_parallel_jobs(mut self, jobs: usize) -> Self {
        self.max_parallel_jobs = jobs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("offline.json");
        std::fs::write(&path, r#"{ "block_size": 512 }"#).unwrap();

        let config = OfflineConfig::load(&path).unwrap();
        assert_eq!(config.block_size, 512);
        assert_eq!(config.waveform_points, 200);
        assert!(config.write_sidecar);
    }

    #[test]
    fn test_zero_block_size_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("offline.json");
        std::fs::write(&path, r#"{ "block_size": 0 }"#).unwrap();
        assert!(matches!(
            OfflineConfig::load(&path),
            Err(OfflineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_builders() {
        let config = OfflineConfig::default()
            .with_block_size(256)
            .with_sidecar(false)
            .with_max_parallel_jobs(2);
        assert_eq!(config.block_size, 256);
        assert!(!config.write_sidecar);
        assert_eq!(config.max_parallel_jobs, 2);
    }
}

//! Timeline view state

use serde::{Deserialize, Serialize};
use wd_core::snap_to_grid;

const MIN_PIXELS_PER_MS: f64 = 0.001;
const MAX_PIXELS_PER_MS: f64 = 10.0;

/// Visible window and snapping of the timeline editor. The renderer never
/// reads this; segment edits use it for snapping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineViewport {
    pub pixels_per_ms: f64,
    pub snap_enabled: bool,
    pub snap_grid_ms: f64,
    pub visible_start_ms: f64,
    pub visible_end_ms: f64,
}

impl Default for TimelineViewport {
    fn default() -> Self {
        Self {
            pixels_per_ms: 0.1,
            snap_enabled: false,
            snap_grid_ms: 100.0,
            visible_start_ms: 0.0,
            visible_end_ms: 30_000.0,
        }
    }
}

impl TimelineViewport {
    /// Snap a time to the grid when snapping is on
    pub fn snap(&self, time_ms: f64) -> f64 {
        if self.snap_enabled {
            snap_to_grid(time_ms, self.snap_grid_ms)
        } else {
            time_ms
        }
    }

    pub fn ms_to_px(&self, time_ms: f64) -> f64 {
        (time_ms - self.visible_start_ms) * self.pixels_per_ms
    }

    pub fn px_to_ms(&self, px: f64) -> f64 {
        self.visible_start_ms + px / self.pixels_per_ms
    }

    /// Zoom around `anchor_ms`, keeping it at the same screen position
    pub fn zoom(&mut self, factor: f64, anchor_ms: f64) {
        if factor <= 0.0 || !factor.is_finite() {
            return;
        }
        let anchor_px = self.ms_to_px(anchor_ms);
        let width_px = (self.visible_end_ms - self.visible_start_ms) * self.pixels_per_ms;
        self.pixels_per_ms =
            (self.pixels_per_ms * factor).clamp(MIN_PIXELS_PER_MS, MAX_PIXELS_PER_MS);
        self.visible_start_ms = (anchor_ms - anchor_px / self.pixels_per_ms).max(0.0);
        self.visible_end_ms = self.visible_start_ms + width_px / self.pixels_per_ms;
    }

    /// Shift the visible window, never before 0
    pub fn scroll(&mut self, delta_ms: f64) {
        let width = self.visible_end_ms - self.visible_start_ms;
        self.visible_start_ms = (self.visible_start_ms + delta_ms).max(0.0);
        self.visible_end_ms = self.visible_start_ms + width;
    }
}

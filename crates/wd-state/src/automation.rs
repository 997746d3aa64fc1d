//! Track automation curves

use serde::{Deserialize, Serialize};

/// Minimum number of points a curve keeps
pub const MIN_AUTOMATION_POINTS: usize = 2;

/// Interpolation between automation points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveType {
    #[default]
    Linear,
    Step,
    Exponential,
    Logarithmic,
    SCurve,
}

/// Automation point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AutomationPoint {
    pub time_ms: f64,
    pub value: f64,
}

impl AutomationPoint {
    pub const fn new(time_ms: f64, value: f64) -> Self {
        Self { time_ms, value }
    }
}

/// Time-ordered automation curve with at least two points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationCurve {
    points: Vec<AutomationPoint>,
    pub curve: CurveType,
}

impl AutomationCurve {
    /// Flat curve at `value` spanning `[0, end_ms]`
    pub fn flat(value: f64, end_ms: f64) -> Self {
        Self {
            points: vec![
                AutomationPoint::new(0.0, value),
                AutomationPoint::new(end_ms.max(0.0), value),
            ],
            curve: CurveType::Linear,
        }
    }

    /// Build from arbitrary points. `None` when fewer than two are given.
    pub fn from_points(mut points: Vec<AutomationPoint>, curve: CurveType) -> Option<Self> {
        if points.len() < MIN_AUTOMATION_POINTS {
            return None;
        }
        sort_points(&mut points);
        Some(Self { points, curve })
    }

    pub fn points(&self) -> &[AutomationPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Insert a point, keeping time order. Returns its index.
    pub fn add_point(&mut self, time_ms: f64, value: f64) -> usize {
        let idx = self.points.partition_point(|p| p.time_ms <= time_ms);
        self.points.insert(idx, AutomationPoint::new(time_ms, value));
        idx
    }

    /// Move/change an existing point; the curve is re-sorted afterwards.
    pub fn update_point(&mut self, index: usize, time_ms: f64, value: f64) -> bool {
        match self.points.get_mut(index) {
            Some(point) => {
                *point = AutomationPoint::new(time_ms, value);
                sort_points(&mut self.points);
                true
            }
            None => false,
        }
    }

    /// Remove a point. Refused when the curve would drop below two points.
    pub fn remove_point(&mut self, index: usize) -> bool {
        if index >= self.points.len() || self.points.len() <= MIN_AUTOMATION_POINTS {
            return false;
        }
        self.points.remove(index);
        true
    }

    /// Interpolated value at `time_ms`; held flat outside the curve
    pub fn value_at(&self, time_ms: f64) -> f64 {
        let (first, last) = match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 0.0,
        };
        if time_ms <= first.time_ms {
            return first.value;
        }
        if time_ms >= last.time_ms {
            return last.value;
        }

        let idx = self.points.partition_point(|p| p.time_ms <= time_ms);
        let p1 = &self.points[idx - 1];
        let p2 = &self.points[idx];
        let span = p2.time_ms - p1.time_ms;
        if span <= 0.0 {
            return p2.value;
        }
        let t = (time_ms - p1.time_ms) / span;
        interpolate(p1.value, p2.value, t, self.curve)
    }
}

fn sort_points(points: &mut [AutomationPoint]) {
    points.sort_by(|a, b| a.time_ms.total_cmp(&b.time_ms));
}

/// Interpolate between two values
fn interpolate(v1: f64, v2: f64, t: f64, curve: CurveType) -> f64 {
    match curve {
        CurveType::Linear => v1 + (v2 - v1) * t,
        CurveType::Step => v1,
        CurveType::Exponential => v1 + (v2 - v1) * t * t,
        CurveType::Logarithmic => v1 + (v2 - v1) * t.sqrt(),
        CurveType::SCurve => v1 + (v2 - v1) * t * t * (3.0 - 2.0 * t),
    }
}

//! Millisecond / sample conversions

/// Samples covered by `ms` at `sample_rate`, truncated toward zero
#[inline]
pub fn ms_to_samples(ms: f64, sample_rate: u32) -> usize {
    if ms <= 0.0 {
        return 0;
    }
    (ms / 1000.0 * sample_rate as f64) as usize
}

/// Time in ms of sample index `samples`
#[inline]
pub fn samples_to_ms(samples: usize, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    samples as f64 * 1000.0 / sample_rate as f64
}

/// Round `value` to the nearest multiple of `grid`
#[inline]
pub fn snap_to_grid(value: f64, grid: f64) -> f64 {
    if grid <= 0.0 {
        value
    } else {
        (value / grid).round() * grid
    }
}

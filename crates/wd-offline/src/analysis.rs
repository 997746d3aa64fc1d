//! Loudness analysis of rendered audio
//!
//! Integrated loudness after ITU-R BS.1770: K-weighting, 400 ms gating
//! blocks stepped every 100 ms, absolute gate at -70 LUFS and relative gate
//! 10 LU below the absolute-gated level.

use std::f64::consts::PI;

use wd_file::AudioBuffer;

const ABSOLUTE_GATE_LUFS: f64 = -70.0;
const RELATIVE_GATE_LU: f64 = -10.0;
/// 100 ms steps per 400 ms gating block
const STEPS_PER_BLOCK: usize = 4;

fn mean_square_to_lufs(mean_square: f64) -> f64 {
    if mean_square > 0.0 {
        -0.691 + 10.0 * mean_square.log10()
    } else {
        f64::NEG_INFINITY
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// K-WEIGHTING
// ═══════════════════════════════════════════════════════════════════════════════

/// Transposed direct form II biquad
#[derive(Debug, Clone, Copy)]
struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
    z1: f64,
    z2: f64,
}

impl Biquad {
    fn process(&mut self, x: f64) -> f64 {
        let y = self.b0 * x + self.z1;
        self.z1 = self.b1 * x - self.a1 * y + self.z2;
        self.z2 = self.b2 * x - self.a2 * y;
        y
    }

    fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}

/// Two-stage K-weighting: high shelf (+4 dB) then high pass (~38 Hz)
#[derive(Debug, Clone, Copy)]
struct KWeighting {
    shelf: Biquad,
    high_pass: Biquad,
}

impl KWeighting {
    fn new(sample_rate: f64) -> Self {
        let f0 = 1681.974450955533;
        let gain_db = 3.999843853973347;
        let q = 0.7071752369554196;
        let k = (PI * f0 / sample_rate).tan();
        let vh = 10f64.powf(gain_db / 20.0);
        let vb = vh.powf(0.4996667741545416);
        let a0 = 1.0 + k / q + k * k;
        let shelf = Biquad {
            b0: (vh + vb * k / q + k * k) / a0,
            b1: 2.0 * (k * k - vh) / a0,
            b2: (vh - vb * k / q + k * k) / a0,
            a1: 2.0 * (k * k - 1.0) / a0,
            a2: (1.0 - k / q + k * k) / a0,
            z1: 0.0,
            z2: 0.0,
        };

        let f0 = 38.13547087602444;
        let q = 0.5003270373238773;
        let k = (PI * f0 / sample_rate).tan();
        let a0 = 1.0 + k / q + k * k;
        let high_pass = Biquad {
            b0: 1.0,
            b1: -2.0,
            b2: 1.0,
            a1: 2.0 * (k * k - 1.0) / a0,
            a2: (1.0 - k / q + k * k) / a0,
            z1: 0.0,
            z2: 0.0,
        };

        Self { shelf, high_pass }
    }

    fn process(&mut self, x: f64) -> f64 {
        self.high_pass.process(self.shelf.process(x))
    }

    fn reset(&mut self) {
        self.shelf.reset();
        self.high_pass.reset();
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LOUDNESS METER
// ═══════════════════════════════════════════════════════════════════════════════

/// Integrated loudness meter over planar channel data
#[derive(Debug, Clone)]
pub struct LoudnessMeter {
    filters: Vec<KWeighting>,
    step_frames: usize,
    step_sum: f64,
    step_count: usize,
    /// Mean square of every completed 100 ms step
    steps: Vec<f64>,
    peak: f64,
}

impl LoudnessMeter {
    pub fn new(sample_rate: u32, channels: usize) -> Self {
        let sr = sample_rate.max(1) as f64;
        Self {
            filters: vec![KWeighting::new(sr); channels],
            step_frames: ((sr * 0.1) as usize).max(1),
            step_sum: 0.0,
            step_count: 0,
            steps: Vec::new(),
            peak: 0.0,
        }
    }

    /// Feed planar frames; channels beyond the meter's count are ignored
    pub fn process(&mut self, channels: &[&[f32]]) {
        let frames = channels.iter().map(|c| c.len()).min().unwrap_or(0);
        for frame in 0..frames {
            let mut sum = 0.0;
            for (ch, filter) in channels.iter().zip(self.filters.iter_mut()) {
                let sample = ch[frame] as f64;
                self.peak = self.peak.max(sample.abs());
                let weighted = filter.process(sample);
                sum += weighted * weighted;
            }
            self.step_sum += sum;
            self.step_count += 1;
            if self.step_count >= self.step_frames {
                self.steps.push(self.step_sum / self.step_count as f64);
                self.step_sum = 0.0;
                self.step_count = 0;
            }
        }
    }

    pub fn process_buffer(&mut self, buffer: &AudioBuffer) {
        let channels: Vec<&[f32]> = buffer.data.iter().map(Vec::as_slice).collect();
        self.process(&channels);
    }

    /// Sample peak seen so far (linear)
    pub fn peak(&self) -> f64 {
        self.peak
    }

    /// Gated integrated loudness in LUFS, `-inf` for silence or input
    /// shorter than one 100 ms step.
    pub fn integrated_lufs(&self) -> f64 {
        let blocks: Vec<f64> = if self.steps.len() < STEPS_PER_BLOCK {
            // Short material: one block over whatever was measured
            if self.steps.is_empty() {
                return f64::NEG_INFINITY;
            }
            vec![self.steps.iter().sum::<f64>() / self.steps.len() as f64]
        } else {
            self.steps
                .windows(STEPS_PER_BLOCK)
                .map(|w| w.iter().sum::<f64>() / STEPS_PER_BLOCK as f64)
                .collect()
        };

        let above_absolute: Vec<f64> = blocks
            .into_iter()
            .filter(|&ms| mean_square_to_lufs(ms) > ABSOLUTE_GATE_LUFS)
            .collect();
        if above_absolute.is_empty() {
            return f64::NEG_INFINITY;
        }

        let absolute_level = mean_square_to_lufs(
            above_absolute.iter().sum::<f64>() / above_absolute.len() as f64,
        );
        let relative_gate = absolute_level + RELATIVE_GATE_LU;
        let gated: Vec<f64> = above_absolute
            .into_iter()
            .filter(|&ms| mean_square_to_lufs(ms) > relative_gate)
            .collect();
        if gated.is_empty() {
            return f64::NEG_INFINITY;
        }
        mean_square_to_lufs(gated.iter().sum::<f64>() / gated.len() as f64)
    }

    pub fn reset(&mut self) {
        for filter in &mut self.filters {
            filter.reset();
        }
        self.step_sum = 0.0;
        self.step_count = 0;
        self.steps.clear();
        self.peak = 0.0;
    }
}

/// Integrated loudness of a whole buffer
pub fn integrated_loudness(buffer: &AudioBuffer) -> f64 {
    let mut meter = LoudnessMeter::new(buffer.sample_rate, buffer.channels);
    meter.process_buffer(buffer);
    meter.integrated_lufs()
}

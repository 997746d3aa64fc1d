//! Waveform peak extraction

use crate::wav::AudioBuffer;

/// Reduce `buffer` to `points` absolute peaks (max across channels per bucket).
///
/// Buckets split the frames as evenly as possible; a buffer shorter than
/// `points` yields one peak per frame.
pub fn peaks(buffer: &AudioBuffer, points: usize) -> Vec<f32> {
    if points == 0 || buffer.length == 0 {
        return Vec::new();
    }
    let count = points.min(buffer.length);
    (0..count)
        .map(|bucket| {
            let start = bucket * buffer.length / count;
            let end = ((bucket + 1) * buffer.length / count).max(start + 1);
            buffer
                .data
                .iter()
                .flat_map(|ch| ch[start..end].iter())
                .map(|s| s.abs())
                .fold(0.0, f32::max)
        })
        .collect()
}

/// Peaks of a single mono sample slice
pub fn peaks_from_samples(samples: &[f32], points: usize) -> Vec<f32> {
    let buffer = AudioBuffer {
        sample_rate: 0,
        channels: 1,
        length: samples.len(),
        data: vec![samples.to_vec()],
    };
    peaks(&buffer, points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peaks_bucket_max() {
        let samples = [0.1, -0.9, 0.2, 0.3, -0.4, 0.05];
        assert_eq!(peaks_from_samples(&samples, 3), vec![0.9, 0.3, 0.4]);
    }

    #[test]
    fn test_peaks_across_channels() {
        let buffer =
            AudioBuffer::from_channels(vec![vec![0.1, 0.1], vec![-0.5, 0.2]], 8000).unwrap();
        assert_eq!(peaks(&buffer, 2), vec![0.5, 0.2]);
    }

    #[test]
    fn test_peaks_short_buffer() {
        assert_eq!(peaks_from_samples(&[0.5, 0.25], 200).len(), 2);
        assert!(peaks_from_samples(&[], 10).is_empty());
    }
}

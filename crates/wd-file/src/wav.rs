//! 16-bit PCM WAV codec
//!
//! Reads RIFF/WAVE files by walking the chunk list (word aligned, unknown
//! chunks skipped) and writes the canonical 44-byte header layout.
//! Only uncompressed 16-bit PCM is accepted; anything else is a hard error.

use std::ops::Range;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FileError, FileResult};
use crate::persist::write_atomic;

/// Full-scale value used for both decoding and encoding
const PCM16_SCALE: f32 = 32767.0;

/// Size of the canonical header written by [`encode_wav`]
pub const WAV_HEADER_LEN: usize = 44;

// ═══════════════════════════════════════════════════════════════════════════════
// AUDIO BUFFER
// ═══════════════════════════════════════════════════════════════════════════════

/// Decoded audio, one `Vec<f32>` per channel, samples in [-1, 1]
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub sample_rate: u32,
    pub channels: usize,
    /// Frames per channel
    pub length: usize,
    pub data: Vec<Vec<f32>>,
}

impl AudioBuffer {
    /// Silent buffer
    pub fn new(channels: usize, length: usize, sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels,
            length,
            data: vec![vec![0.0; length]; channels],
        }
    }

    /// Wrap planar channel data. All channels must have the same length.
    pub fn from_channels(data: Vec<Vec<f32>>, sample_rate: u32) -> FileResult<Self> {
        let length = data.first().map(Vec::len).unwrap_or(0);
        if data.iter().any(|ch| ch.len() != length) {
            return Err(FileError::InvalidFile(
                "channels have different lengths".to_string(),
            ));
        }
        Ok(Self {
            sample_rate,
            channels: data.len(),
            length,
            data,
        })
    }

    /// Duration in milliseconds
    pub fn duration_ms(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.length as f64 * 1000.0 / self.sample_rate as f64
        }
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.data.get(index).map(Vec::as_slice)
    }

    /// Copy of frames in `range` (clamped to the buffer)
    pub fn slice(&self, range: Range<usize>) -> Self {
        let start = range.start.min(self.length);
        let end = range.end.clamp(start, self.length);
        Self {
            sample_rate: self.sample_rate,
            channels: self.channels,
            length: end - start,
            data: self.data.iter().map(|ch| ch[start..end].to_vec()).collect(),
        }
    }

    /// Absolute peak across all channels
    pub fn peak(&self) -> f32 {
        self.data
            .iter()
            .flat_map(|ch| ch.iter())
            .map(|s| s.abs())
            .fold(0.0, f32::max)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// HEADER PARSING
// ═══════════════════════════════════════════════════════════════════════════════

/// Format summary read without decoding samples
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WavInfo {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    /// Frames per channel actually present in the data chunk
    pub frames: usize,
    pub duration_ms: f64,
}

#[derive(Debug, Clone, Copy)]
struct FmtChunk {
    audio_format: u16,
    channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
}

#[inline]
fn read_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

#[inline]
fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// Walk the chunk list and return the format plus the byte range of the
/// sample data. A data chunk that claims more bytes than the file holds is
/// clamped to what is present.
fn parse_chunks(bytes: &[u8]) -> FileResult<(FmtChunk, Range<usize>)> {
    if bytes.len() < 12 || &bytes[0..4] != b"RIFF" {
        return Err(FileError::InvalidFile("missing RIFF header".to_string()));
    }
    if &bytes[8..12] != b"WAVE" {
        return Err(FileError::InvalidFile("missing WAVE identifier".to_string()));
    }

    let mut fmt: Option<FmtChunk> = None;
    let mut data: Option<Range<usize>> = None;
    let mut pos = 12usize;

    while pos + 8 <= bytes.len() {
        let id = &bytes[pos..pos + 4];
        let size = read_u32(bytes, pos + 4) as usize;
        let body = pos + 8;

        match id {
            b"fmt " => {
                if size < 16 || body + 16 > bytes.len() {
                    return Err(FileError::InvalidFile("truncated fmt chunk".to_string()));
                }
                fmt = Some(FmtChunk {
                    audio_format: read_u16(bytes, body),
                    channels: read_u16(bytes, body + 2),
                    sample_rate: read_u32(bytes, body + 4),
                    bits_per_sample: read_u16(bytes, body + 14),
                });
            }
            b"data" => {
                let end = body.saturating_add(size).min(bytes.len());
                if end < body.saturating_add(size) {
                    log::debug!(
                        "WAV data chunk declares {} bytes, {} present",
                        size,
                        end - body
                    );
                }
                data = Some(body..end);
            }
            _ => {}
        }

        if fmt.is_some() && data.is_some() {
            break;
        }

        // Chunks are word aligned: odd sizes carry one pad byte
        pos = body.saturating_add(size).saturating_add(size & 1);
    }

    let fmt = fmt.ok_or_else(|| FileError::InvalidFile("no fmt chunk".to_string()))?;
    let data = data.ok_or_else(|| FileError::InvalidFile("no data chunk".to_string()))?;

    if fmt.audio_format != 1 {
        return Err(FileError::UnsupportedFormat(format!(
            "WAV audio format {} (only PCM is supported)",
            fmt.audio_format
        )));
    }
    if fmt.bits_per_sample != 16 {
        return Err(FileError::UnsupportedFormat(format!(
            "{}-bit WAV (only 16-bit PCM is supported)",
            fmt.bits_per_sample
        )));
    }
    if fmt.channels == 0 {
        return Err(FileError::InvalidFile("WAV declares zero channels".to_string()));
    }
    if fmt.sample_rate == 0 {
        return Err(FileError::InvalidFile("WAV declares zero sample rate".to_string()));
    }

    Ok((fmt, data))
}

/// Read the format without decoding samples
pub fn probe_wav(bytes: &[u8]) -> FileResult<WavInfo> {
    let (fmt, data) = parse_chunks(bytes)?;
    let frames = data.len() / (2 * fmt.channels as usize);
    Ok(WavInfo {
        sample_rate: fmt.sample_rate,
        channels: fmt.channels,
        bits_per_sample: fmt.bits_per_sample,
        frames,
        duration_ms: frames as f64 * 1000.0 / fmt.sample_rate as f64,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// DECODE / ENCODE
// ═══════════════════════════════════════════════════════════════════════════════

/// Decode a 16-bit PCM WAV file image
pub fn decode_wav(bytes: &[u8]) -> FileResult<AudioBuffer> {
    let (fmt, range) = parse_chunks(bytes)?;
    let channels = fmt.channels as usize;
    let frame_bytes = 2 * channels;
    let length = range.len() / frame_bytes;
    let pcm = &bytes[range];

    let mut data = vec![Vec::with_capacity(length); channels];
    for frame in pcm.chunks_exact(frame_bytes) {
        for (ch, sample) in frame.chunks_exact(2).enumerate() {
            let value = i16::from_le_bytes([sample[0], sample[1]]);
            // -32768 would land just below -1.0
            data[ch].push((value as f32 / PCM16_SCALE).max(-1.0));
        }
    }

    Ok(AudioBuffer {
        sample_rate: fmt.sample_rate,
        channels,
        length,
        data,
    })
}

/// Encode to a canonical 16-bit PCM WAV image
pub fn encode_wav(buffer: &AudioBuffer) -> FileResult<Vec<u8>> {
    if buffer.channels == 0 || buffer.channels > u16::MAX as usize {
        return Err(FileError::EncodeError(format!(
            "cannot encode {} channels",
            buffer.channels
        )));
    }
    if buffer.data.len() != buffer.channels {
        return Err(FileError::EncodeError(format!(
            "buffer declares {} channels but holds {}",
            buffer.channels,
            buffer.data.len()
        )));
    }

    let channels = buffer.channels as u16;
    let block_align = channels as u32 * 2;
    let data_size = (buffer.length as u64) * block_align as u64;
    if data_size + 36 > u32::MAX as u64 {
        return Err(FileError::EncodeError(
            "audio too long for a RIFF container".to_string(),
        ));
    }
    let data_size = data_size as u32;
    let byte_rate = buffer.sample_rate.checked_mul(block_align).ok_or_else(|| {
        FileError::EncodeError(format!(
            "byte rate of {} Hz x {} channels overflows the header",
            buffer.sample_rate, buffer.channels
        ))
    })?;

    let mut out = Vec::with_capacity(WAV_HEADER_LEN + data_size as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_size).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&buffer.sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&(block_align as u16).to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());

    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_size.to_le_bytes());

    for frame in 0..buffer.length {
        for channel in &buffer.data {
            let sample = channel.get(frame).copied().unwrap_or(0.0).clamp(-1.0, 1.0);
            let quantized = (sample * PCM16_SCALE).round() as i16;
            out.extend_from_slice(&quantized.to_le_bytes());
        }
    }

    Ok(out)
}

// ═══════════════════════════════════════════════════════════════════════════════
// FILE HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

fn read_bytes(path: &Path) -> FileResult<Vec<u8>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(FileError::NotFound(path.display().to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Read and decode a WAV file
pub fn read_wav<P: AsRef<Path>>(path: P) -> FileResult<AudioBuffer> {
    let path = path.as_ref();
    let buffer = decode_wav(&read_bytes(path)?)?;
    log::debug!(
        "Decoded '{}': {} ch, {} Hz, {} frames",
        path.display(),
        buffer.channels,
        buffer.sample_rate,
        buffer.length
    );
    Ok(buffer)
}

/// Read only the format of a WAV file
pub fn read_wav_info<P: AsRef<Path>>(path: P) -> FileResult<WavInfo> {
    probe_wav(&read_bytes(path.as_ref())?)
}

/// Encode and write a WAV file. The file appears complete or not at all.
pub fn write_wav<P: AsRef<Path>>(path: P, buffer: &AudioBuffer) -> FileResult<()> {
    let bytes = encode_wav(buffer)?;
    write_atomic(path.as_ref(), &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_with(fmt_tag: u16, bits: u16) -> Vec<u8> {
        let buffer = AudioBuffer::from_channels(vec![vec![0.0; 4]], 8000).unwrap();
        let mut bytes = encode_wav(&buffer).unwrap();
        bytes[20..22].copy_from_slice(&fmt_tag.to_le_bytes());
        bytes[34..36].copy_from_slice(&bits.to_le_bytes());
        bytes
    }

    #[test]
    fn test_canonical_header_layout() {
        let buffer =
            AudioBuffer::from_channels(vec![vec![0.5; 10], vec![-0.5; 10]], 44100).unwrap();
        let bytes = encode_wav(&buffer).unwrap();

        assert_eq!(bytes.len(), WAV_HEADER_LEN + 40);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(read_u32(&bytes, 4), 36 + 40);
        assert_eq!(&bytes[8..16], b"WAVEfmt ");
        assert_eq!(read_u16(&bytes, 22), 2);
        assert_eq!(read_u32(&bytes, 24), 44100);
        assert_eq!(read_u32(&bytes, 28), 44100 * 4);
        assert_eq!(read_u16(&bytes, 32), 4);
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(read_u32(&bytes, 40), 40);
    }

    #[test]
    fn test_quantize_rounds_and_clamps() {
        let buffer = AudioBuffer::from_channels(vec![vec![1.5, -2.0, 0.5, 0.0]], 8000).unwrap();
        let bytes = encode_wav(&buffer).unwrap();
        let pcm: Vec<i16> = bytes[44..]
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        assert_eq!(pcm, vec![32767, -32767, 16384, 0]);
    }

    #[test]
    fn test_decode_min_code_clamps_to_minus_one() {
        let buffer = AudioBuffer::from_channels(vec![vec![0.0]], 8000).unwrap();
        let mut bytes = encode_wav(&buffer).unwrap();
        bytes[44..46].copy_from_slice(&i16::MIN.to_le_bytes());
        let decoded = decode_wav(&bytes).unwrap();
        assert_eq!(decoded.data[0][0], -1.0);
    }

    #[test]
    fn test_oversized_sample_rate_fails_to_encode() {
        let buffer = AudioBuffer::from_channels(vec![vec![0.25; 8], vec![0.5; 8]], 8000).unwrap();
        let mut bytes = encode_wav(&buffer).unwrap();
        bytes[24..28].copy_from_slice(&u32::MAX.to_le_bytes());

        let decoded = decode_wav(&bytes).unwrap();
        assert_eq!(decoded.sample_rate, u32::MAX);
        assert!(matches!(encode_wav(&decoded), Err(FileError::EncodeError(_))));
    }

    #[test]
    fn test_rejects_non_pcm_and_non_16_bit() {
        assert!(matches!(
            decode_wav(&header_with(3, 16)),
            Err(FileError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            decode_wav(&header_with(1, 24)),
            Err(FileError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_rejects_bad_magic() {
        let mut bytes = header_with(1, 16);
        bytes[0..4].copy_from_slice(b"RIFX");
        assert!(matches!(decode_wav(&bytes), Err(FileError::InvalidFile(_))));
        assert!(matches!(decode_wav(b"ID3"), Err(FileError::InvalidFile(_))));
    }

    #[test]
    fn test_missing_data_chunk() {
        let bytes = header_with(1, 16);
        let truncated = &bytes[..36];
        assert!(matches!(decode_wav(truncated), Err(FileError::InvalidFile(_))));
    }

    #[test]
    fn test_skips_odd_sized_unknown_chunk() {
        let buffer = AudioBuffer::from_channels(vec![vec![0.25, -0.25]], 22050).unwrap();
        let canonical = encode_wav(&buffer).unwrap();

        // RIFF/WAVE + fmt, then a 3-byte LIST chunk plus pad, then data
        let mut bytes = canonical[..36].to_vec();
        bytes.extend_from_slice(b"LIST");
        bytes.extend_from_slice(&3u32.to_le_bytes());
        bytes.extend_from_slice(&[1, 2, 3, 0]);
        bytes.extend_from_slice(&canonical[36..]);

        let decoded = decode_wav(&bytes).unwrap();
        assert_eq!(decoded.length, 2);
        assert!((decoded.data[0][0] - 0.25).abs() < 1e-4);
    }

    #[test]
    fn test_truncated_data_is_clamped() {
        let buffer = AudioBuffer::from_channels(vec![vec![0.1; 100]], 8000).unwrap();
        let bytes = encode_wav(&buffer).unwrap();
        // Drop the last 51 bytes; the dangling half sample is ignored
        let decoded = decode_wav(&bytes[..bytes.len() - 51]).unwrap();
        assert_eq!(decoded.length, 74);
    }

    #[test]
    fn test_probe() {
        let buffer = AudioBuffer::new(2, 4410, 44100);
        let info = probe_wav(&encode_wav(&buffer).unwrap()).unwrap();
        assert_eq!(info.channels, 2);
        assert_eq!(info.frames, 4410);
        assert_eq!(info.duration_ms, 100.0);
    }

    #[test]
    fn test_slice_clamps() {
        let buffer = AudioBuffer::from_channels(vec![vec![0.0, 0.1, 0.2, 0.3]], 8000).unwrap();
        let part = buffer.slice(1..10);
        assert_eq!(part.length, 3);
        assert_eq!(part.data[0][0], 0.1);
        assert_eq!(buffer.slice(5..2).length, 0);
    }

    #[test]
    fn test_from_channels_rejects_ragged() {
        assert!(AudioBuffer::from_channels(vec![vec![0.0; 3], vec![0.0; 2]], 8000).is_err());
    }
}

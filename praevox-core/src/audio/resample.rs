//! Whole-buffer sample-rate conversion using a rubato `FftFixedIn` resampler.
//!
//! ## Design
//!
//! Recordings arrive at whatever rate the source device used (commonly
//! 44.1 or 48 kHz). The pipeline needs 16 kHz mono f32. `FftFixedIn` is a
//! synchronous FFT-based resampler, i.e. band-limited interpolation — linear
//! interpolation is not acceptable here because its aliasing is audible to
//! the downstream recognition model.
//!
//! The resampler works in fixed-size input chunks and carries a group delay
//! of `output_delay()` frames. Offline operation feeds every full chunk,
//! flushes the tail with partial processing, then drops the delay and
//! truncates to the exact expected length.
//!
//! When input rate == target rate the buffer passes through untouched.

use rubato::{FftFixedIn, Resampler};
use tracing::debug;

use crate::audio::buffer::SampleBuffer;
use crate::error::{PipelineError, Result};

/// Input frames fed to rubato per process call.
const CHUNK_SIZE: usize = 1024;

/// Sub-chunk count for `FftFixedIn` — one sub-chunk per process call.
const SUB_CHUNKS: usize = 1;

/// Convert `buffer` to `target_rate`, preserving spectral content up to the
/// new Nyquist frequency.
///
/// # Errors
/// Returns `PipelineError::Resample` if the rubato session cannot be
/// created or fails mid-stream (e.g. a degenerate rate pair).
pub fn resample(buffer: SampleBuffer, target_rate: u32) -> Result<SampleBuffer> {
    if buffer.sample_rate == target_rate {
        return Ok(buffer);
    }
    if buffer.is_empty() {
        return Ok(SampleBuffer::new(Vec::new(), target_rate));
    }

    let src_rate = buffer.sample_rate;
    let ratio = target_rate as f64 / src_rate as f64;
    let expected = (buffer.len() as f64 * ratio).round() as usize;

    let mut resampler = FftFixedIn::<f32>::new(
        src_rate as usize,
        target_rate as usize,
        CHUNK_SIZE,
        SUB_CHUNKS,
        1, // mono
    )
    .map_err(|e| PipelineError::Resample(format!("session init: {e}")))?;

    let delay = resampler.output_delay();
    let mut out: Vec<f32> = Vec::with_capacity(expected + CHUNK_SIZE);

    let mut chunks = buffer.samples.chunks_exact(CHUNK_SIZE);
    for chunk in &mut chunks {
        let produced = resampler
            .process(&[chunk], None)
            .map_err(|e| PipelineError::Resample(e.to_string()))?;
        out.extend_from_slice(&produced[0]);
    }

    let tail = chunks.remainder();
    if !tail.is_empty() {
        let produced = resampler
            .process_partial(Some(&[tail]), None)
            .map_err(|e| PipelineError::Resample(e.to_string()))?;
        out.extend_from_slice(&produced[0]);
    }

    // Flush the internal buffer until the delay plus the full expected
    // output has drained. Each partial call emits one chunk's worth, so
    // this is bounded.
    let mut flushes = 0;
    while out.len() < delay + expected {
        let produced = resampler
            .process_partial(None::<&[&[f32]]>, None)
            .map_err(|e| PipelineError::Resample(e.to_string()))?;
        if produced[0].is_empty() {
            break;
        }
        out.extend_from_slice(&produced[0]);
        flushes += 1;
        if flushes > 4 + expected / CHUNK_SIZE {
            break;
        }
    }

    let start = delay.min(out.len());
    let end = (delay + expected).min(out.len());
    let samples = out[start..end].to_vec();

    debug!(
        src_rate,
        target_rate,
        in_len = buffer.len(),
        out_len = samples.len(),
        "resampled"
    );

    Ok(SampleBuffer::new(samples, target_rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    fn sine(freq: f32, rate: u32, secs: f32) -> Vec<f32> {
        let n = (rate as f32 * secs) as usize;
        (0..n)
            .map(|i| (TAU * freq * i as f32 / rate as f32).sin() * 0.5)
            .collect()
    }

    #[test]
    fn passthrough_at_equal_rates() {
        let samples: Vec<f32> = (0..480).map(|i| i as f32 * 0.001).collect();
        let buf = SampleBuffer::new(samples.clone(), 16_000);
        let out = resample(buf, 16_000).unwrap();
        assert_eq!(out.samples, samples);
    }

    #[test]
    fn empty_input_stays_empty() {
        let out = resample(SampleBuffer::new(vec![], 48_000), 16_000).unwrap();
        assert!(out.is_empty());
        assert_eq!(out.sample_rate, 16_000);
    }

    #[test]
    fn downsample_48k_to_16k_has_exact_length() {
        let buf = SampleBuffer::new(sine(440.0, 48_000, 2.0), 48_000);
        let in_len = buf.len();
        let out = resample(buf, 16_000).unwrap();
        assert_eq!(out.sample_rate, 16_000);
        assert_eq!(out.len(), in_len / 3);
    }

    #[test]
    fn upsample_8k_to_16k_has_exact_length() {
        let buf = SampleBuffer::new(sine(200.0, 8_000, 1.0), 8_000);
        let out = resample(buf, 16_000).unwrap();
        assert_eq!(out.len(), 16_000);
    }

    #[test]
    fn resample_44100_to_16k_ratio_holds() {
        let buf = SampleBuffer::new(sine(440.0, 44_100, 1.0), 44_100);
        let out = resample(buf, 16_000).unwrap();
        let expected = (44_100.0f64 * (16_000.0 / 44_100.0)).round() as usize;
        assert_eq!(out.len(), expected);
    }

    #[test]
    fn tone_survives_downsampling() {
        // A 440 Hz tone is far below the 8 kHz output Nyquist; its energy
        // must survive the conversion roughly intact.
        let buf = SampleBuffer::new(sine(440.0, 48_000, 1.0), 48_000);
        let out = resample(buf, 16_000).unwrap();
        // Skip the edges where the FFT windows taper
        let inner = &out.samples[1_000..out.samples.len() - 1_000];
        let rms =
            (inner.iter().map(|s| (*s as f64) * (*s as f64)).sum::<f64>() / inner.len() as f64)
                .sqrt();
        // RMS of a 0.5-amplitude sine ≈ 0.3536
        assert!((rms - 0.3536).abs() < 0.02, "rms={rms}");
    }
}

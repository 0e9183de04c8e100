//! Spectral-gating noise suppression.
//!
//! ## Algorithm
//!
//! 1. STFT the buffer: 512-point FFT, Hann analysis window, hop 256. The
//!    signal is zero-padded by one hop at the head (and one frame at the
//!    tail) so every original sample sits under a full window sum.
//! 2. Estimate a noise profile — the per-bin mean magnitude over the frames
//!    inside the first 0.5 s of the recording (the whole buffer if it is
//!    shorter). The profile is recomputed fresh on every call; it is never
//!    accumulated, so repeated application does not run away.
//! 3. Gate: bins whose magnitude falls below `profile × GATE_MARGIN` are
//!    treated as noise-dominated and scaled by `1 − strength`. Bins above
//!    the threshold are left untouched.
//! 4. Inverse FFT and overlap-add (the periodic Hann window at 50 % overlap
//!    sums to exactly one), then slice out the original span.
//!
//! A buffer shorter than one analysis frame passes through unchanged —
//! this stage never fails.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use tracing::debug;

use crate::audio::buffer::SampleBuffer;

/// STFT frame length in samples (32 ms at 16 kHz, matches the VAD window).
const FFT_SIZE: usize = 512;
/// Analysis hop — 50 % overlap.
const HOP: usize = FFT_SIZE / 2;
/// Length of the noise-estimation region at the head of the buffer.
const NOISE_PROFILE_SECS: f64 = 0.5;
/// A bin is noise-dominated when its magnitude is below this multiple of
/// the profile mean for that bin.
const GATE_MARGIN: f32 = 1.5;

/// Attenuate noise-dominated spectral bins by `strength` (a proportion in
/// [0, 1]; 0.6 removes 60 % of gated-bin energy).
pub fn spectral_gate(buffer: SampleBuffer, strength: f32) -> SampleBuffer {
    let len = buffer.len();
    if len < FFT_SIZE {
        debug!(len, "buffer shorter than one frame — skipping noise gate");
        return buffer;
    }
    let strength = strength.clamp(0.0, 1.0);

    let mut planner = FftPlanner::<f32>::new();
    let forward = planner.plan_fft_forward(FFT_SIZE);
    let inverse = planner.plan_fft_inverse(FFT_SIZE);

    // Periodic Hann window — w[k] + w[k + HOP] == 1, so 50 %-overlap
    // overlap-add reconstructs exactly.
    let window: Vec<f32> = (0..FFT_SIZE)
        .map(|n| 0.5 - 0.5 * (std::f32::consts::TAU * n as f32 / FFT_SIZE as f32).cos())
        .collect();

    // One hop of leading padding puts every original sample under two
    // overlapping windows; generous tail padding covers the last frame.
    let mut padded = vec![0.0f32; HOP + len + FFT_SIZE];
    padded[HOP..HOP + len].copy_from_slice(&buffer.samples);
    let frame_count = (len - 1) / HOP + 2;

    // Forward pass: windowed spectra for every frame.
    let mut spectra: Vec<Vec<Complex<f32>>> = Vec::with_capacity(frame_count);
    for frame_idx in 0..frame_count {
        let start = frame_idx * HOP;
        let mut frame: Vec<Complex<f32>> = padded[start..start + FFT_SIZE]
            .iter()
            .zip(window.iter())
            .map(|(s, w)| Complex::new(s * w, 0.0))
            .collect();
        forward.process(&mut frame);
        spectra.push(frame);
    }

    // Noise profile from the frames covering the head of the recording.
    let noise_end = ((buffer.sample_rate as f64 * NOISE_PROFILE_SECS) as usize).min(len);
    let profile_frames = spectra
        .iter()
        .enumerate()
        .take_while(|(idx, _)| idx * HOP < noise_end + HOP)
        .count()
        .max(1);
    let mut profile = vec![0.0f32; FFT_SIZE];
    for spectrum in &spectra[..profile_frames] {
        for (bin, value) in spectrum.iter().enumerate() {
            profile[bin] += value.norm();
        }
    }
    for value in profile.iter_mut() {
        *value /= profile_frames as f32;
    }

    // Gate and reconstruct.
    let keep = 1.0 - strength;
    let mut acc = vec![0.0f32; padded.len()];
    let scale = 1.0 / FFT_SIZE as f32;

    for (frame_idx, spectrum) in spectra.iter_mut().enumerate() {
        for (bin, value) in spectrum.iter_mut().enumerate() {
            if value.norm() < profile[bin] * GATE_MARGIN {
                *value *= keep;
            }
        }
        inverse.process(spectrum);

        let start = frame_idx * HOP;
        for (n, value) in spectrum.iter().enumerate() {
            acc[start + n] += value.re * scale;
        }
    }

    let out = acc[HOP..HOP + len].to_vec();

    debug!(
        frames = frame_count,
        profile_frames, strength, "applied spectral gate"
    );
    SampleBuffer::new(out, buffer.sample_rate)
}

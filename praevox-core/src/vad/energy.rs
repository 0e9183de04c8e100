//! Energy-based speech-probability model.
//!
//! ## Mapping
//!
//! `p = rms / (rms + reference_rms)` — a smooth, monotonic map from frame
//! energy to a pseudo-probability. A frame at exactly the reference level
//! scores 0.5, so the default pairs naturally with the default
//! `vad_threshold` of 0.5. Pure and deterministic, which keeps segmenter
//! tests reproducible.

use super::SpeechProbabilityModel;
use crate::dsp::rms;
use crate::error::Result;

/// Analysis window shared with the neural backend so segment boundaries are
/// consistent across models (512 samples = 32 ms at 16 kHz).
pub const WINDOW: usize = 512;

/// A simple energy-based speech-probability model.
#[derive(Debug, Clone)]
pub struct EnergyModel {
    /// RMS level mapping to probability 0.5.
    /// Typical range: 0.01–0.05 for a quiet microphone.
    reference_rms: f32,
}

impl EnergyModel {
    /// Create a new `EnergyModel`.
    ///
    /// # Parameters
    /// - `reference_rms`: RMS level at which a frame scores 0.5.
    ///   Default: `0.02`.
    pub fn new(reference_rms: f32) -> Self {
        Self {
            reference_rms: reference_rms.max(1e-6),
        }
    }
}

impl Default for EnergyModel {
    fn default() -> Self {
        Self::new(0.02)
    }
}

impl SpeechProbabilityModel for EnergyModel {
    fn window_size(&self) -> usize {
        WINDOW
    }

    fn predict(&mut self, frame: &[f32]) -> Result<f32> {
        let level = rms(frame);
        Ok(level / (level + self.reference_rms))
    }

    fn reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn silence_scores_zero() {
        let mut model = EnergyModel::default();
        let p = model.predict(&vec![0.0f32; WINDOW]).unwrap();
        assert_abs_diff_eq!(p, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn reference_level_scores_half() {
        let mut model = EnergyModel::new(0.02);
        // ±0.02 square wave has RMS exactly 0.02
        let frame: Vec<f32> = (0..WINDOW)
            .map(|i| if i % 2 == 0 { 0.02 } else { -0.02 })
            .collect();
        let p = model.predict(&frame).unwrap();
        assert_abs_diff_eq!(p, 0.5, epsilon = 1e-4);
    }

    #[test]
    fn loud_frame_scores_near_one() {
        let mut model = EnergyModel::default();
        let frame: Vec<f32> = (0..WINDOW)
            .map(|i| if i % 2 == 0 { 0.8 } else { -0.8 })
            .collect();
        let p = model.predict(&frame).unwrap();
        assert!(p > 0.95, "p={p}");
        assert!(p < 1.0);
    }

    #[test]
    fn prediction_is_deterministic() {
        let mut model = EnergyModel::default();
        let frame: Vec<f32> = (0..WINDOW).map(|i| (i as f32 * 0.07).sin() * 0.1).collect();
        let a = model.predict(&frame).unwrap();
        let b = model.predict(&frame).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn probability_is_monotonic_in_level() {
        let mut model = EnergyModel::default();
        let mut last = -1.0f32;
        for amp in [0.0f32, 0.005, 0.02, 0.1, 0.5] {
            let frame = vec![amp; WINDOW];
            let p = model.predict(&frame).unwrap();
            assert!(p > last || (p == 0.0 && last < 0.0), "not monotonic at {amp}");
            last = p;
        }
    }
}

//! Pipeline configuration.
//!
//! One immutable snapshot per invocation. Validation happens exactly once,
//! when the `Pipeline` is constructed — a config that passed `validate()`
//! can never fail a stage mid-pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Configuration for one pipeline invocation.
///
/// Constructed once (at process start or per request) and read-only
/// thereafter — no stage mutates it. Safely shared by reference across
/// concurrent invocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Output sample rate (Hz). Default: 16000.
    pub target_sample_rate: u32,
    /// Output channel count. Fixed at 1 (mono); validation rejects others.
    pub target_channels: u16,

    /// High-pass cutoff (Hz). `None` or `0` bypasses the filter.
    /// Default: 80 Hz.
    pub hp_cutoff_hz: Option<f32>,
    /// Low-pass cutoff (Hz). `None`, `0`, or ≥ Nyquist bypasses the filter.
    /// Default: 3800 Hz.
    pub lp_cutoff_hz: Option<f32>,

    /// Whether to apply spectral-gating noise suppression. Default: off.
    pub noise_enabled: bool,
    /// Proportion of attenuation applied to noise-dominated bins, in [0, 1].
    /// Default: 0.6.
    pub noise_reduction_strength: f32,

    /// Whether to apply RMS loudness normalization. Default: on.
    pub normalize_enabled: bool,
    /// Target RMS level for normalization. Default: 0.1.
    pub normalize_target_rms: f32,

    /// Whether to run voice-activity segmentation. When disabled the whole
    /// buffer is treated as one speech segment and silence compression
    /// becomes a no-op. Default: on.
    pub vad_enabled: bool,
    /// Speech-probability threshold in [0, 1]. Default: 0.5.
    pub vad_threshold: f32,
    /// Candidate segments shorter than this are discarded as non-speech.
    /// Default: 250 ms.
    pub min_speech_duration_ms: u32,
    /// Speech runs separated by silence shorter than this are merged.
    /// Default: 100 ms.
    pub min_silence_duration_ms: u32,
    /// Padding added to both sides of each surviving segment. Default: 30 ms.
    pub speech_pad_ms: u32,
    /// When the model cannot load or run: `true` treats the whole buffer as
    /// one speech segment (logged), `false` fails the invocation.
    /// Default: false.
    pub vad_fallback_full_buffer: bool,

    /// Whether to compress silence between speech segments. Default: on.
    pub silence_enabled: bool,
    /// Gaps longer than this are collapsed. Default: 600 ms.
    pub max_gap_ms: u32,
    /// Silence retained at each edge of a collapsed gap. Default: 150 ms.
    pub keep_ms: u32,

    /// Trim threshold for residual edge silence, in dB below peak.
    /// Default: 25 dB.
    pub trim_db: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 16_000,
            target_channels: 1,
            hp_cutoff_hz: Some(80.0),
            lp_cutoff_hz: Some(3_800.0),
            noise_enabled: false,
            noise_reduction_strength: 0.6,
            normalize_enabled: true,
            normalize_target_rms: 0.1,
            vad_enabled: true,
            vad_threshold: 0.5,
            min_speech_duration_ms: 250,
            min_silence_duration_ms: 100,
            speech_pad_ms: 30,
            vad_fallback_full_buffer: false,
            silence_enabled: true,
            max_gap_ms: 600,
            keep_ms: 150,
            trim_db: 25.0,
        }
    }
}

impl PipelineConfig {
    /// Validate the snapshot. Called once at `Pipeline` construction.
    ///
    /// # Errors
    /// Returns `PipelineError::Config` naming the offending option.
    pub fn validate(&self) -> Result<()> {
        if self.target_sample_rate == 0 {
            return Err(PipelineError::Config(
                "target_sample_rate must be non-zero".into(),
            ));
        }
        if self.target_channels != 1 {
            return Err(PipelineError::Config(format!(
                "target_channels is fixed at 1, got {}",
                self.target_channels
            )));
        }
        if !(0.0..=1.0).contains(&self.vad_threshold) {
            return Err(PipelineError::Config(format!(
                "vad_threshold must be in [0, 1], got {}",
                self.vad_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.noise_reduction_strength) {
            return Err(PipelineError::Config(format!(
                "noise_reduction_strength must be in [0, 1], got {}",
                self.noise_reduction_strength
            )));
        }
        if !self.normalize_target_rms.is_finite() || self.normalize_target_rms <= 0.0 {
            return Err(PipelineError::Config(format!(
                "normalize_target_rms must be positive, got {}",
                self.normalize_target_rms
            )));
        }
        if !self.trim_db.is_finite() || self.trim_db <= 0.0 {
            return Err(PipelineError::Config(format!(
                "trim_db must be positive, got {}",
                self.trim_db
            )));
        }
        for (name, cutoff) in [
            ("hp_cutoff_hz", self.hp_cutoff_hz),
            ("lp_cutoff_hz", self.lp_cutoff_hz),
        ] {
            if let Some(hz) = cutoff {
                if !hz.is_finite() || hz < 0.0 {
                    return Err(PipelineError::Config(format!(
                        "{name} must be a finite non-negative frequency, got {hz}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Convert a millisecond duration option to samples at the target rate.
    pub(crate) fn ms_to_samples(&self, ms: u32) -> usize {
        (ms as u64 * self.target_sample_rate as u64 / 1000) as usize
    }
}

//! Pipeline orchestration.
//!
//! ## Stage order (per invocation)
//!
//! ```text
//! 1. Validate PCM handoff → downmix to mono → resample to target rate
//! 2. DC removal (always) → spectral noise gate (config-gated)
//! 3. Butterworth high-pass → low-pass (each independently bypassable)
//! 4. RMS loudness normalization (clamped gain)
//! 5. VAD segmentation (frame scores → SpeechSegments)
//! 6. Silence compression (bounded retention around segments)
//! 7. Trim residual edge silence → clip → cast to 16-bit PCM
//! ```
//!
//! One invocation is a pure, synchronous, single-threaded transform; the
//! stages run strictly in order on one owned buffer. Distinct invocations
//! are independent and may run concurrently — the only shared state is the
//! read-only config and the mutex-guarded model handle. `process_async`
//! offloads the CPU-bound work (dominated by the model pass) onto the
//! blocking pool so async callers are never stalled.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::audio::buffer::{InputPcm, SampleBuffer};
use crate::audio::resample::resample;
use crate::compress::compress_silence;
use crate::config::PipelineConfig;
use crate::dsp::filter::FilterSpec;
use crate::dsp::{bias, denoise, filter, finalize, normalize};
use crate::error::{PipelineError, Result};
use crate::segment::{detect_segments, full_buffer_segment, SpeechSegment};
use crate::vad::{energy::EnergyModel, ModelHandle};

/// Statistics reported to the caller for one processed recording.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingStats {
    pub original_duration_ms: u64,
    pub final_duration_ms: u64,
    pub original_sample_rate: u32,
    pub original_channels: u16,
    pub speech_segment_count: usize,
    pub silence_removed_ms: u64,
    /// `silence_removed_ms / original_duration_ms`, in [0, 1].
    pub compression_ratio: f32,
    pub noise_reduced: bool,
    pub normalized: bool,
    /// Ordered journal of the stages that ran, for observability.
    pub stages_completed: Vec<String>,
}

/// Output of one pipeline invocation: mono 16-bit PCM at the target rate.
#[derive(Debug)]
pub struct ProcessedAudio {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub stats: ProcessingStats,
}

/// The conditioning pipeline. Holds the validated config snapshot and the
/// speech-probability model; both are read-only across invocations, so one
/// `Pipeline` (behind `Arc`) serves any number of concurrent recordings.
pub struct Pipeline {
    config: PipelineConfig,
    model: ModelHandle,
}

impl Pipeline {
    /// Build a pipeline with the default energy-based speech model.
    ///
    /// # Errors
    /// `PipelineError::Config` when the config fails validation.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        Self::with_model(config, ModelHandle::new(EnergyModel::default()))
    }

    /// Build a pipeline with a custom frame→probability model.
    ///
    /// Warms the model up once. If warm-up fails while VAD is enabled, the
    /// construction fails with `ModelUnavailable` — unless the config opts
    /// into the whole-buffer fallback, in which case the failure is logged
    /// and deferred to run time.
    pub fn with_model(config: PipelineConfig, model: ModelHandle) -> Result<Self> {
        config.validate()?;

        if config.vad_enabled {
            if let Err(e) = model.0.lock().warm_up() {
                if config.vad_fallback_full_buffer {
                    warn!(error = %e, "model warm-up failed — whole-buffer fallback will apply");
                } else {
                    return Err(PipelineError::ModelUnavailable(e.to_string()));
                }
            }
        }

        Ok(Self { config, model })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the full conditioning pipeline on one decoded recording.
    ///
    /// # Errors
    /// - `Decode` — the handoff is not structurally valid PCM.
    /// - `Resample` — the resampler session failed.
    /// - `ModelUnavailable` — VAD enabled, model failed, and the
    ///   whole-buffer fallback is not configured.
    pub fn process(&self, input: InputPcm) -> Result<ProcessedAudio> {
        input.validate()?;

        let original_sample_rate = input.sample_rate;
        let original_channels = input.channels;
        let original_duration_ms =
            input.frame_count() as u64 * 1000 / original_sample_rate as u64;
        let mut stages: Vec<String> = Vec::with_capacity(8);

        info!(
            sample_rate = original_sample_rate,
            channels = original_channels,
            duration_ms = original_duration_ms,
            "processing recording"
        );

        // ── 1. Downmix + resample ────────────────────────────────────────
        let buffer = input.downmix();
        if original_channels > 1 {
            stages.push(format!("downmix:{original_channels}ch"));
        }
        let mut buffer = resample(buffer, self.config.target_sample_rate)?;
        if original_sample_rate != self.config.target_sample_rate {
            stages.push(format!("resample:{}Hz", self.config.target_sample_rate));
        }

        // ── 2. Bias & noise conditioning ─────────────────────────────────
        bias::remove_dc(&mut buffer.samples);
        stages.push("dc_removal".into());

        let noise_reduced = self.config.noise_enabled;
        if noise_reduced {
            buffer = denoise::spectral_gate(buffer, self.config.noise_reduction_strength);
            stages.push(format!(
                "noise_gate:{:.2}",
                self.config.noise_reduction_strength
            ));
        }

        // ── 3. Bandpass ──────────────────────────────────────────────────
        let high_pass = FilterSpec::high_pass(self.config.hp_cutoff_hz, buffer.sample_rate);
        let low_pass = FilterSpec::low_pass(self.config.lp_cutoff_hz, buffer.sample_rate);
        filter::apply(&high_pass, &mut buffer.samples);
        filter::apply(&low_pass, &mut buffer.samples);
        for spec in [&high_pass, &low_pass] {
            if !spec.is_bypassed() {
                stages.push(format!(
                    "filter:{:?}@{}Hz",
                    spec.kind,
                    spec.cutoff_hz.unwrap_or_default()
                ));
            }
        }

        // ── 4. Loudness normalization ────────────────────────────────────
        let normalized = self.config.normalize_enabled;
        if normalized {
            let gain = normalize::normalize_rms(&mut buffer.samples, self.config.normalize_target_rms);
            stages.push(format!("normalize:gain={gain:.3}"));
        }

        // ── 5. VAD segmentation ──────────────────────────────────────────
        let segments = self.segment(&buffer)?;
        stages.push(format!("vad:{}_segments", segments.len()));

        // ── 6. Silence compression ───────────────────────────────────────
        let (buffer, removed_samples) = if self.config.silence_enabled {
            let outcome = compress_silence(
                buffer,
                &segments,
                self.config.max_gap_ms,
                self.config.keep_ms,
            );
            (outcome.buffer, outcome.removed_samples)
        } else {
            (buffer, 0)
        };
        let silence_removed_ms =
            removed_samples as u64 * 1000 / self.config.target_sample_rate as u64;
        stages.push(format!("silence_compression:{silence_removed_ms}ms"));

        // ── 7. Finalize ──────────────────────────────────────────────────
        let (samples, sample_rate) = finalize::finalize(buffer, self.config.trim_db);
        stages.push("finalize:pcm16".into());

        let final_duration_ms = samples.len() as u64 * 1000 / sample_rate as u64;
        let compression_ratio = if original_duration_ms == 0 {
            0.0
        } else {
            (silence_removed_ms as f64 / original_duration_ms as f64).clamp(0.0, 1.0) as f32
        };

        let stats = ProcessingStats {
            original_duration_ms,
            final_duration_ms,
            original_sample_rate,
            original_channels,
            speech_segment_count: segments.len(),
            silence_removed_ms,
            compression_ratio,
            noise_reduced,
            normalized,
            stages_completed: stages,
        };

        info!(
            final_duration_ms,
            removed_ms = silence_removed_ms,
            segments = stats.speech_segment_count,
            ratio = stats.compression_ratio,
            "processing complete"
        );

        Ok(ProcessedAudio {
            samples,
            sample_rate,
            stats,
        })
    }

    /// Offload one invocation to the blocking pool. The model pass is the
    /// latency-dominant step and would otherwise stall the async executor.
    pub async fn process_async(self: Arc<Self>, input: InputPcm) -> Result<ProcessedAudio> {
        tokio::task::spawn_blocking(move || self.process(input))
            .await
            .map_err(|e| PipelineError::Other(anyhow::anyhow!("pipeline task panicked: {e}")))?
    }

    fn segment(&self, buffer: &SampleBuffer) -> Result<Vec<SpeechSegment>> {
        if !self.config.vad_enabled {
            debug!("VAD disabled — whole buffer treated as speech");
            return Ok(full_buffer_segment(buffer));
        }

        match detect_segments(buffer, &self.model, &self.config) {
            Ok(segments) => Ok(segments),
            Err(e @ PipelineError::ModelUnavailable(_)) => {
                if self.config.vad_fallback_full_buffer {
                    warn!(
                        error = %e,
                        "VAD model unavailable — falling back to whole-buffer speech segment"
                    );
                    Ok(full_buffer_segment(buffer))
                } else {
                    Err(e)
                }
            }
            Err(e) => Err(e),
        }
    }
}

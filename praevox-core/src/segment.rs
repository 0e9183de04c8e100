//! Voice-activity segmentation.
//!
//! Runs the speech-probability model over fixed-size, non-overlapping
//! analysis frames and reconciles the probabilistic labels with hard timing
//! constraints:
//!
//! 1. Partition the buffer into frames of the model's window size; the
//!    trailing partial frame is left unscored.
//! 2. Score each frame (single pass, in frame order — the model is
//!    deterministic, so the pass is reproducible).
//! 3. Threshold at `vad_threshold` (≥ is speech).
//! 4. Merge speech runs separated by less than `min_silence_duration_ms`.
//! 5. Discard runs shorter than `min_speech_duration_ms` — spurious
//!    one-frame detections would otherwise cause boundary churn downstream.
//! 6. Widen survivors by `speech_pad_ms` per side, clamp to the buffer and
//!    re-merge any neighbors the padding made touch.
//!
//! Segment boundary precision is bounded by the model's window (32 ms for
//! the 512-sample window at 16 kHz).

use tracing::{debug, warn};

use crate::audio::buffer::SampleBuffer;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::vad::{ModelHandle, VadFrameScore};

/// A half-open span of speech samples `[start_sample, end_sample)`.
///
/// Produced in ascending, non-overlapping order with both bounds inside
/// `[0, buffer length]`; scoped to one pipeline invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeechSegment {
    pub start_sample: usize,
    pub end_sample: usize,
}

impl SpeechSegment {
    pub fn len(&self) -> usize {
        self.end_sample - self.start_sample
    }

    pub fn is_empty(&self) -> bool {
        self.end_sample <= self.start_sample
    }

    pub fn duration_ms(&self, sample_rate: u32) -> u64 {
        self.len() as u64 * 1000 / sample_rate as u64
    }
}

/// One segment spanning the entire buffer (VAD disabled, or explicit
/// model-failure fallback).
pub fn full_buffer_segment(buffer: &SampleBuffer) -> Vec<SpeechSegment> {
    if buffer.is_empty() {
        return Vec::new();
    }
    vec![SpeechSegment {
        start_sample: 0,
        end_sample: buffer.len(),
    }]
}

/// Classify the buffer into speech segments.
///
/// # Errors
/// `PipelineError::ModelUnavailable` when the model cannot score a frame.
/// The caller decides between failing the invocation and the explicit
/// whole-buffer fallback.
pub fn detect_segments(
    buffer: &SampleBuffer,
    model: &ModelHandle,
    config: &PipelineConfig,
) -> Result<Vec<SpeechSegment>> {
    let mut model = model.0.lock();
    let window = model.window_size();
    if window == 0 {
        return Err(PipelineError::ModelUnavailable(
            "model reports a zero-length analysis window".into(),
        ));
    }

    let frame_count = buffer.len() / window;
    if frame_count == 0 {
        debug!(len = buffer.len(), window, "buffer shorter than one frame");
        return Ok(Vec::new());
    }

    // Score every frame in order.
    model.reset();
    let mut labels: Vec<bool> = Vec::with_capacity(frame_count);
    for frame_index in 0..frame_count {
        let frame = &buffer.samples[frame_index * window..(frame_index + 1) * window];
        let probability = model
            .predict(frame)
            .map_err(|e| PipelineError::ModelUnavailable(e.to_string()))?;
        let score = VadFrameScore {
            frame_index,
            probability: probability.clamp(0.0, 1.0),
        };
        labels.push(score.probability >= config.vad_threshold);
    }

    // Consecutive speech frames → candidate runs, in frame units.
    let mut runs: Vec<(usize, usize)> = Vec::new();
    let mut current: Option<usize> = None;
    for (idx, &is_speech) in labels.iter().enumerate() {
        match (is_speech, current) {
            (true, None) => current = Some(idx),
            (false, Some(start)) => {
                runs.push((start, idx));
                current = None;
            }
            _ => {}
        }
    }
    if let Some(start) = current {
        runs.push((start, frame_count));
    }

    let min_silence = config.ms_to_samples(config.min_silence_duration_ms);
    let min_speech = config.ms_to_samples(config.min_speech_duration_ms);
    let pad = config.ms_to_samples(config.speech_pad_ms);

    // Merge runs separated by silence shorter than min_silence.
    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(runs.len());
    for run in runs {
        match merged.last_mut() {
            Some(last) if (run.0 - last.1) * window < min_silence => last.1 = run.1,
            _ => merged.push(run),
        }
    }

    // Drop runs shorter than min_speech, pad the rest, clamp, re-merge.
    let mut segments: Vec<SpeechSegment> = Vec::with_capacity(merged.len());
    for (start_frame, end_frame) in merged {
        let length = (end_frame - start_frame) * window;
        if length < min_speech {
            continue;
        }
        let start_sample = (start_frame * window).saturating_sub(pad);
        let end_sample = (end_frame * window + pad).min(buffer.len());
        match segments.last_mut() {
            Some(last) if start_sample <= last.end_sample => {
                last.end_sample = end_sample.max(last.end_sample);
            }
            _ => segments.push(SpeechSegment {
                start_sample,
                end_sample,
            }),
        }
    }

    if segments.is_empty() {
        warn!(frames = frame_count, "no speech detected above threshold");
    } else {
        debug!(
            frames = frame_count,
            segments = segments.len(),
            "segmentation complete"
        );
    }
    Ok(segments)
}

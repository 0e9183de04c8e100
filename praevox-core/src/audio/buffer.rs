//! Typed sample buffers passed between pipeline stages.

use crate::error::{PipelineError, Result};

/// A contiguous block of mono PCM samples at a known sample rate.
///
/// Every stage past the resampler consumes and produces one of these; a
/// stage takes ownership of its input and hands ownership of the (possibly
/// in-place transformed) output forward. Values are unconstrained in range
/// until the finalizer clips to [-1.0, 1.0].
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    /// Mono f32 samples.
    pub samples: Vec<f32>,
    /// Sample rate in Hz (e.g. 16000, 44100, 48000).
    pub sample_rate: u32,
}

impl SampleBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration of this buffer in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.samples.len() as u64 * 1000 / self.sample_rate as u64
    }

    /// Duration of this buffer in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Raw decoded PCM as handed over by the external decode step: interleaved
/// f32 samples at an arbitrary rate and channel count.
#[derive(Debug, Clone)]
pub struct InputPcm {
    /// Interleaved samples, `channels` values per frame.
    pub samples: Vec<f32>,
    /// Source sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count (≥ 1).
    pub channels: u16,
}

impl InputPcm {
    /// Wrap already-mono samples.
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
            channels: 1,
        }
    }

    /// Structural validation of the PCM handoff.
    ///
    /// # Errors
    /// `PipelineError::Decode` when the buffer cannot be a valid PCM stream:
    /// zero sample rate, zero channels, or a length that is not a whole
    /// number of frames.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(PipelineError::Decode("sample rate is zero".into()));
        }
        if self.channels == 0 {
            return Err(PipelineError::Decode("channel count is zero".into()));
        }
        if self.samples.len() % self.channels as usize != 0 {
            return Err(PipelineError::Decode(format!(
                "{} samples do not divide into {} channels",
                self.samples.len(),
                self.channels
            )));
        }
        Ok(())
    }

    /// Number of frames (samples per channel).
    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    /// Downmix to mono by unweighted averaging across channels.
    ///
    /// Single-channel input is moved, not copied.
    pub fn downmix(self) -> SampleBuffer {
        if self.channels <= 1 {
            return SampleBuffer::new(self.samples, self.sample_rate);
        }

        let ch = self.channels as usize;
        let inv = 1.0 / ch as f32;
        let mono: Vec<f32> = self
            .samples
            .chunks_exact(ch)
            .map(|frame| frame.iter().sum::<f32>() * inv)
            .collect();

        SampleBuffer::new(mono, self.sample_rate)
    }
}

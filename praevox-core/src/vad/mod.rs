//! Speech-probability model abstraction.
//!
//! The `SpeechProbabilityModel` trait is the primary extensibility point:
//! swap in `EnergyModel` (default), `SileroVad` (feature `onnx`), or any
//! future neural classifier without touching the segmenter. The model is an
//! opaque, deterministic pure function from one fixed-size audio frame to a
//! scalar probability — same frame in, same probability out, which is what
//! makes segmentation reproducible in tests.
//!
//! `&mut self` on `predict` intentionally allows stateful backends (RNN
//! hidden states); all mutation is serialised through `ModelHandle`'s
//! `parking_lot::Mutex`.

pub mod energy;

#[cfg(feature = "onnx")]
pub mod silero;

#[cfg(feature = "onnx")]
pub use silero::SileroVad;

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;

/// Speech probability for one analysis frame. Ephemeral — consumed
/// immediately while building speech segments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VadFrameScore {
    pub frame_index: usize,
    /// Probability of speech in [0.0, 1.0].
    pub probability: f32,
}

/// Contract for frame-to-probability speech classifiers.
pub trait SpeechProbabilityModel: Send + 'static {
    /// The frame length (in samples at the pipeline's target rate) this
    /// model expects. The segmenter partitions the buffer into
    /// non-overlapping frames of exactly this size.
    fn window_size(&self) -> usize;

    /// One-time warm-up: load weights, run a dummy inference. Called once
    /// when the pipeline is constructed.
    ///
    /// # Errors
    /// Returns an error if model files are missing or corrupt.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }

    /// Score one frame of exactly `window_size()` samples.
    ///
    /// Must be deterministic: the same frame always yields the same
    /// probability.
    fn predict(&mut self, frame: &[f32]) -> Result<f32>;

    /// Reset all internal state (e.g. RNN hidden states) between buffers.
    fn reset(&mut self);
}

/// Thread-safe reference-counted handle to any `SpeechProbabilityModel`.
///
/// Uses `parking_lot::Mutex` for non-poisoning on panic and a faster
/// uncontended lock than `std::sync::Mutex`.
#[derive(Clone)]
pub struct ModelHandle(pub Arc<Mutex<dyn SpeechProbabilityModel>>);

impl ModelHandle {
    /// Wrap any `SpeechProbabilityModel` in a `ModelHandle`.
    pub fn new<M: SpeechProbabilityModel>(model: M) -> Self {
        Self(Arc::new(Mutex::new(model)))
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle").finish_non_exhaustive()
    }
}

//! # praevox-core
//!
//! Speech-recording conditioning pipeline for automatic transcription.
//!
//! ## Architecture
//!
//! ```text
//! InputPcm ─► Downmix/Resample ─► DC + NoiseGate ─► Butterworth HP/LP
//!                                                          │
//!                                                   RMS Normalize
//!                                                          │
//!                                            VAD Segmenter (frame → prob)
//!                                                          │
//!                                                  Silence Compressor
//!                                                          │
//!                                          Trim / Clip / i16 ─► ProcessedAudio
//! ```
//!
//! One invocation is a pure synchronous transform over an owned buffer;
//! concurrent invocations share only the read-only `PipelineConfig` and the
//! mutex-guarded model handle. Ingestion, storage, and container decoding
//! are external collaborators — this crate starts at decoded PCM and ends
//! at mono 16-bit samples plus a stats report.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod audio;
pub mod compress;
pub mod config;
pub mod dsp;
pub mod error;
pub mod pipeline;
pub mod segment;
pub mod vad;

// Convenience re-exports for downstream crates
pub use audio::buffer::{InputPcm, SampleBuffer};
pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use pipeline::{Pipeline, ProcessedAudio, ProcessingStats};
pub use segment::SpeechSegment;
pub use vad::{energy::EnergyModel, ModelHandle, SpeechProbabilityModel, VadFrameScore};

#[cfg(feature = "onnx")]
pub use vad::SileroVad;

use thiserror::Error;

/// All errors produced by praevox-core.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The input could not be interpreted as PCM audio. Fatal for this
    /// invocation; the caller decides whether to fail open (hand the
    /// original bytes downstream unmodified) or fail the request.
    #[error("input cannot be decoded as PCM: {0}")]
    Decode(String),

    /// The speech-probability model failed to load or run while VAD was
    /// enabled. Whether the pipeline falls back to a whole-buffer segment
    /// is decided by `PipelineConfig::vad_fallback_full_buffer`.
    #[error("speech model unavailable: {0}")]
    ModelUnavailable(String),

    /// Invalid configuration, rejected at load — never mid-pipeline.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Resampler session error.
    #[error("resample error: {0}")]
    Resample(String),

    #[error("ONNX session error: {0}")]
    OnnxSession(String),

    #[error("model file not found: {path}")]
    ModelNotFound { path: std::path::PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

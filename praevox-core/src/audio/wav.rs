//! WAV decode/encode collaborator interface (hound).
//!
//! Container demuxing for arbitrary formats belongs to an external
//! decode-to-PCM service; this module covers the one concrete format the
//! pipeline itself speaks — PCM WAV in, 16-bit PCM WAV out — for the CLI
//! front-end and for tests.

use std::io::Cursor;

use crate::audio::buffer::InputPcm;
use crate::error::{PipelineError, Result};

/// Decode a WAV byte stream into interleaved f32 PCM.
///
/// Integer sample formats are scaled to [-1.0, 1.0] by their bit depth.
///
/// # Errors
/// `PipelineError::Decode` when the bytes are not parseable WAV — the
/// caller may fail open and hand the original bytes downstream unmodified.
pub fn decode_wav(bytes: &[u8]) -> Result<InputPcm> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| PipelineError::Decode(e.to_string()))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| PipelineError::Decode(e.to_string()))?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| PipelineError::Decode(e.to_string()))?
        }
    };

    let pcm = InputPcm {
        samples,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    };
    pcm.validate()?;
    Ok(pcm)
}

/// Encode mono 16-bit samples as a WAV byte stream.
pub fn encode_wav(samples: &[i16], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut writer = hound::WavWriter::new(&mut cursor, spec)
        .map_err(|e| PipelineError::Other(anyhow::anyhow!("wav writer: {e}")))?;
    for &sample in samples {
        writer
            .write_sample(sample)
            .map_err(|e| PipelineError::Other(anyhow::anyhow!("wav write: {e}")))?;
    }
    writer
        .finalize()
        .map_err(|e| PipelineError::Other(anyhow::anyhow!("wav finalize: {e}")))?;

    Ok(cursor.into_inner())
}

//! Silence compression.
//!
//! Rewrites the buffer so every speech segment survives untouched while
//! long stretches of silence collapse to a bounded margin. Gaps at or under
//! `max_gap_ms` are natural pauses and are kept whole — shortening them
//! would damage speech rhythm. Longer gaps keep `keep_ms` of the original
//! room tone from each edge and drop the interior, so splice points carry
//! real ambience instead of synthetic zeros.
//!
//! All splices happen at exact sample boundaries of retained spans; samples
//! are never reordered or resampled.

use tracing::debug;

use crate::audio::buffer::SampleBuffer;
use crate::segment::SpeechSegment;

/// Result of one compression pass.
#[derive(Debug)]
pub struct CompressionOutcome {
    pub buffer: SampleBuffer,
    /// Samples dropped from gap interiors.
    pub removed_samples: usize,
}

/// Collapse silence around the given segments.
///
/// Invariants:
/// - output duration ≤ input duration;
/// - every sample inside a speech segment appears exactly once, in its
///   original relative order;
/// - gaps ≤ `max_gap_ms` (or too short to split) are retained in full.
///
/// An empty segment list leaves the buffer unchanged — with voice activity
/// found nowhere there is nothing safe to anchor a cut to.
pub fn compress_silence(
    buffer: SampleBuffer,
    segments: &[SpeechSegment],
    max_gap_ms: u32,
    keep_ms: u32,
) -> CompressionOutcome {
    if segments.is_empty() {
        return CompressionOutcome {
            buffer,
            removed_samples: 0,
        };
    }

    let rate = buffer.sample_rate as u64;
    let max_gap = (max_gap_ms as u64 * rate / 1000) as usize;
    let keep = (keep_ms as u64 * rate / 1000) as usize;

    let mut out: Vec<f32> = Vec::with_capacity(buffer.len());
    let mut removed = 0usize;
    let mut cursor = 0usize;

    let retain_gap = |out: &mut Vec<f32>, removed: &mut usize, start: usize, end: usize| {
        let gap = end - start;
        if gap <= max_gap || gap <= 2 * keep {
            out.extend_from_slice(&buffer.samples[start..end]);
        } else {
            out.extend_from_slice(&buffer.samples[start..start + keep]);
            out.extend_from_slice(&buffer.samples[end - keep..end]);
            *removed += gap - 2 * keep;
        }
    };

    for segment in segments {
        let start = segment.start_sample.min(buffer.len());
        let end = segment.end_sample.min(buffer.len());
        if start > cursor {
            retain_gap(&mut out, &mut removed, cursor, start);
        }
        out.extend_from_slice(&buffer.samples[start..end]);
        cursor = end;
    }
    if cursor < buffer.len() {
        retain_gap(&mut out, &mut removed, cursor, buffer.len());
    }

    debug!(
        in_len = buffer.len(),
        out_len = out.len(),
        removed,
        segments = segments.len(),
        "compressed silence"
    );

    CompressionOutcome {
        buffer: SampleBuffer::new(out, buffer.sample_rate),
        removed_samples: removed,
    }
}

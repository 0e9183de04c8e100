//! Final conditioning: edge trim, clip, fixed-point cast.

use tracing::debug;

use crate::audio::buffer::SampleBuffer;

/// Strip leading and trailing spans whose amplitude sits more than
/// `trim_db` below the buffer's peak.
///
/// Interior quiet spans are never touched — only the edges. An all-silent
/// buffer trims to empty.
pub fn trim_edges(buffer: SampleBuffer, trim_db: f32) -> SampleBuffer {
    let peak = buffer
        .samples
        .iter()
        .fold(0.0f32, |acc, s| acc.max(s.abs()));
    if peak <= 0.0 {
        return SampleBuffer::new(Vec::new(), buffer.sample_rate);
    }

    let threshold = peak * 10f32.powf(-trim_db / 20.0);
    let first = buffer.samples.iter().position(|s| s.abs() >= threshold);
    let last = buffer.samples.iter().rposition(|s| s.abs() >= threshold);

    match (first, last) {
        (Some(first), Some(last)) => {
            let trimmed = buffer.samples[first..=last].to_vec();
            debug!(
                lead = first,
                tail = buffer.samples.len() - last - 1,
                "trimmed edge silence"
            );
            SampleBuffer::new(trimmed, buffer.sample_rate)
        }
        _ => SampleBuffer::new(Vec::new(), buffer.sample_rate),
    }
}

/// Clamp every sample into [-1.0, 1.0]. Guards against overshoot left by
/// the filter and gain stages.
pub fn clip(samples: &mut [f32]) {
    for sample in samples.iter_mut() {
        *sample = sample.clamp(-1.0, 1.0);
    }
}

/// Cast to 16-bit PCM with rounding, saturating at the i16 range.
pub fn to_pcm16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|s| (s * 32_767.0).round().clamp(-32_768.0, 32_767.0) as i16)
        .collect()
}

/// Run the full finalization pass: trim, clip, cast. Never fails.
pub fn finalize(buffer: SampleBuffer, trim_db: f32) -> (Vec<i16>, u32) {
    let sample_rate = buffer.sample_rate;
    let mut trimmed = trim_edges(buffer, trim_db);
    clip(&mut trimmed.samples);
    (to_pcm16(&trimmed.samples), sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_quiet_edges_only() {
        let mut samples = vec![0.001f32; 100];
        samples.extend(vec![0.5f32; 200]);
        samples.extend(vec![0.001f32; 300]);
        let out = trim_edges(SampleBuffer::new(samples, 16_000), 25.0);
        assert_eq!(out.samples.len(), 200);
        assert!(out.samples.iter().all(|s| *s == 0.5));
    }

    #[test]
    fn interior_silence_is_preserved() {
        let mut samples = vec![0.5f32; 100];
        samples.extend(vec![0.0f32; 400]);
        samples.extend(vec![0.5f32; 100]);
        let out = trim_edges(SampleBuffer::new(samples, 16_000), 25.0);
        assert_eq!(out.samples.len(), 600);
    }

    #[test]
    fn threshold_is_relative_to_peak() {
        // 25 dB below a 0.5 peak is ≈ 0.028: a 0.05 edge stays, 0.01 goes.
        let mut samples = vec![0.01f32; 50];
        samples.extend(vec![0.05f32; 50]);
        samples.extend(vec![0.5f32; 100]);
        let out = trim_edges(SampleBuffer::new(samples, 16_000), 25.0);
        assert_eq!(out.samples.len(), 150);
    }

    #[test]
    fn all_silence_trims_to_empty() {
        let out = trim_edges(SampleBuffer::new(vec![0.0; 1_000], 16_000), 25.0);
        assert!(out.is_empty());
    }

    #[test]
    fn clip_bounds_overshoot() {
        let mut samples = vec![-3.0f32, -1.0, -0.5, 0.0, 0.5, 1.0, 2.5];
        clip(&mut samples);
        assert!(samples.iter().all(|s| (-1.0..=1.0).contains(s)));
        assert_eq!(samples[0], -1.0);
        assert_eq!(samples[6], 1.0);
        assert_eq!(samples[2], -0.5);
    }

    #[test]
    fn pcm16_cast_is_full_scale() {
        let out = to_pcm16(&[1.0, -1.0, 0.0, 0.5]);
        assert_eq!(out[0], 32_767);
        assert_eq!(out[1], -32_767);
        assert_eq!(out[2], 0);
        assert_eq!(out[3], 16_384);
    }

    #[test]
    fn finalize_output_is_in_range() {
        let samples: Vec<f32> = (0..2_000).map(|i| ((i as f32) * 0.01).sin() * 4.0).collect();
        let (pcm, rate) = finalize(SampleBuffer::new(samples, 16_000), 25.0);
        assert_eq!(rate, 16_000);
        assert!(!pcm.is_empty());
        // i16 is inherently bounded; spot-check the clip actually engaged
        assert!(pcm.iter().any(|s| *s == 32_767 || *s == -32_767));
    }
}

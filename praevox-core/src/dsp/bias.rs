//! DC-offset removal.
//!
//! Cheap microphone front-ends and some decoders leave a constant bias on
//! the waveform; the high-pass stage would eventually drain it, but a
//! biased buffer skews the noise profile and the RMS measurement taken
//! before filtering. Removal is unconditional and O(n).

/// Subtract the arithmetic mean of the buffer from every sample.
///
/// The mean is accumulated in f64 so long buffers don't lose precision.
/// Empty buffers pass through.
pub fn remove_dc(samples: &mut [f32]) {
    if samples.is_empty() {
        return;
    }
    let mean = (samples.iter().map(|s| *s as f64).sum::<f64>() / samples.len() as f64) as f32;
    for sample in samples.iter_mut() {
        *sample -= mean;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn mean(samples: &[f32]) -> f64 {
        samples.iter().map(|s| *s as f64).sum::<f64>() / samples.len() as f64
    }

    #[test]
    fn removes_constant_offset() {
        let mut samples: Vec<f32> = (0..1_000)
            .map(|i| 0.25 + (i as f32 * 0.1).sin() * 0.3)
            .collect();
        remove_dc(&mut samples);
        assert_abs_diff_eq!(mean(&samples), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn zero_mean_input_unchanged_mean() {
        let mut samples: Vec<f32> = (0..512)
            .map(|i| if i % 2 == 0 { 0.4 } else { -0.4 })
            .collect();
        remove_dc(&mut samples);
        assert_abs_diff_eq!(mean(&samples), 0.0, epsilon = 1e-7);
    }

    #[test]
    fn all_dc_buffer_becomes_silence() {
        let mut samples = vec![0.7f32; 256];
        remove_dc(&mut samples);
        assert!(samples.iter().all(|s| s.abs() < 1e-6));
    }

    #[test]
    fn single_sample_becomes_zero() {
        let mut samples = vec![0.9f32];
        remove_dc(&mut samples);
        assert_abs_diff_eq!(samples[0], 0.0, epsilon = 1e-7);
    }

    #[test]
    fn empty_buffer_is_a_no_op() {
        let mut samples: Vec<f32> = vec![];
        remove_dc(&mut samples);
        assert!(samples.is_empty());
    }
}

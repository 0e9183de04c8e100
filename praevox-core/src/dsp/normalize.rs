//! RMS loudness normalization.

use tracing::debug;

use crate::dsp::rms;

/// Lower gain clamp — already-loud material is never attenuated below this.
pub const GAIN_MIN: f32 = 0.1;
/// Upper gain clamp — near-silent material is never amplified above this.
pub const GAIN_MAX: f32 = 10.0;
/// Guards the division on silent input.
const EPSILON: f32 = 1e-6;

/// Scale the buffer so its RMS approaches `target_rms`.
///
/// `gain = target_rms / (rms + 1e-6)`, clamped to `[0.1, 10.0]`. The clamp
/// bounds are a contract: they cap the amplification a near-silent recording
/// can receive and the attenuation applied to hot material. Returns the gain
/// that was applied.
pub fn normalize_rms(samples: &mut [f32], target_rms: f32) -> f32 {
    let current = rms(samples);
    let gain = (target_rms / (current + EPSILON)).clamp(GAIN_MIN, GAIN_MAX);

    for sample in samples.iter_mut() {
        *sample *= gain;
    }

    debug!(current_rms = current, gain, "normalized loudness");
    gain
}

//! Butterworth band-limiting stage.
//!
//! Two independent 4th-order Butterworth IIR filters — high-pass below the
//! voice band, low-pass above it — each realized as a cascade of two
//! second-order sections designed by bilinear transform (RBJ cookbook
//! formulation with the Butterworth pole-pair Q values). Sections run in
//! direct form II transposed with f64 state.
//!
//! Application is causal, forward-only, single pass. That introduces a
//! frequency-dependent phase shift; the downstream cutoff calibration
//! assumes exactly this phase behavior, so a zero-phase (forward-backward)
//! mode is intentionally not offered.

use tracing::debug;

/// Which side of the band the filter bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    HighPass,
    LowPass,
}

/// A designed-per-invocation filter description.
///
/// The filter order is fixed at 4. A spec whose cutoff is absent, zero, or
/// at/above Nyquist is a bypass: `apply` leaves the buffer untouched.
#[derive(Debug, Clone, Copy)]
pub struct FilterSpec {
    pub kind: FilterKind,
    pub cutoff_hz: Option<f32>,
    pub sample_rate_hz: u32,
}

/// Butterworth pole-pair Q values for an order-4 cascade.
const SECTION_Q: [f64; 2] = [0.541_196_100_146_197, 1.306_562_964_876_377];

impl FilterSpec {
    pub const ORDER: u32 = 4;

    pub fn high_pass(cutoff_hz: Option<f32>, sample_rate_hz: u32) -> Self {
        Self {
            kind: FilterKind::HighPass,
            cutoff_hz,
            sample_rate_hz,
        }
    }

    pub fn low_pass(cutoff_hz: Option<f32>, sample_rate_hz: u32) -> Self {
        Self {
            kind: FilterKind::LowPass,
            cutoff_hz,
            sample_rate_hz,
        }
    }

    /// A filter is a no-op when its cutoff is absent, non-positive, or not
    /// strictly inside (0, Nyquist).
    pub fn is_bypassed(&self) -> bool {
        let nyquist = self.sample_rate_hz as f32 / 2.0;
        match self.cutoff_hz {
            None => true,
            Some(hz) => !(hz > 0.0 && hz < nyquist),
        }
    }
}

/// One second-order section, direct form II transposed.
#[derive(Debug, Clone, Copy)]
struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
    z1: f64,
    z2: f64,
}

impl Biquad {
    /// RBJ bilinear-transform design for one section.
    fn design(kind: FilterKind, cutoff_hz: f64, sample_rate_hz: f64, q: f64) -> Self {
        let w0 = std::f64::consts::TAU * cutoff_hz / sample_rate_hz;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q);

        let (b0, b1, b2) = match kind {
            FilterKind::HighPass => {
                let k = (1.0 + cos_w0) / 2.0;
                (k, -(1.0 + cos_w0), k)
            }
            FilterKind::LowPass => {
                let k = (1.0 - cos_w0) / 2.0;
                (k, 1.0 - cos_w0, k)
            }
        };
        let a0 = 1.0 + alpha;
        let inv_a0 = 1.0 / a0;

        Self {
            b0: b0 * inv_a0,
            b1: b1 * inv_a0,
            b2: b2 * inv_a0,
            a1: -2.0 * cos_w0 * inv_a0,
            a2: (1.0 - alpha) * inv_a0,
            z1: 0.0,
            z2: 0.0,
        }
    }

    #[inline]
    fn process(&mut self, x: f64) -> f64 {
        let y = self.b0 * x + self.z1;
        self.z1 = self.b1 * x - self.a1 * y + self.z2;
        self.z2 = self.b2 * x - self.a2 * y;
        y
    }
}

/// Apply the filter causally, in place. Bypassed specs leave the buffer
/// bit-for-bit unchanged. Never fails.
pub fn apply(spec: &FilterSpec, samples: &mut [f32]) {
    if spec.is_bypassed() || samples.is_empty() {
        return;
    }
    // is_bypassed() guarantees a cutoff strictly inside (0, Nyquist) here
    let cutoff = spec.cutoff_hz.unwrap_or_default() as f64;
    let rate = spec.sample_rate_hz as f64;

    let mut sections = [
        Biquad::design(spec.kind, cutoff, rate, SECTION_Q[0]),
        Biquad::design(spec.kind, cutoff, rate, SECTION_Q[1]),
    ];

    for sample in samples.iter_mut() {
        let mut acc = *sample as f64;
        for section in sections.iter_mut() {
            acc = section.process(acc);
        }
        *sample = acc as f32;
    }

    debug!(kind = ?spec.kind, cutoff_hz = cutoff, "applied filter");
}

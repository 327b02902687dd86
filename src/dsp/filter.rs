//! Biquad filter: the per-voice tone shaper, WebAudio `BiquadFilterNode` style.
//!
//! Coefficients follow the Audio EQ Cookbook (Robert Bristow-Johnson); the
//! filter runs in transposed direct form II.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// WebAudio's default `Q` of 1 dB, expressed as a linear quality factor.
pub const DEFAULT_Q: f64 = 1.122_018_454_301_963_3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    Lowpass,
    Highpass,
    Bandpass,
    Notch,
}

/// Normalized coefficients (`a0` divided out).
#[derive(Debug, Clone, Copy)]
struct Coefficients {
    b: [f64; 3],
    a: [f64; 2],
}

impl Coefficients {
    fn design(filter_type: FilterType, frequency: f64, q: f64, sample_rate: f64) -> Self {
        // Cutoffs at or past Nyquist would fold the poles onto the unit circle.
        let w0 = 2.0 * PI * frequency.min(sample_rate * 0.49) / sample_rate;
        let (sin_w0, cos_w0) = w0.sin_cos();
        let alpha = sin_w0 / (2.0 * q);

        let b = match filter_type {
            FilterType::Lowpass => {
                let side = (1.0 - cos_w0) / 2.0;
                [side, 1.0 - cos_w0, side]
            }
            FilterType::Highpass => {
                let side = (1.0 + cos_w0) / 2.0;
                [side, -(1.0 + cos_w0), side]
            }
            FilterType::Bandpass => [alpha, 0.0, -alpha],
            FilterType::Notch => [1.0, -2.0 * cos_w0, 1.0],
        };

        // All four types share the same denominator.
        let a0 = 1.0 + alpha;
        Coefficients {
            b: b.map(|x| x / a0),
            a: [-2.0 * cos_w0 / a0, (1.0 - alpha) / a0],
        }
    }
}

#[derive(Debug, Clone)]
pub struct BiquadFilter {
    coefficients: Coefficients,
    z1: f64,
    z2: f64,
}

impl BiquadFilter {
    pub fn new(filter_type: FilterType, frequency: f64, q: f64, sample_rate: f64) -> Self {
        BiquadFilter {
            coefficients: Coefficients::design(filter_type, frequency, q, sample_rate),
            z1: 0.0,
            z2: 0.0,
        }
    }

    pub fn process(&mut self, input: f64) -> f64 {
        let Coefficients { b, a } = self.coefficients;
        let output = b[0] * input + self.z1;
        self.z1 = b[1] * input - a[0] * output + self.z2;
        self.z2 = b[2] * input - a[1] * output;
        output
    }
}

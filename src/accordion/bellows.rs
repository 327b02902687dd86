//! Lid angle → bellows expression.

use serde::{Deserialize, Serialize};

/// Maps a raw lid angle in degrees onto an expression level in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Bellows {
    /// Angle at which the bellows count as closed (silent).
    pub closed_angle: f64,
    /// Angle at which the bellows are fully open.
    pub open_angle: f64,
}

impl Default for Bellows {
    fn default() -> Self {
        Bellows {
            closed_angle: 0.0,
            open_angle: 120.0,
        }
    }
}

impl Bellows {
    pub fn normalize(&self, angle: f64) -> f64 {
        let span = self.open_angle - self.closed_angle;
        if span == 0.0 || !angle.is_finite() {
            return 0.0;
        }
        ((angle - self.closed_angle) / span).clamp(0.0, 1.0)
    }
}

/// Parse one sensor sample, either a raw line (`"97"`) or an SSE record
/// (`"data: 97\n\n"`).
pub fn parse_sample(sample: &str) -> Option<f64> {
    let sample = sample.trim();
    let payload = sample.strip_prefix("data:").unwrap_or(sample);
    payload.trim().parse().ok()
}

//! Automatable parameter with WebAudio `setTargetAtTime` semantics.

/// An exponential approach toward `target`, beginning at `start`.
#[derive(Debug, Clone, Copy)]
struct TargetCurve {
    start: f64,
    from: f64,
    target: f64,
    time_constant: f64,
}

impl TargetCurve {
    fn value_at(&self, time: f64) -> f64 {
        if time <= self.start {
            return self.from;
        }
        if self.time_constant <= 0.0 {
            return self.target;
        }
        let elapsed = time - self.start;
        self.target + (self.from - self.target) * (-elapsed / self.time_constant).exp()
    }
}

/// A parameter value that can jump or glide over time.
///
/// Only the most recent `set_target_at_time` curve is kept; scheduling a new
/// one picks up from wherever the previous curve was at the new start time,
/// so retargeting never produces a discontinuity.
#[derive(Debug, Clone)]
pub struct AudioParam {
    value: f64,
    curve: Option<TargetCurve>,
}

impl AudioParam {
    pub fn new(value: f64) -> Self {
        AudioParam { value, curve: None }
    }

    /// Jump to `value` immediately, dropping any scheduled curve.
    pub fn set_value(&mut self, value: f64) {
        self.value = value;
        self.curve = None;
    }

    /// Approach `target` exponentially from `start` with the given time
    /// constant (seconds to cover ~63% of the distance).
    pub fn set_target_at_time(&mut self, target: f64, start: f64, time_constant: f64) {
        let from = self.value_at(start);
        self.curve = Some(TargetCurve {
            start,
            from,
            target,
            time_constant,
        });
    }

    /// The value this parameter takes at `time`.
    pub fn value_at(&self, time: f64) -> f64 {
        match &self.curve {
            Some(curve) => curve.value_at(time),
            None => self.value,
        }
    }

    /// Where the parameter is heading (the last scheduled target).
    pub fn target(&self) -> f64 {
        match &self.curve {
            Some(curve) => curve.target,
            None => self.value,
        }
    }
}

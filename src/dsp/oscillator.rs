//! Anti-aliased oscillators using PolyBLEP, with one-shot start/stop.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// Supported waveform shapes (named as in WebAudio's `OscillatorType`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// A band-limited oscillator that only sounds between its scheduled
/// start and stop times.
///
/// Like a WebAudio `OscillatorNode`, it can be started once and stopped
/// once; anything else is a `GraphError`.
#[derive(Debug, Clone)]
pub struct OscillatorNode {
    pub waveform: Waveform,
    pub frequency: f64,
    phase: f64,
    sample_rate: f64,
    start_time: Option<f64>,
    stop_time: Option<f64>,
}

impl OscillatorNode {
    pub fn new(waveform: Waveform, frequency: f64, sample_rate: f64) -> Self {
        OscillatorNode {
            waveform,
            frequency,
            phase: 0.0,
            sample_rate,
            start_time: None,
            stop_time: None,
        }
    }

    pub fn start(&mut self, when: f64) -> Result<(), GraphError> {
        if self.start_time.is_some() {
            return Err(GraphError::AlreadyStarted);
        }
        self.start_time = Some(when);
        Ok(())
    }

    pub fn stop(&mut self, when: f64) -> Result<(), GraphError> {
        let Some(start) = self.start_time else {
            return Err(GraphError::NotStarted);
        };
        if self.stop_time.is_some() {
            return Err(GraphError::AlreadyStopped);
        }
        self.stop_time = Some(when.max(start));
        Ok(())
    }

    /// Is the oscillator producing output at `time`?
    pub fn is_playing(&self, time: f64) -> bool {
        match (self.start_time, self.stop_time) {
            (Some(start), Some(stop)) => time >= start && time < stop,
            (Some(start), None) => time >= start,
            _ => false,
        }
    }

    /// Has the scheduled stop time passed?
    pub fn is_halted(&self, time: f64) -> bool {
        self.stop_time.is_some_and(|stop| time >= stop)
    }

    /// Phase increment per sample.
    fn phase_inc(&self) -> f64 {
        self.frequency / self.sample_rate
    }

    /// Generate the sample for `time`. Silent (and phase-frozen) outside
    /// the start/stop window.
    pub fn next_sample(&mut self, time: f64) -> f64 {
        if !self.is_playing(time) {
            return 0.0;
        }

        let inc = self.phase_inc();
        let sample = match self.waveform {
            Waveform::Sine => self.sine(),
            Waveform::Sawtooth => self.sawtooth(inc),
            Waveform::Square => self.square(inc),
            Waveform::Triangle => self.triangle(),
        };

        self.phase += inc;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        sample
    }

    fn sine(&self) -> f64 {
        (2.0 * PI * self.phase).sin()
    }

    /// Naive sawtooth: rises from -1 to +1, then drops.
    /// PolyBLEP corrects the discontinuity at the wrap.
    fn sawtooth(&self, inc: f64) -> f64 {
        let naive = 2.0 * self.phase - 1.0;
        naive - poly_blep(self.phase, inc)
    }

    fn square(&self, inc: f64) -> f64 {
        let mut value = if self.phase < 0.5 { 1.0 } else { -1.0 };
        value += poly_blep(self.phase, inc);
        value -= poly_blep((self.phase + 0.5) % 1.0, inc);
        value
    }

    /// Piecewise linear: -1→+1 in [0, 0.5], +1→-1 in [0.5, 1].
    fn triangle(&self) -> f64 {
        if self.phase < 0.5 {
            4.0 * self.phase - 1.0
        } else {
            3.0 - 4.0 * self.phase
        }
    }
}

/// PolyBLEP (Polynomial Band-Limited Step) anti-aliasing correction.
///
/// `t` is the phase [0, 1), `dt` is the phase increment per sample.
fn poly_blep(t: f64, dt: f64) -> f64 {
    if t < dt {
        let t = t / dt;
        2.0 * t - t * t - 1.0
    } else if t > 1.0 - dt {
        let t = (t - 1.0) / dt;
        t * t + 2.0 * t + 1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(waveform: Waveform) -> OscillatorNode {
        let mut osc = OscillatorNode::new(waveform, 440.0, 44100.0);
        osc.start(0.0).unwrap();
        osc
    }

    fn run(osc: &mut OscillatorNode, samples: usize) -> Vec<f64> {
        (0..samples)
            .map(|i| osc.next_sample(i as f64 / 44100.0))
            .collect()
    }

    #[test]
    fn sine_zero_at_start() {
        let mut osc = started(Waveform::Sine);
        let sample = osc.next_sample(0.0);
        assert!(sample.abs() < 1e-10, "Sine should start near 0, got {sample}");
    }

    #[test]
    fn waveform_ranges() {
        for (waveform, limit) in [
            (Waveform::Sine, 1.0),
            (Waveform::Triangle, 1.0),
            (Waveform::Sawtooth, 1.5),
            (Waveform::Square, 1.5),
        ] {
            let mut osc = started(waveform);
            for s in run(&mut osc, 44100) {
                assert!(s.abs() <= limit, "{waveform:?} out of range: {s}");
            }
        }
    }

    #[test]
    fn silent_before_start() {
        let mut osc = OscillatorNode::new(Waveform::Square, 440.0, 44100.0);
        assert_eq!(osc.next_sample(0.0), 0.0);

        osc.start(1.0).unwrap();
        assert_eq!(osc.next_sample(0.5), 0.0);
        let loudest = (0..10)
            .map(|i| osc.next_sample(1.0 + i as f64 / 44100.0).abs())
            .fold(0.0, f64::max);
        assert!(loudest > 0.5, "Should sound once started, peak {loudest}");
    }

    #[test]
    fn silent_after_stop() {
        let mut osc = started(Waveform::Square);
        osc.stop(0.5).unwrap();
        assert!(osc.is_playing(0.25));
        assert!(!osc.is_halted(0.25));
        assert_eq!(osc.next_sample(0.5), 0.0);
        assert!(osc.is_halted(0.5));
    }

    #[test]
    fn start_and_stop_are_one_shot() {
        let mut osc = OscillatorNode::new(Waveform::Sawtooth, 440.0, 44100.0);
        assert_eq!(osc.stop(1.0), Err(GraphError::NotStarted));
        assert_eq!(osc.start(0.0), Ok(()));
        assert_eq!(osc.start(0.0), Err(GraphError::AlreadyStarted));
        assert_eq!(osc.stop(1.0), Ok(()));
        assert_eq!(osc.stop(2.0), Err(GraphError::AlreadyStopped));
    }

    #[test]
    fn sine_cycles_match_frequency() {
        let mut osc = OscillatorNode::new(Waveform::Sine, 10.0, 1000.0);
        osc.start(0.0).unwrap();
        let samples: Vec<f64> = (0..1000).map(|i| osc.next_sample(i as f64 / 1000.0)).collect();
        let rising = samples.windows(2).filter(|w| w[0] < 0.0 && w[1] >= 0.0).count();
        assert!(
            (9..=10).contains(&rising),
            "Expected ~10 rising zero crossings in one second, got {rising}"
        );
    }
}

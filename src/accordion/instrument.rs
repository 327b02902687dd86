//! Instrument: the host side of the synth: clock, voices and output bus.

use crate::config::SynthConfig;
use crate::dsp::context::{AudioContext, RENDER_QUANTUM};
use crate::dsp::mixer::Mixer;

use super::bellows::{Bellows, parse_sample};
use super::layout::KeyLayout;
use super::pool::{KeyDown, VoicePool};
use super::tones::ToneTable;

pub struct Instrument {
    context: AudioContext,
    pool: VoicePool,
    mixer: Mixer,
    bellows: Bellows,
}

impl Instrument {
    pub fn new(config: &SynthConfig) -> Self {
        let layout = KeyLayout::new(config.layout, config.home_octave);
        Instrument {
            context: AudioContext::new(config.sample_rate),
            pool: VoicePool::new(layout, ToneTable::standard(), config.preset.clone()),
            mixer: Mixer::new(config.master_gain),
            bellows: config.bellows,
        }
    }

    pub fn current_time(&self) -> f64 {
        self.context.current_time()
    }

    pub fn sample_rate(&self) -> f64 {
        self.context.sample_rate()
    }

    pub fn key_down(&mut self, key: &str) -> KeyDown {
        self.pool.on_key_down(&self.context, key)
    }

    pub fn key_up(&mut self, key: &str) -> bool {
        self.pool.on_key_up(&self.context, key)
    }

    /// Set the expression level (0..1) of every held note.
    pub fn set_expression(&mut self, level: f64) {
        self.pool.set_expression(&self.context, level);
    }

    /// Feed a raw lid angle through the bellows mapping.
    pub fn set_lid_angle(&mut self, angle: f64) {
        let level = self.bellows.normalize(angle);
        self.set_expression(level);
    }

    /// Apply one sensor sample (raw line or SSE record). Returns false if
    /// the sample carried no angle.
    pub fn apply_lid_sample(&mut self, sample: &str) -> bool {
        match parse_sample(sample) {
            Some(angle) => {
                self.set_lid_angle(angle);
                true
            }
            None => false,
        }
    }

    pub fn pool(&self) -> &VoicePool {
        &self.pool
    }

    /// Fill `out` with the next `out.len()` frames, advancing the clock.
    pub fn render(&mut self, out: &mut [f32]) {
        for block in out.chunks_mut(RENDER_QUANTUM) {
            let bus = self.mixer.begin_block(block.len());
            self.pool.render(&self.context, bus);
            self.mixer.write_output(block);
            self.context.advance(block.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_held_keys_and_advances_time() {
        let mut instrument = Instrument::new(&SynthConfig::default());
        assert!(matches!(instrument.key_down("a"), KeyDown::Started(_)));
        assert!(matches!(instrument.key_down("d"), KeyDown::Started(_)));

        let mut out = vec![0.0f32; 4410];
        instrument.render(&mut out);
        assert!((instrument.current_time() - 0.1).abs() < 1e-9);
        assert!(out.iter().any(|s| s.abs() > 0.05), "Chord should be audible");
        assert!(out.iter().all(|s| s.abs() <= 1.0));
    }

    #[test]
    fn silence_without_keys() {
        let mut instrument = Instrument::new(&SynthConfig::default());
        let mut out = vec![1.0f32; 256];
        instrument.render(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn lid_samples_drive_expression() {
        let mut instrument = Instrument::new(&SynthConfig::default());
        instrument.key_down("a");
        assert!(instrument.apply_lid_sample("data: 60\n\n"));
        assert!(!instrument.apply_lid_sample("garbage"));

        let mut out = vec![0.0f32; 44100];
        instrument.render(&mut out);

        let tail = &out[out.len() - 4410..];
        let loud = tail.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));

        let mut reference = Instrument::new(&SynthConfig::default());
        reference.key_down("a");
        let mut full = vec![0.0f32; 44100];
        reference.render(&mut full);
        let full_peak = full[full.len() - 4410..]
            .iter()
            .fold(0.0f32, |acc, s| acc.max(s.abs()));

        assert!(
            loud < full_peak * 0.75,
            "Half-open bellows should be quieter: {loud} vs {full_peak}"
        );
    }
}

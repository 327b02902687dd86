//! Accordion voice: one sounding note and the audio graph it owns.
//!
//! ```text
//!   source osc ─► source gain ─┐
//!   source osc ─► source gain ─┼─► filter ─► envelope ─► destination
//!   source osc ─► source gain ─┘
//! ```
//!
//! The graph is private to the voice; callers only get `set_gain` and
//! `stop`. Oscillators start when the voice is built and are halted once,
//! `release_duration` seconds after `stop`.

use tracing::{debug, trace};

use crate::dsp::context::AudioContext;
use crate::dsp::filter::BiquadFilter;
use crate::dsp::oscillator::OscillatorNode;
use crate::dsp::param::AudioParam;
use crate::error::GraphError;

use super::preset::VoicePreset;

/// Attack counts as finished after this many attack time constants (~99%).
const ATTACK_SETTLE_CONSTANTS: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Starting,
    Sustaining,
    Releasing,
    Stopped,
}

/// An oscillator and its fixed mix level.
#[derive(Debug, Clone)]
struct Source {
    oscillator: OscillatorNode,
    level: f64,
}

#[derive(Debug, Clone)]
pub struct AccordionVoice {
    frequency: f64,
    sources: Vec<Source>,
    filter: BiquadFilter,
    envelope: AudioParam,
    started_at: f64,
    attack_time_constant: f64,
    gain_time_constant: f64,
    release_time_constant: f64,
    release_duration: f64,
    released_at: Option<f64>,
}

impl AccordionVoice {
    /// Build the graph for `frequency`, start every oscillator now and begin
    /// the attack glide from silence to full level.
    pub fn new(
        ctx: &AudioContext,
        frequency: f64,
        preset: &VoicePreset,
    ) -> Result<Self, GraphError> {
        let now = ctx.current_time();
        let sample_rate = ctx.sample_rate();

        let mut sources = Vec::with_capacity(preset.sources.len());
        for config in &preset.sources {
            let source_frequency = config.frequency_for(frequency);
            if !(source_frequency.is_finite() && source_frequency > 0.0) {
                return Err(GraphError::InvalidFrequency);
            }
            let mut oscillator = OscillatorNode::new(config.waveform, source_frequency, sample_rate);
            oscillator.start(now)?;
            sources.push(Source {
                oscillator,
                level: config.level,
            });
        }

        let filter = BiquadFilter::new(
            preset.filter.filter_type,
            preset.filter.frequency,
            preset.filter.q,
            sample_rate,
        );

        let mut envelope = AudioParam::new(0.0);
        envelope.set_target_at_time(1.0, now, preset.attack_time_constant);

        debug!(frequency, at = now, "voice started");

        Ok(AccordionVoice {
            frequency,
            sources,
            filter,
            envelope,
            started_at: now,
            attack_time_constant: preset.attack_time_constant,
            gain_time_constant: preset.gain_time_constant,
            release_time_constant: preset.release_time_constant,
            release_duration: preset.release_duration,
            released_at: None,
        })
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Glide the envelope toward `level`, clamped to [0, 1]. Ignored once
    /// the voice is releasing, and for non-numeric levels.
    pub fn set_gain(&mut self, ctx: &AudioContext, level: f64) {
        if self.released_at.is_some() {
            trace!(frequency = self.frequency, "gain change ignored after stop");
            return;
        }
        if level.is_nan() {
            return;
        }
        let level = level.clamp(0.0, 1.0);
        self.envelope
            .set_target_at_time(level, ctx.current_time(), self.gain_time_constant);
    }

    /// Begin the release glide and schedule every oscillator to halt once
    /// it has completed. Later calls do nothing.
    pub fn stop(&mut self, ctx: &AudioContext) -> Result<(), GraphError> {
        if self.released_at.is_some() {
            return Ok(());
        }
        let now = ctx.current_time();
        self.released_at = Some(now);
        self.envelope
            .set_target_at_time(0.0, now, self.release_time_constant);

        let halt_at = now + self.release_duration;
        for source in &mut self.sources {
            source.oscillator.stop(halt_at)?;
        }
        debug!(frequency = self.frequency, at = now, halt_at, "voice released");
        Ok(())
    }

    pub fn state(&self, ctx: &AudioContext) -> VoiceState {
        let now = ctx.current_time();
        match self.released_at {
            Some(_) if self.is_finished(ctx) => VoiceState::Stopped,
            Some(_) => VoiceState::Releasing,
            None if now < self.started_at + ATTACK_SETTLE_CONSTANTS * self.attack_time_constant => {
                VoiceState::Starting
            }
            None => VoiceState::Sustaining,
        }
    }

    /// True once every oscillator has been halted.
    pub fn is_finished(&self, ctx: &AudioContext) -> bool {
        self.is_halted_at(ctx.current_time())
    }

    /// Will every oscillator have been halted by `time`?
    pub fn is_halted_at(&self, time: f64) -> bool {
        self.sources.iter().all(|s| s.oscillator.is_halted(time))
    }

    /// Envelope level at the start of the next block.
    pub fn envelope_level(&self, ctx: &AudioContext) -> f64 {
        self.envelope.value_at(ctx.current_time())
    }

    /// Where the envelope is heading.
    pub fn gain_target(&self) -> f64 {
        self.envelope.target()
    }

    /// Add one block of this voice into `out`, starting at the context's
    /// current time.
    pub fn render(&mut self, ctx: &AudioContext, out: &mut [f64]) {
        for (i, sample) in out.iter_mut().enumerate() {
            let t = ctx.time_at(i);
            let mut mixed = 0.0;
            for source in &mut self.sources {
                mixed += source.oscillator.next_sample(t) * source.level;
            }
            let filtered = self.filter.process(mixed);
            *sample += filtered * self.envelope.value_at(t);
        }
    }
}

//! Voice pool: which keys are held and which voices are still sounding.
//!
//! The held-key registry is the single source of truth for "is this key
//! down". Releasing a key removes it from the registry at once; its voice
//! moves to the release tail and keeps rendering until its oscillators halt,
//! at which point it is dropped along with its graph.

use std::collections::HashMap;

use tracing::{trace, warn};

use crate::dsp::context::AudioContext;

use super::layout::KeyLayout;
use super::preset::VoicePreset;
use super::tones::ToneTable;
use super::voice::AccordionVoice;

/// What a key-down did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyDown {
    /// A new voice is sounding at this frequency.
    Started(f64),
    /// The key already has a voice (key repeat).
    Repeat,
    /// The key is not on the layout or its note is outside the tone table.
    Unmapped,
    /// The key is mapped but the preset cannot build a voice for its note.
    Failed,
}

pub struct VoicePool {
    layout: KeyLayout,
    tones: ToneTable,
    preset: VoicePreset,
    held: HashMap<String, AccordionVoice>,
    releasing: Vec<AccordionVoice>,
}

impl VoicePool {
    pub fn new(layout: KeyLayout, tones: ToneTable, preset: VoicePreset) -> Self {
        VoicePool {
            layout,
            tones,
            preset,
            held: HashMap::new(),
            releasing: Vec::new(),
        }
    }

    /// Frequency a key would play, without touching any state.
    pub fn resolve_frequency(&self, key: &str) -> Option<f64> {
        self.layout.frequency(key, &self.tones)
    }

    pub fn on_key_down(&mut self, ctx: &AudioContext, key: &str) -> KeyDown {
        self.free_halted(ctx.current_time());
        if self.held.contains_key(key) {
            trace!(key, "key repeat ignored");
            return KeyDown::Repeat;
        }
        let Some(frequency) = self.resolve_frequency(key) else {
            trace!(key, "unmapped key ignored");
            return KeyDown::Unmapped;
        };

        match AccordionVoice::new(ctx, frequency, &self.preset) {
            Ok(voice) => {
                self.held.insert(key.to_owned(), voice);
                KeyDown::Started(frequency)
            }
            Err(e) => {
                warn!(key, frequency, error = %e, "could not start voice");
                KeyDown::Failed
            }
        }
    }

    /// Release the key's voice. Returns false if the key was not held.
    pub fn on_key_up(&mut self, ctx: &AudioContext, key: &str) -> bool {
        self.free_halted(ctx.current_time());
        let Some(mut voice) = self.held.remove(key) else {
            trace!(key, "release of key that is not held");
            return false;
        };
        if let Err(e) = voice.stop(ctx) {
            warn!(key, error = %e, "voice did not stop cleanly");
        }
        self.releasing.push(voice);
        true
    }

    /// Apply an expression level to every held voice.
    pub fn set_expression(&mut self, ctx: &AudioContext, level: f64) {
        for voice in self.held.values_mut() {
            voice.set_gain(ctx, level);
        }
    }

    pub fn is_held(&self, key: &str) -> bool {
        self.held.contains_key(key)
    }

    pub fn held_count(&self) -> usize {
        self.held.len()
    }

    /// Held voices plus voices still in their release tail.
    pub fn sounding_count(&self) -> usize {
        self.held.len() + self.releasing.len()
    }

    /// Add one block of every voice into `out`, then drop tails whose
    /// oscillators have halted by the end of the block.
    pub fn render(&mut self, ctx: &AudioContext, out: &mut [f64]) {
        for voice in self.held.values_mut() {
            voice.render(ctx, out);
        }
        for voice in &mut self.releasing {
            voice.render(ctx, out);
        }

        self.free_halted(ctx.time_at(out.len()));
    }

    /// Drop release tails whose oscillators have halted by `time`.
    fn free_halted(&mut self, time: f64) {
        self.releasing.retain(|voice| {
            let finished = voice.is_halted_at(time);
            if finished {
                trace!(frequency = voice.frequency(), "voice freed");
            }
            !finished
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accordion::layout::LayoutKind;

    fn pool() -> VoicePool {
        VoicePool::new(
            KeyLayout::new(LayoutKind::Base, 4),
            ToneTable::standard(),
            VoicePreset::accordion(),
        )
    }

    fn render(pool: &mut VoicePool, ctx: &mut AudioContext, frames: usize) {
        let mut out = vec![0.0; frames];
        for block in out.chunks_mut(128) {
            pool.render(ctx, block);
            ctx.advance(block.len());
        }
    }

    #[test]
    fn repeated_key_down_keeps_one_voice() {
        let ctx = AudioContext::new(44100.0);
        let mut pool = pool();
        assert_eq!(pool.on_key_down(&ctx, "a"), KeyDown::Started(261.63));
        assert_eq!(pool.on_key_down(&ctx, "a"), KeyDown::Repeat);
        assert_eq!(pool.held_count(), 1);
        assert_eq!(pool.sounding_count(), 1);
    }

    #[test]
    fn key_up_unregisters_immediately() {
        let mut ctx = AudioContext::new(44100.0);
        let mut pool = pool();
        pool.on_key_down(&ctx, "s");
        render(&mut pool, &mut ctx, 1024);

        assert!(pool.on_key_up(&ctx, "s"));
        assert!(!pool.is_held("s"));
        assert_eq!(pool.sounding_count(), 1, "Release tail should still sound");

        // Pressing again while the old voice decays starts a fresh voice.
        assert!(matches!(pool.on_key_down(&ctx, "s"), KeyDown::Started(_)));
        assert_eq!(pool.held_count(), 1);
        assert_eq!(pool.sounding_count(), 2);
    }

    #[test]
    fn tails_are_freed_after_release() {
        let mut ctx = AudioContext::new(44100.0);
        let mut pool = pool();
        pool.on_key_down(&ctx, "d");
        render(&mut pool, &mut ctx, 4410);
        pool.on_key_up(&ctx, "d");

        render(&mut pool, &mut ctx, 22050 - 256);
        assert_eq!(pool.sounding_count(), 1);

        render(&mut pool, &mut ctx, 512);
        assert_eq!(pool.sounding_count(), 0);
    }

    #[test]
    fn tails_are_freed_without_rendering() {
        let mut ctx = AudioContext::new(44100.0);
        let mut pool = pool();
        for key in ["a", "s", "d"] {
            pool.on_key_down(&ctx, key);
            pool.on_key_up(&ctx, key);
        }
        assert_eq!(pool.sounding_count(), 3);

        ctx.advance(22050);
        pool.on_key_down(&ctx, "f");
        assert_eq!(pool.sounding_count(), 1, "Halted tails should be gone");

        ctx.advance(22050);
        pool.on_key_up(&ctx, "f");
        assert_eq!(pool.sounding_count(), 1);
        ctx.advance(22050);
        pool.on_key_up(&ctx, "f");
        assert_eq!(pool.sounding_count(), 0);
    }

    #[test]
    fn unbuildable_voice_is_reported_as_failed() {
        let ctx = AudioContext::new(44100.0);
        let mut preset = VoicePreset::accordion();
        preset.sources[0].offset_hz = -300.0;
        let mut pool = VoicePool::new(KeyLayout::new(LayoutKind::Base, 4), ToneTable::standard(), preset);

        assert_eq!(pool.on_key_down(&ctx, "a"), KeyDown::Failed);
        assert!(!pool.is_held("a"));
        assert_eq!(pool.sounding_count(), 0);
        assert_eq!(pool.on_key_down(&ctx, "q"), KeyDown::Unmapped);
    }

    #[test]
    fn redundant_and_unmapped_events_are_ignored() {
        let ctx = AudioContext::new(44100.0);
        let mut pool = pool();
        assert_eq!(pool.on_key_down(&ctx, "q"), KeyDown::Unmapped);
        assert_eq!(pool.on_key_down(&ctx, "3"), KeyDown::Unmapped);
        assert!(!pool.on_key_up(&ctx, "f"));

        pool.on_key_down(&ctx, "f");
        assert!(pool.on_key_up(&ctx, "f"));
        assert!(!pool.on_key_up(&ctx, "f"));
        assert_eq!(pool.sounding_count(), 1);
    }

    #[test]
    fn expression_reaches_held_voices_only() {
        let ctx = AudioContext::new(44100.0);
        let mut pool = pool();
        pool.on_key_down(&ctx, "g");
        pool.on_key_down(&ctx, "h");
        pool.on_key_up(&ctx, "h");

        pool.set_expression(&ctx, 1.7);
        assert_eq!(pool.held["g"].gain_target(), 1.0);
        assert_eq!(pool.releasing[0].gain_target(), 0.0);

        pool.set_expression(&ctx, 0.25);
        assert_eq!(pool.held["g"].gain_target(), 0.25);
    }

    #[test]
    fn lookup_has_no_side_effects() {
        let pool = pool();
        assert_eq!(pool.resolve_frequency("a"), pool.resolve_frequency("a"));
        assert_eq!(pool.held_count(), 0);
    }
}

pub mod accordion;
pub mod config;
pub mod dsp;
pub mod error;
#[cfg(feature = "server")]
pub mod relay;

use crate::accordion::instrument::Instrument;
use crate::accordion::layout::LayoutKind;
use crate::accordion::pool::KeyDown;
use crate::accordion::preset::VoicePreset;
use crate::config::SynthConfig;
use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the lidcordion version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// WASM-exposed accordion. The page forwards keyboard events and lid
/// samples, and pulls audio from an AudioWorklet.
#[wasm_bindgen]
pub struct Accordion {
    instrument: Instrument,
}

#[wasm_bindgen]
impl Accordion {
    #[wasm_bindgen(constructor)]
    pub fn new(sample_rate: f64, chromatic: bool) -> Accordion {
        Accordion::from_config(&synth_config(sample_rate, chromatic, VoicePreset::accordion()))
    }

    /// Build with a custom voice preset (a `VoicePreset` as a JS object).
    #[wasm_bindgen(js_name = withPreset)]
    pub fn with_preset(
        sample_rate: f64,
        chromatic: bool,
        preset: JsValue,
    ) -> Result<Accordion, JsValue> {
        let preset: VoicePreset = serde_wasm_bindgen::from_value(preset)
            .map_err(|e| JsValue::from_str(&format!("{e}")))?;
        Ok(Accordion::from_config(&synth_config(sample_rate, chromatic, preset)))
    }

    /// Returns true if the key started a new voice.
    #[wasm_bindgen(js_name = keyDown)]
    pub fn key_down(&mut self, key: &str) -> bool {
        matches!(self.instrument.key_down(key), KeyDown::Started(_))
    }

    #[wasm_bindgen(js_name = keyUp)]
    pub fn key_up(&mut self, key: &str) -> bool {
        self.instrument.key_up(key)
    }

    #[wasm_bindgen(js_name = setExpression)]
    pub fn set_expression(&mut self, level: f64) {
        self.instrument.set_expression(level);
    }

    /// Apply one line or SSE record from the lid-angle endpoint.
    #[wasm_bindgen(js_name = applyLidSample)]
    pub fn apply_lid_sample(&mut self, sample: &str) -> bool {
        self.instrument.apply_lid_sample(sample)
    }

    pub fn render(&mut self, frames: usize) -> Vec<f32> {
        let mut out = vec![0.0; frames];
        self.instrument.render(&mut out);
        out
    }

    #[wasm_bindgen(js_name = heldKeys)]
    pub fn held_keys(&self) -> usize {
        self.instrument.pool().held_count()
    }
}

impl Accordion {
    pub fn from_config(config: &SynthConfig) -> Accordion {
        Accordion {
            instrument: Instrument::new(config),
        }
    }
}

fn synth_config(sample_rate: f64, chromatic: bool, preset: VoicePreset) -> SynthConfig {
    SynthConfig {
        sample_rate,
        layout: if chromatic {
            LayoutKind::Chromatic
        } else {
            LayoutKind::Base
        },
        preset,
        ..SynthConfig::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chromatic_row_only_on_chromatic_layout() {
        let mut base = Accordion::new(44100.0, false);
        let mut chromatic = Accordion::new(44100.0, true);
        assert!(!base.key_down("3"));
        assert!(chromatic.key_down("3"));
        assert!(!chromatic.key_down("3"));
        assert_eq!(chromatic.held_keys(), 1);
    }

    #[test]
    fn renders_requested_frames() {
        let mut accordion = Accordion::new(48000.0, false);
        accordion.key_down("a");
        let out = accordion.render(300);
        assert_eq!(out.len(), 300);
        assert!(accordion.key_up("a"));
        assert_eq!(accordion.held_keys(), 0);
    }
}

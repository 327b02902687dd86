//! Voice recipe as a serializable preset table.
//!
//! The default preset is the accordion reed sound: a square at pitch, a
//! slightly sharp sawtooth for chorus-like fuzz and a slightly flat square an
//! octave up, all through one lowpass.

use serde::{Deserialize, Serialize};

use crate::dsp::filter::{DEFAULT_Q, FilterType};
use crate::dsp::oscillator::Waveform;

/// One oscillator feeding the voice's filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceConfig {
    pub waveform: Waveform,
    /// Multiple of the note frequency.
    #[serde(default = "default_ratio")]
    pub ratio: f64,
    /// Absolute detune in Hz, added after `ratio`.
    #[serde(default)]
    pub offset_hz: f64,
    /// Mix level into the filter.
    pub level: f64,
}

impl SourceConfig {
    pub fn frequency_for(&self, note_frequency: f64) -> f64 {
        note_frequency * self.ratio + self.offset_hz
    }
}

fn default_ratio() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(rename = "type")]
    pub filter_type: FilterType,
    pub frequency: f64,
    #[serde(default = "default_q")]
    pub q: f64,
}

fn default_q() -> f64 {
    DEFAULT_Q
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VoicePreset {
    pub sources: Vec<SourceConfig>,
    pub filter: FilterConfig,
    /// Time constant (s) of the initial 0 → 1 envelope glide.
    pub attack_time_constant: f64,
    /// Time constant (s) used when the expression level changes.
    pub gain_time_constant: f64,
    /// Time constant (s) of the release glide to silence.
    pub release_time_constant: f64,
    /// Seconds after release at which the oscillators are halted.
    pub release_duration: f64,
}

impl VoicePreset {
    pub fn accordion() -> Self {
        VoicePreset {
            sources: vec![
                SourceConfig {
                    waveform: Waveform::Square,
                    ratio: 1.0,
                    offset_hz: 0.0,
                    level: 0.8,
                },
                SourceConfig {
                    waveform: Waveform::Sawtooth,
                    ratio: 1.0,
                    offset_hz: 0.7,
                    level: 0.5,
                },
                SourceConfig {
                    waveform: Waveform::Square,
                    ratio: 2.0,
                    offset_hz: -1.3,
                    level: 0.3,
                },
            ],
            filter: FilterConfig {
                filter_type: FilterType::Lowpass,
                frequency: 4000.0,
                q: DEFAULT_Q,
            },
            attack_time_constant: 0.05,
            gain_time_constant: 0.05,
            release_time_constant: 0.2,
            release_duration: 0.5,
        }
    }
}

impl Default for VoicePreset {
    fn default() -> Self {
        VoicePreset::accordion()
    }
}

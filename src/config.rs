//! JSON configuration for the instrument, the sensor process and the server.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::accordion::bellows::Bellows;
use crate::accordion::layout::LayoutKind;
use crate::accordion::preset::VoicePreset;
use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub sensor: SensorConfig,
    pub synth: SynthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    pub bind: String,
    pub route: String,
    /// Lines buffered per consumer before a slow consumer starts losing
    /// the oldest ones.
    pub channel_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: "127.0.0.1:3000".to_string(),
            route: "/api/lidangle".to_string(),
            channel_capacity: 64,
        }
    }
}

/// The external lid-angle reader. It writes one sample per line to stdout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub command: PathBuf,
    pub args: Vec<String>,
}

impl Default for SensorConfig {
    fn default() -> Self {
        SensorConfig {
            command: PathBuf::from("bin/lidcordion"),
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SynthConfig {
    pub sample_rate: f64,
    pub layout: LayoutKind,
    /// Octave of the C on row 2, column 1.
    pub home_octave: i32,
    pub master_gain: f64,
    pub preset: VoicePreset,
    pub bellows: Bellows,
}

impl Default for SynthConfig {
    fn default() -> Self {
        SynthConfig {
            sample_rate: 44100.0,
            layout: LayoutKind::Base,
            home_octave: 4,
            master_gain: 0.8,
            preset: VoicePreset::accordion(),
            bellows: Bellows::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Config::from_json(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate().map_err(|reason| ConfigError::Invalid {
            path: path.to_path_buf(),
            reason,
        })?;
        Ok(config)
    }

    /// Reject values that would only fail later, at server startup.
    pub fn validate(&self) -> Result<(), String> {
        if !self.server.route.starts_with('/') {
            return Err(format!(
                "server.route must start with '/', got {:?}",
                self.server.route
            ));
        }
        if !(self.synth.sample_rate.is_finite() && self.synth.sample_rate > 0.0) {
            return Err(format!(
                "synth.sampleRate must be positive, got {}",
                self.synth.sample_rate
            ));
        }
        Ok(())
    }

    pub fn from_json(text: &str) -> Result<Config, serde_json::Error> {
        serde_json::from_str(text)
    }
}

//! Offline renderer: plays a scripted performance into samples or a WAV file.

use serde::{Deserialize, Serialize};

use crate::accordion::instrument::Instrument;
use crate::config::SynthConfig;
use crate::error::RenderError;

/// Longest performance that will be rendered, in seconds.
pub const MAX_DURATION: f64 = 3600.0;

/// A timed list of keyboard and bellows events.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Performance {
    pub events: Vec<PerformanceEvent>,
    /// Seconds rendered after the last event, so releases can ring out.
    #[serde(default = "default_tail")]
    pub tail: f64,
}

fn default_tail() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceEvent {
    /// Seconds from the start of the performance.
    pub time: f64,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Action {
    KeyDown { key: String },
    KeyUp { key: String },
    Expression { level: f64 },
    LidAngle { angle: f64 },
}

impl Performance {
    /// Length of the rendered audio in seconds.
    pub fn duration(&self) -> f64 {
        let last = self
            .events
            .iter()
            .map(|e| e.time)
            .fold(0.0, f64::max);
        last + self.tail.max(0.0)
    }
}

fn apply(instrument: &mut Instrument, action: &Action) {
    match action {
        Action::KeyDown { key } => {
            instrument.key_down(key);
        }
        Action::KeyUp { key } => {
            instrument.key_up(key);
        }
        Action::Expression { level } => instrument.set_expression(*level),
        Action::LidAngle { angle } => instrument.set_lid_angle(*angle),
    }
}

/// Render a performance to mono f32 samples at the configured sample rate.
pub fn render_performance(
    performance: &Performance,
    config: &SynthConfig,
) -> Result<Vec<f32>, RenderError> {
    let seconds = performance.duration();
    if !(seconds.is_finite() && seconds <= MAX_DURATION) {
        return Err(RenderError::TooLong {
            seconds,
            limit: MAX_DURATION,
        });
    }

    let mut instrument = Instrument::new(config);
    let sample_rate = instrument.sample_rate();
    let total = (seconds * sample_rate).round() as usize;
    let mut out = vec![0.0f32; total];

    let mut events: Vec<&PerformanceEvent> = performance.events.iter().collect();
    events.sort_by(|a, b| a.time.total_cmp(&b.time));

    let mut cursor = 0usize;
    for event in events {
        let frame = ((event.time.max(0.0) * sample_rate).round() as usize).min(total);
        if frame > cursor {
            instrument.render(&mut out[cursor..frame]);
            cursor = frame;
        }
        apply(&mut instrument, &event.action);
    }
    instrument.render(&mut out[cursor..]);

    Ok(out)
}

/// Render a performance to a WAV file as bytes (16-bit mono PCM).
pub fn render_wav(performance: &Performance, config: &SynthConfig) -> Result<Vec<u8>, RenderError> {
    let samples = render_performance(performance, config)?;
    let pcm: Vec<i16> = samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
        .collect();

    Ok(encode_wav(&pcm, config.sample_rate.round() as u32, 1))
}

/// Encode interleaved i16 PCM samples to a WAV byte buffer.
fn encode_wav(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
    let bits_per_sample: u16 = 16;
    let byte_rate = sample_rate * channels as u32 * (bits_per_sample as u32 / 8);
    let block_align = channels * (bits_per_sample / 8);
    let data_size = (samples.len() * 2) as u32;
    let file_size = 36 + data_size;

    let mut buf = Vec::with_capacity(44 + data_size as usize);

    // RIFF header
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&file_size.to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    // fmt chunk
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM format
    buf.extend_from_slice(&channels.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&bits_per_sample.to_le_bytes());

    // data chunk
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for &sample in samples {
        buf.extend_from_slice(&sample.to_le_bytes());
    }

    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SynthConfig {
        SynthConfig {
            sample_rate: 22050.0,
            ..SynthConfig::default()
        }
    }

    fn scale() -> Performance {
        serde_json::from_str(
            r#"{
                "events": [
                    { "time": 0.0, "type": "keyDown", "key": "a" },
                    { "time": 0.25, "type": "keyUp", "key": "a" },
                    { "time": 0.25, "type": "keyDown", "key": "d" },
                    { "time": 0.3, "type": "lidAngle", "angle": 90 },
                    { "time": 0.5, "type": "keyUp", "key": "d" }
                ],
                "tail": 1.0
            }"#,
        )
        .expect("parse failed")
    }

    #[test]
    fn wav_header_valid() {
        let wav = render_wav(&scale(), &config()).unwrap();

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(&wav[36..40], b"data");

        let sr = u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]);
        assert_eq!(sr, 22050);

        let ch = u16::from_le_bytes([wav[22], wav[23]]);
        assert_eq!(ch, 1);
    }

    #[test]
    fn wav_size_matches_duration() {
        let wav = render_wav(&scale(), &config()).unwrap();

        // 0.5s of events + 1s tail = 33075 frames * 2 bytes
        let data_size = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]);
        assert_eq!(data_size, 66150);
        assert_eq!(wav.len(), 44 + 66150);
    }

    #[test]
    fn performance_is_audible_then_rings_out() {
        let samples = render_performance(&scale(), &config()).unwrap();
        let peak = |s: &[f32]| s.iter().fold(0.0f32, |acc, x| acc.max(x.abs()));

        assert!(peak(&samples[..5512]) > 0.05, "First note should sound");
        assert!(peak(&samples[11025..11500]) > 0.0, "Release should ring past key-up");
        assert!(peak(&samples[samples.len() - 1000..]) < 1e-3, "Tail should end in silence");
    }

    #[test]
    fn unsorted_events_are_ordered() {
        let mut performance = scale();
        performance.events.reverse();
        let reversed = render_performance(&performance, &config()).unwrap();
        let sorted = render_performance(&scale(), &config()).unwrap();
        assert_eq!(reversed.len(), sorted.len());
        assert!(reversed.iter().zip(&sorted).all(|(a, b)| (a - b).abs() < 1e-6));
    }

    #[test]
    fn demo_script_parses() {
        let performance: Performance =
            serde_json::from_str(include_str!("../../demos/scale.json")).unwrap();
        assert_eq!(performance.events.len(), 13);
        assert!((performance.duration() - 3.2).abs() < 1e-9);
        assert!(matches!(
            performance.events[10].action,
            Action::Expression { level } if level == 1.0
        ));
    }

    #[test]
    fn overlong_performance_is_refused() {
        let mut performance = scale();
        performance.tail = 1e12;
        assert!(matches!(
            render_performance(&performance, &config()),
            Err(RenderError::TooLong { .. })
        ));

        performance.tail = 1.0;
        performance.events[0].time = f64::INFINITY;
        assert!(render_wav(&performance, &config()).is_err());
    }

    #[test]
    fn empty_performance_is_silent() {
        let samples = render_performance(&Performance::default(), &config()).unwrap();
        assert!(samples.is_empty());
    }
}

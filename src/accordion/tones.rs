//! Pitch classes and the octave frequency table.

use serde::{Deserialize, Serialize};

/// A note name independent of octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PitchClass {
    C,
    Db,
    D,
    Eb,
    E,
    F,
    Gb,
    G,
    Ab,
    A,
    Bb,
    B,
}

impl PitchClass {
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::Db,
        PitchClass::D,
        PitchClass::Eb,
        PitchClass::E,
        PitchClass::F,
        PitchClass::Gb,
        PitchClass::G,
        PitchClass::Ab,
        PitchClass::A,
        PitchClass::Bb,
        PitchClass::B,
    ];

    /// Semitones above C.
    pub fn semitone(self) -> usize {
        self as usize
    }

    /// Pitch class `semitones` above C, wrapping at the octave.
    pub fn from_semitone(semitones: i32) -> PitchClass {
        PitchClass::ALL[semitones.rem_euclid(12) as usize]
    }

    pub fn name(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::Db => "Db",
            PitchClass::D => "D",
            PitchClass::Eb => "Eb",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::Gb => "Gb",
            PitchClass::G => "G",
            PitchClass::Ab => "Ab",
            PitchClass::A => "A",
            PitchClass::Bb => "Bb",
            PitchClass::B => "B",
        }
    }
}

// Octave 0 first. The upper pitch classes stop one octave earlier.
const C: &[f64] = &[16.35, 32.7, 65.41, 130.81, 261.63, 523.25, 1046.5, 2093.0, 4186.01];
const DB: &[f64] = &[17.32, 34.65, 69.3, 138.59, 277.18, 554.37, 1108.73, 2217.46, 4434.92];
const D: &[f64] = &[18.35, 36.71, 73.42, 146.83, 293.66, 587.33, 1174.66, 2349.32, 4698.64];
const EB: &[f64] = &[19.45, 38.89, 77.78, 155.56, 311.13, 622.25, 1244.51, 2489.02, 4978.03];
const E: &[f64] = &[20.6, 41.2, 82.41, 164.81, 329.63, 659.26, 1318.51, 2637.02];
const F: &[f64] = &[21.83, 43.65, 87.31, 174.61, 349.23, 698.46, 1396.91, 2793.83];
const GB: &[f64] = &[23.12, 46.25, 92.5, 185.0, 369.99, 739.99, 1479.98, 2959.96];
const G: &[f64] = &[24.5, 49.0, 98.0, 196.0, 392.0, 783.99, 1567.98, 3135.96];
const AB: &[f64] = &[25.96, 51.91, 103.83, 207.65, 415.3, 830.61, 1661.22, 3322.44];
const A: &[f64] = &[27.5, 55.0, 110.0, 220.0, 440.0, 880.0, 1760.0, 3520.0];
const BB: &[f64] = &[29.14, 58.27, 116.54, 233.08, 466.16, 932.33, 1864.66, 3729.31];
const B: &[f64] = &[30.87, 61.74, 123.47, 246.94, 493.88, 987.77, 1975.53, 3951.07];

/// Immutable pitch class → per-octave frequency table (Hz).
#[derive(Debug, Clone, Copy)]
pub struct ToneTable {
    octaves: [&'static [f64]; 12],
}

impl ToneTable {
    pub fn standard() -> Self {
        ToneTable {
            octaves: [C, DB, D, EB, E, F, GB, G, AB, A, BB, B],
        }
    }

    /// All octaves available for `pitch`, lowest first.
    pub fn octaves(&self, pitch: PitchClass) -> &'static [f64] {
        self.octaves[pitch.semitone()]
    }

    /// Frequency of `pitch` in `octave`, or `None` past the table's range.
    pub fn frequency(&self, pitch: PitchClass, octave: i32) -> Option<f64> {
        let index = usize::try_from(octave).ok()?;
        self.octaves(pitch).get(index).copied()
    }
}

impl Default for ToneTable {
    fn default() -> Self {
        ToneTable::standard()
    }
}

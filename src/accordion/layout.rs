//! Computer keyboard → accordion button layouts.
//!
//! Buttons follow a C-system chromatic accordion: along a row each button is
//! a minor third above the previous one, and each row sits a semitone above
//! the row below it. Row 2, column 1 (the `a` key) is C of the home octave.

use serde::{Deserialize, Serialize};

use super::tones::{PitchClass, ToneTable};

/// A button on the virtual grid. Rows and columns are 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ButtonPosition {
    pub row: u8,
    pub column: u8,
}

/// A pitch class in a specific octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Note {
    pub pitch: PitchClass,
    pub octave: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    /// Three rows on the letter keys.
    #[default]
    Base,
    /// The base rows plus a fourth row on the number keys.
    Chromatic,
}

const fn pos(row: u8, column: u8) -> ButtonPosition {
    ButtonPosition { row, column }
}

const BASE_KEYS: &[(&str, ButtonPosition)] = &[
    ("z", pos(1, 1)),
    ("x", pos(1, 2)),
    ("c", pos(1, 3)),
    ("v", pos(1, 4)),
    ("b", pos(1, 5)),
    ("n", pos(1, 6)),
    ("m", pos(1, 7)),
    (",", pos(1, 8)),
    (".", pos(1, 9)),
    ("/", pos(1, 10)),
    ("a", pos(2, 1)),
    ("s", pos(2, 2)),
    ("d", pos(2, 3)),
    ("f", pos(2, 4)),
    ("g", pos(2, 5)),
    ("h", pos(2, 6)),
    ("j", pos(2, 7)),
    ("k", pos(2, 8)),
    ("l", pos(2, 9)),
    (";", pos(2, 10)),
    ("'", pos(2, 11)),
    ("w", pos(3, 1)),
    ("e", pos(3, 2)),
    ("r", pos(3, 3)),
    ("t", pos(3, 4)),
    ("y", pos(3, 5)),
    ("u", pos(3, 6)),
    ("i", pos(3, 7)),
    ("o", pos(3, 8)),
    ("p", pos(3, 9)),
    ("[", pos(3, 10)),
];

const CHROMATIC_ROW: &[(&str, ButtonPosition)] = &[
    ("3", pos(4, 1)),
    ("4", pos(4, 2)),
    ("5", pos(4, 3)),
    ("6", pos(4, 4)),
    ("7", pos(4, 5)),
    ("8", pos(4, 6)),
    ("9", pos(4, 7)),
    ("0", pos(4, 8)),
    ("-", pos(4, 9)),
    ("=", pos(4, 10)),
];

/// An immutable key → button mapping plus the octave row 2 starts in.
#[derive(Debug, Clone)]
pub struct KeyLayout {
    kind: LayoutKind,
    home_octave: i32,
}

impl KeyLayout {
    pub fn new(kind: LayoutKind, home_octave: i32) -> Self {
        KeyLayout { kind, home_octave }
    }

    fn entries(&self) -> impl Iterator<Item = &'static (&'static str, ButtonPosition)> {
        let extra: &'static [(&str, ButtonPosition)] = match self.kind {
            LayoutKind::Base => &[],
            LayoutKind::Chromatic => CHROMATIC_ROW,
        };
        BASE_KEYS.iter().chain(extra)
    }

    /// Button for a key token, or `None` if the key is not on this layout.
    pub fn position(&self, key: &str) -> Option<ButtonPosition> {
        self.entries().find(|(k, _)| *k == key).map(|(_, p)| *p)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> {
        self.entries().map(|(k, _)| *k)
    }

    /// The note a button plays.
    pub fn note_at(&self, position: ButtonPosition) -> Note {
        let offset = 3 * (position.column as i32 - 1) + (position.row as i32 - 2);
        Note {
            pitch: PitchClass::from_semitone(offset),
            octave: self.home_octave + offset.div_euclid(12),
        }
    }

    /// Key → frequency, `None` for keys off the layout or notes outside the
    /// tone table.
    pub fn frequency(&self, key: &str, tones: &ToneTable) -> Option<f64> {
        let note = self.note_at(self.position(key)?);
        tones.frequency(note.pitch, note.octave)
    }
}

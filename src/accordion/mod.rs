//! The accordion: button layout, tone table, voices and the pool that
//! ties held keys to voices.

pub mod bellows;
pub mod instrument;
pub mod layout;
pub mod pool;
pub mod preset;
pub mod tones;
pub mod voice;

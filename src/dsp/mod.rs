//! DSP building blocks: a WebAudio-style clock, automatable params,
//! oscillators, biquad filters and the output bus.
//!
//! The same code drives the browser build (via WASM) and the offline
//! WAV renderer.

pub mod context;
pub mod filter;
pub mod mixer;
pub mod oscillator;
pub mod param;
pub mod renderer;

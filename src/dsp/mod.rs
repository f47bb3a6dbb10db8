//! DSP: synthesis graphs and the contexts that render them.
//!
//! The same graph description drives live playback (AudioWorklet + WASM or a
//! native output) and offline rendering for WAV export, so what you hear is
//! what you export.

pub mod envelope;
pub mod graph;
pub mod live;
pub mod mixer;
pub mod oscillator;
pub mod renderer;
pub mod wav;

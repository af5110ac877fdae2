//! Sawcube library - detune-driven audio-visual demo

pub mod audio;
pub mod cli;
pub mod color;
pub mod detune;
pub mod params;
pub mod rendering;
pub mod scene;
pub mod session;
pub mod sweep;
pub mod synth;

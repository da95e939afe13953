//! Moodwave: mood-driven melody generation, a switchable effects chain and
//! offline WAV export.

pub mod config;
pub mod effects;
pub mod error;
pub mod preset;
pub mod render;
pub mod sequence;
pub mod synth;
pub mod theory;

pub use error::{Error, Result};

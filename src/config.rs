//! User configuration, loaded from `~/.moodwave/config.yaml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::render::{RenderConfig, DEFAULT_FILENAME, DEFAULT_WINDOW_SECONDS};
use crate::sequence::generator::{DEFAULT_OCTAVE, DEFAULT_ROOT};
use crate::theory::DEFAULT_BPM;

/// Defaults for generation and export. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bpm: f64,
    pub sample_rate: u32,
    pub channels: u16,
    /// Frames per render block.
    pub block_size: u32,
    /// Length of the fixed export window in seconds.
    pub export_seconds: f64,
    pub filename: String,
    pub octave: i32,
    pub root: String,
    /// Effect chain, in routing order.
    pub effects: Vec<String>,
    pub instrument: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            sample_rate: 44100,
            channels: 2,
            block_size: 1024,
            export_seconds: DEFAULT_WINDOW_SECONDS,
            filename: DEFAULT_FILENAME.to_string(),
            octave: DEFAULT_OCTAVE,
            root: DEFAULT_ROOT.to_string(),
            effects: Vec::new(),
            instrument: "synth".to_string(),
        }
    }
}

impl Config {
    /// Standard location, `~/.moodwave/config.yaml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".moodwave").join("config.yaml"))
    }

    /// Load from the standard location. A missing file or home directory
    /// yields the defaults; a malformed file is an error.
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => {
                debug!("no config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Output format for the offline renderer.
    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            sample_rate: self.sample_rate,
            channels: self.channels,
            block_size: self.block_size,
            filename: self.filename.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.bpm, 120.0);
        assert_eq!(config.export_seconds, 10.0);
        assert_eq!(config.filename, "sequence.wav");
        assert_eq!(config.octave, 4);
        assert_eq!(config.root, "C");
        assert!(config.effects.is_empty());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "bpm: 90\neffects: [delay, reverb]\nroot: D").unwrap();
        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.bpm, 90.0);
        assert_eq!(config.effects, vec!["delay", "reverb"]);
        assert_eq!(config.root, "D");
        assert_eq!(config.sample_rate, 44100);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "bpm: [not, a, number]").unwrap();
        assert!(Config::load_from(file.path()).is_err());
    }

    #[test]
    fn render_config_mirrors_fields() {
        let config = Config {
            sample_rate: 48000,
            channels: 1,
            ..Config::default()
        };
        let render = config.render_config();
        assert_eq!(render.sample_rate, 48000);
        assert_eq!(render.channels, 1);
        assert_eq!(render.filename, "sequence.wav");
    }
}

//! Built-in software instrument.
//!
//! The render pipeline only needs something implementing
//! [`Instrument`](crate::render::Instrument); this is the one the CLI uses.

pub mod envelope;
pub mod oscillator;
pub mod poly;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use envelope::Envelope;
pub use oscillator::{Phasor, Waveform};
pub use poly::PolySynth;

/// Sound character of the built-in synth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Voice {
    /// Plain triangle wave with a short pluck and long release.
    #[default]
    Synth,
    /// Two-operator FM bell.
    Fm,
    /// Filtered square wave.
    Mono,
}

impl Voice {
    pub const ALL: [Voice; 3] = [Voice::Synth, Voice::Fm, Voice::Mono];

    pub fn key(self) -> &'static str {
        match self {
            Voice::Synth => "synth",
            Voice::Fm => "fm",
            Voice::Mono => "mono",
        }
    }

    pub fn envelope(self) -> Envelope {
        match self {
            Voice::Synth => Envelope {
                attack: 0.005,
                decay: 0.1,
                sustain: 0.3,
                release: 1.0,
            },
            Voice::Fm => Envelope {
                attack: 0.01,
                decay: 0.01,
                sustain: 1.0,
                release: 0.5,
            },
            Voice::Mono => Envelope {
                attack: 0.005,
                decay: 0.1,
                sustain: 0.9,
                release: 1.0,
            },
        }
    }
}

impl FromStr for Voice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Voice::ALL
            .into_iter()
            .find(|v| v.key() == s)
            .ok_or_else(|| Error::UnknownInstrument(s.to_string()))
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_parse_back() {
        for voice in Voice::ALL {
            assert_eq!(voice.key().parse::<Voice>().unwrap(), voice);
        }
        assert!(matches!(
            "sampler".parse::<Voice>(),
            Err(Error::UnknownInstrument(_))
        ));
    }

    #[test]
    fn envelopes_are_sane() {
        for voice in Voice::ALL {
            let env = voice.envelope();
            assert!(env.attack >= 0.0 && env.decay >= 0.0 && env.release > 0.0);
            assert!((0.0..=1.0).contains(&env.sustain));
        }
    }
}

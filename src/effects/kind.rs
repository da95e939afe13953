//! The closed set of effect types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectKind {
    Reverb,
    Delay,
    Distortion,
    Chorus,
    Tremolo,
}

impl EffectKind {
    /// Every kind, in slot-bank order.
    pub const ALL: [EffectKind; 5] = [
        EffectKind::Reverb,
        EffectKind::Delay,
        EffectKind::Distortion,
        EffectKind::Chorus,
        EffectKind::Tremolo,
    ];

    pub fn key(self) -> &'static str {
        match self {
            EffectKind::Reverb => "reverb",
            EffectKind::Delay => "delay",
            EffectKind::Distortion => "distortion",
            EffectKind::Chorus => "chorus",
            EffectKind::Tremolo => "tremolo",
        }
    }

    /// Position in [`EffectKind::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Parse a list of effect keys. Fails on the first unknown key without
    /// returning a partial list.
    pub fn parse_list<S: AsRef<str>>(keys: &[S]) -> Result<Vec<EffectKind>> {
        keys.iter().map(|k| k.as_ref().parse()).collect()
    }
}

impl FromStr for EffectKind {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        EffectKind::ALL
            .into_iter()
            .find(|k| k.key() == s)
            .ok_or_else(|| Error::UnknownEffect(s.to_string()))
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

//! Mood presets: each mood bundles a scale, chord progressions, rhythm
//! patterns, a tempo range and a velocity range.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::scale::ScaleKind;
use crate::error::Error;

/// The closed set of moods the generator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Sad,
    Energetic,
    Calm,
    Mysterious,
}

/// Inclusive numeric range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Linear interpolation: `t = 0` gives `min`, `t = 1` gives `max`.
    pub fn lerp(&self, t: f64) -> f64 {
        self.min + t * (self.max - self.min)
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Static description of a mood.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoodProfile {
    pub scale: ScaleKind,
    /// 1-indexed scale degrees, one chord per entry.
    pub chord_progressions: &'static [&'static [i64]],
    /// Duration tokens cycled over the melodic overlay.
    pub rhythm_patterns: &'static [&'static [&'static str]],
    /// Beats per minute.
    pub tempo: ValueRange,
    pub velocity: ValueRange,
}

const HAPPY: MoodProfile = MoodProfile {
    scale: ScaleKind::Major,
    chord_progressions: &[&[1, 4, 5, 1], &[1, 6, 4, 5], &[1, 5, 6, 4]],
    rhythm_patterns: &[
        &["8n", "8n", "4n", "8n", "8n", "4n"],
        &["4n", "8n", "8n", "4n"],
        &["8n", "8n", "8n", "8n", "4n"],
    ],
    tempo: ValueRange::new(120.0, 140.0),
    velocity: ValueRange::new(0.6, 0.8),
};

const SAD: MoodProfile = MoodProfile {
    scale: ScaleKind::Minor,
    chord_progressions: &[&[1, 6, 4, 5], &[6, 4, 1, 5], &[1, 4, 6, 5]],
    rhythm_patterns: &[&["2n", "2n"], &["2n.", "4n"], &["4n", "4n", "2n"]],
    tempo: ValueRange::new(60.0, 80.0),
    velocity: ValueRange::new(0.4, 0.6),
};

const ENERGETIC: MoodProfile = MoodProfile {
    scale: ScaleKind::Mixolydian,
    chord_progressions: &[&[1, 7, 4, 5], &[1, 4, 7, 5], &[1, 5, 7, 4]],
    rhythm_patterns: &[
        &["16n", "16n", "8n", "16n", "16n", "8n"],
        &["8n", "8n", "8n", "8n", "16n", "16n", "8n"],
        &["8t", "8t", "8t", "4n"],
    ],
    tempo: ValueRange::new(140.0, 180.0),
    velocity: ValueRange::new(0.7, 0.9),
};

const CALM: MoodProfile = MoodProfile {
    scale: ScaleKind::Pentatonic,
    chord_progressions: &[&[1, 4, 5, 4], &[1, 6, 4, 5], &[4, 1, 5, 4]],
    rhythm_patterns: &[&["2n", "2n"], &["4n", "4n", "2n"], &["2n.", "4n"]],
    tempo: ValueRange::new(70.0, 90.0),
    velocity: ValueRange::new(0.3, 0.5),
};

const MYSTERIOUS: MoodProfile = MoodProfile {
    scale: ScaleKind::Dorian,
    chord_progressions: &[&[1, 7, 6, 5], &[1, 2, 7, 6], &[2, 7, 1, 6]],
    rhythm_patterns: &[
        &["4n", "8n", "4n", "8n"],
        &["8n", "4n.", "4n"],
        &["4n", "8n", "8n", "2n"],
    ],
    tempo: ValueRange::new(90.0, 110.0),
    velocity: ValueRange::new(0.4, 0.7),
};

impl Mood {
    pub const ALL: [Mood; 5] = [
        Mood::Happy,
        Mood::Sad,
        Mood::Energetic,
        Mood::Calm,
        Mood::Mysterious,
    ];

    pub fn profile(self) -> &'static MoodProfile {
        match self {
            Mood::Happy => &HAPPY,
            Mood::Sad => &SAD,
            Mood::Energetic => &ENERGETIC,
            Mood::Calm => &CALM,
            Mood::Mysterious => &MYSTERIOUS,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Sad => "sad",
            Mood::Energetic => "energetic",
            Mood::Calm => "calm",
            Mood::Mysterious => "mysterious",
        }
    }

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Mood::Happy => "Happy",
            Mood::Sad => "Sad",
            Mood::Energetic => "Energetic",
            Mood::Calm => "Calm",
            Mood::Mysterious => "Mysterious",
        }
    }

    /// Draw a tempo uniformly from the mood's tempo range.
    pub fn suggested_tempo<R: Rng + ?Sized>(self, rng: &mut R) -> f64 {
        let range = self.profile().tempo;
        rng.gen_range(range.min..=range.max)
    }
}

impl FromStr for Mood {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mood::ALL
            .into_iter()
            .find(|m| m.key() == s)
            .ok_or_else(|| Error::UnknownMood(s.to_string()))
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

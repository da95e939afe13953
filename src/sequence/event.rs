//! Sequence event model: a note or chord at an absolute offset in seconds.
//!
//! Serialized as `{"note": "C4" | ["C4","E4","G4"], "duration": "8n",
//! "time": 0.25, "velocity": 0.7}`, the shape stored compositions use.

use serde::{Deserialize, Serialize};

use crate::theory::DurationToken;

/// What an event sounds: one pitch, or several pitches struck together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PitchContent {
    Note(String),
    Chord(Vec<String>),
}

impl PitchContent {
    pub fn is_chord(&self) -> bool {
        matches!(self, PitchContent::Chord(_))
    }

    /// All pitch names, in order. A single note yields one entry.
    pub fn pitches(&self) -> &[String] {
        match self {
            PitchContent::Note(n) => std::slice::from_ref(n),
            PitchContent::Chord(notes) => notes,
        }
    }
}

/// One entry in a generated sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicEvent {
    #[serde(rename = "note")]
    pub pitch: PitchContent,
    pub duration: DurationToken,
    /// Offset from sequence start, in seconds.
    pub time: f64,
    /// Velocity in the range 0.0–1.0.
    pub velocity: f32,
}

impl MusicEvent {
    pub fn note(name: impl Into<String>, duration: DurationToken, time: f64, velocity: f32) -> Self {
        Self {
            pitch: PitchContent::Note(name.into()),
            duration,
            time,
            velocity,
        }
    }

    pub fn chord(notes: Vec<String>, duration: DurationToken, time: f64, velocity: f32) -> Self {
        Self {
            pitch: PitchContent::Chord(notes),
            duration,
            time,
            velocity,
        }
    }

    pub fn is_chord(&self) -> bool {
        self.pitch.is_chord()
    }
}

//! Saved effect presets and compositions, stored as JSON.

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::effects::{EffectSettings, EffectsManager};
use crate::error::Result;
use crate::sequence::{MusicEvent, PitchContent};
use crate::theory::{Clock, DurationToken, Mood, Tempo};

/// Velocity given to stored events that carry none.
pub const DEFAULT_STORED_VELOCITY: f32 = 1.0;

/// A named snapshot of the whole effect bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectPreset {
    pub name: String,
    pub effects: Vec<EffectSettings>,
}

impl EffectPreset {
    pub fn capture(name: impl Into<String>, manager: &EffectsManager) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            effects: manager.get_current_settings()?,
        })
    }

    pub fn apply_to(&self, manager: &mut EffectsManager) -> Result<()> {
        manager.apply_settings(&self.effects)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// An event as stored, where `time` and `velocity` may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
    pub note: PitchContent,
    pub duration: DurationToken,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<f32>,
}

impl From<&MusicEvent> for StoredEvent {
    fn from(event: &MusicEvent) -> Self {
        Self {
            note: event.pitch.clone(),
            duration: event.duration.clone(),
            time: Some(event.time),
            velocity: Some(event.velocity),
        }
    }
}

impl StoredEvent {
    /// Fill in missing fields: the `index`-th event without a time plays
    /// `index` eighth notes in; a missing velocity is full scale.
    pub fn resolve<C: Clock + ?Sized>(&self, index: usize, clock: &C) -> MusicEvent {
        let time = self
            .time
            .unwrap_or_else(|| index as f64 * clock.seconds(&DurationToken::eighth()));
        MusicEvent {
            pitch: self.note.clone(),
            duration: self.duration.clone(),
            time,
            velocity: self.velocity.unwrap_or(DEFAULT_STORED_VELOCITY),
        }
    }
}

/// A saved piece: the generated melody plus what it was made with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    pub name: String,
    pub mood: Mood,
    /// Beats per minute.
    pub tempo: f64,
    pub instrument: String,
    #[serde(deserialize_with = "melody_field")]
    pub melody: Vec<StoredEvent>,
}

impl Composition {
    pub fn new(
        name: impl Into<String>,
        mood: Mood,
        tempo: f64,
        instrument: impl Into<String>,
        events: &[MusicEvent],
    ) -> Self {
        Self {
            name: name.into(),
            mood,
            tempo,
            instrument: instrument.into(),
            melody: events.iter().map(StoredEvent::from).collect(),
        }
    }

    /// The tempo the piece was saved at.
    pub fn clock(&self) -> Tempo {
        Tempo::new(self.tempo)
    }

    /// Playable events, with missing fields filled in against `clock`.
    pub fn events<C: Clock + ?Sized>(&self, clock: &C) -> Vec<MusicEvent> {
        self.melody
            .iter()
            .enumerate()
            .map(|(i, stored)| stored.resolve(i, clock))
            .collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Write as JSON, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Melodies are accepted either inline or as a JSON-encoded string, the
/// way older saves stored them.
fn melody_field<'de, D>(deserializer: D) -> std::result::Result<Vec<StoredEvent>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Melody {
        Inline(Vec<StoredEvent>),
        Encoded(String),
    }

    match Melody::deserialize(deserializer)? {
        Melody::Inline(events) => Ok(events),
        Melody::Encoded(json) => serde_json::from_str(&json).map_err(serde::de::Error::custom),
    }
}

//! Music theory tables: scales, moods, pitch spelling, durations and tempo.

pub mod clock;
pub mod duration;
pub mod mood;
pub mod pitch;
pub mod scale;

pub use clock::{Clock, SharedTempo, Tempo, DEFAULT_BPM};
pub use duration::{Beat, DurationToken, TICKS_PER_BEAT};
pub use mood::{Mood, MoodProfile, ValueRange};
pub use scale::{ScaleKind, WorkingScale};

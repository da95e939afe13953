//! Sequence generation: mood-driven melodies and helpers over event lists.

pub mod event;
pub mod generator;

pub use event::{MusicEvent, PitchContent};
pub use generator::MelodyGenerator;

use crate::theory::Clock;

/// Time at which the last event stops sounding, in seconds.
///
/// Returns 0.0 for an empty sequence.
pub fn sequence_end<C: Clock + ?Sized>(events: &[MusicEvent], clock: &C) -> f64 {
    events
        .iter()
        .map(|e| e.time + clock.seconds(&e.duration))
        .fold(0.0, f64::max)
}

/// Flatten `repeats` passes of a looped sequence into one event list.
///
/// Each pass is offset by `loop_end` seconds; events at or past `loop_end`
/// within a pass are cut, the way a looping part ignores them.
pub fn loop_sequence(events: &[MusicEvent], loop_end: f64, repeats: usize) -> Vec<MusicEvent> {
    if loop_end <= 0.0 {
        return Vec::new();
    }
    (0..repeats)
        .flat_map(move |pass| {
            let offset = pass as f64 * loop_end;
            events
                .iter()
                .filter(move |e| e.time < loop_end)
                .map(move |e| MusicEvent {
                    time: e.time + offset,
                    ..e.clone()
                })
        })
        .collect()
}

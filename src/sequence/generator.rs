//! Melody generator: turns a mood into a chord progression with a melodic
//! overlay, and derives randomized variations of existing sequences.
//!
//! All randomness comes from the caller's RNG and all durations from the
//! caller's [`Clock`]; the generator itself is immutable, so one instance can
//! serve concurrent callers.

use rand::Rng;
use tracing::debug;

use super::event::{MusicEvent, PitchContent};
use crate::error::{Error, Result};
use crate::theory::{Clock, DurationToken, Mood, ValueRange, WorkingScale};

/// Default octave appended to scale degrees.
pub const DEFAULT_OCTAVE: i32 = 4;

/// Default root note.
pub const DEFAULT_ROOT: &str = "C";

/// Single notes generated over each chord.
pub const OVERLAY_NOTES: usize = 4;

/// Chance that an overlay note is drawn from the chord rather than the scale.
pub const CHORD_TONE_PROBABILITY: f64 = 0.3;

/// Chance that [`MelodyGenerator::add_variation`] rewrites an event.
pub const VARIATION_PROBABILITY: f64 = 0.3;

const CHORD_VELOCITIES: [f32; 3] = [0.70, 0.75, 0.80];

const VARIATION_VELOCITY: ValueRange = ValueRange {
    min: 0.5,
    max: 0.8,
};

/// Generates sequences for one mood, octave and root.
#[derive(Debug, Clone)]
pub struct MelodyGenerator {
    mood: Mood,
    octave: i32,
    root: String,
    scale: WorkingScale,
}

impl MelodyGenerator {
    /// Generator for a mood key (`"happy"`, `"sad"`, ...) at octave 4 on C.
    pub fn new(mood_key: &str) -> Result<Self> {
        Self::with_options(mood_key.parse()?, DEFAULT_OCTAVE, DEFAULT_ROOT)
    }

    pub fn with_options(mood: Mood, octave: i32, root: &str) -> Result<Self> {
        let scale = WorkingScale::new(mood.profile().scale, root, octave)
            .ok_or_else(|| Error::InvalidRoot(root.to_string()))?;
        Ok(Self {
            mood,
            octave,
            root: root.to_string(),
            scale,
        })
    }

    pub fn mood(&self) -> Mood {
        self.mood
    }

    pub fn octave(&self) -> i32 {
        self.octave
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// The octave-qualified scale every pitch is drawn from.
    pub fn working_scale(&self) -> &WorkingScale {
        &self.scale
    }

    /// Generate a fresh sequence.
    ///
    /// For each degree of a randomly chosen progression this emits one
    /// half-note triad followed by [`OVERLAY_NOTES`] single notes spaced an
    /// eighth note apart, then advances by a half note. Events come out in
    /// non-decreasing time order.
    pub fn generate_melody<R, C>(&self, rng: &mut R, clock: &C) -> Result<Vec<MusicEvent>>
    where
        R: Rng + ?Sized,
        C: Clock + ?Sized,
    {
        let profile = self.mood.profile();
        let progression = *pick(rng, profile.chord_progressions);
        let rhythm = pick(rng, profile.rhythm_patterns)
            .iter()
            .map(|token| token.parse::<DurationToken>())
            .collect::<Result<Vec<_>>>()?;

        let half = DurationToken::half();
        let half_secs = clock.seconds(&half);
        let eighth_secs = clock.seconds(&DurationToken::eighth());

        let mut events = Vec::with_capacity(progression.len() * (OVERLAY_NOTES + 1));
        let mut current_time = 0.0;

        for &degree in progression {
            let chord = self.scale.triad(degree);
            events.push(MusicEvent::chord(
                chord.to_vec(),
                half.clone(),
                current_time,
                *pick(rng, &CHORD_VELOCITIES),
            ));

            for index in 0..OVERLAY_NOTES {
                let note = if rng.gen_bool(CHORD_TONE_PROBABILITY) {
                    pick(rng, &chord)
                } else {
                    pick(rng, self.scale.notes())
                };
                let velocity = profile.velocity.lerp(rng.gen::<f64>()) as f32;
                events.push(MusicEvent::note(
                    note.clone(),
                    rhythm[index % rhythm.len()].clone(),
                    current_time + index as f64 * eighth_secs,
                    velocity,
                ));
            }

            current_time += half_secs;
        }

        debug!(
            mood = %self.mood,
            chords = progression.len(),
            events = events.len(),
            bpm = clock.bpm(),
            "generated melody"
        );
        Ok(events)
    }

    /// Return a varied copy of `sequence`.
    ///
    /// Each event is independently rewritten with probability
    /// [`VARIATION_PROBABILITY`]. A rewritten chord becomes the degree-1
    /// triad and a rewritten note is redrawn from the scale; its velocity
    /// is redrawn from 0.5 to 0.8. Duration and time are always preserved.
    pub fn add_variation<R>(&self, sequence: &[MusicEvent], rng: &mut R) -> Vec<MusicEvent>
    where
        R: Rng + ?Sized,
    {
        sequence
            .iter()
            .map(|event| {
                if !rng.gen_bool(VARIATION_PROBABILITY) {
                    return event.clone();
                }
                let pitch = match &event.pitch {
                    PitchContent::Chord(_) => PitchContent::Chord(self.scale.triad(1).to_vec()),
                    PitchContent::Note(_) => PitchContent::Note(pick(rng, self.scale.notes()).clone()),
                };
                MusicEvent {
                    pitch,
                    velocity: VARIATION_VELOCITY.lerp(rng.gen::<f64>()) as f32,
                    ..event.clone()
                }
            })
            .collect()
    }
}

/// Uniform choice from a non-empty slice.
fn pick<'a, T, R: Rng + ?Sized>(rng: &mut R, items: &'a [T]) -> &'a T {
    &items[rng.gen_range(0..items.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theory::Tempo;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng(seed: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(seed)
    }

    #[test]
    fn unknown_mood_fails() {
        let err = MelodyGenerator::new("angry").unwrap_err();
        assert!(matches!(err, Error::UnknownMood(_)));
    }

    #[test]
    fn shared_generator_across_threads() {
        let g = MelodyGenerator::new("mysterious").unwrap();
        let tempo = Tempo::default();
        let runs: Vec<Vec<MusicEvent>> = std::thread::scope(|scope| {
            let handles: Vec<_> = [7, 7, 8, 8]
                .into_iter()
                .map(|seed| {
                    let (g, tempo) = (&g, &tempo);
                    scope.spawn(move || {
                        let events = g.generate_melody(&mut rng(seed), tempo).unwrap();
                        g.add_variation(&events, &mut rng(seed + 100))
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(runs[0], runs[1]);
        assert_eq!(runs[2], runs[3]);
        assert_ne!(runs[0], runs[2]);
        let serial = g.generate_melody(&mut rng(7), &tempo).unwrap();
        assert_eq!(runs[0], g.add_variation(&serial, &mut rng(107)));
    }

    #[test]
    fn invalid_root_fails() {
        let err = MelodyGenerator::with_options(Mood::Happy, 4, "Q").unwrap_err();
        assert!(matches!(err, Error::InvalidRoot(_)));
    }

    #[test]
    fn defaults() {
        let g = MelodyGenerator::new("sad").unwrap();
        assert_eq!(g.mood(), Mood::Sad);
        assert_eq!(g.octave(), 4);
        assert_eq!(g.root(), "C");
    }

    #[test]
    fn event_count_matches_progression() {
        let g = MelodyGenerator::new("happy").unwrap();
        let events = g.generate_melody(&mut rng(1), &Tempo::default()).unwrap();
        // Every happy progression has four chords.
        assert_eq!(events.len(), 4 * (OVERLAY_NOTES + 1));
        let chords = events.iter().filter(|e| e.is_chord()).count();
        assert_eq!(chords, 4);
    }

    #[test]
    fn chord_then_overlay_layout() {
        let g = MelodyGenerator::new("calm").unwrap();
        let tempo = Tempo::new(120.0);
        let events = g.generate_melody(&mut rng(3), &tempo).unwrap();
        for (i, event) in events.iter().enumerate() {
            let slot = i % (OVERLAY_NOTES + 1);
            let chord_index = i / (OVERLAY_NOTES + 1);
            let chord_time = chord_index as f64 * 1.0; // half note at 120 BPM
            if slot == 0 {
                assert!(event.is_chord());
                assert_eq!(event.duration.as_str(), "2n");
                assert!(CHORD_VELOCITIES.contains(&event.velocity));
                assert!((event.time - chord_time).abs() < 1e-9);
            } else {
                assert!(!event.is_chord());
                let expected = chord_time + (slot - 1) as f64 * 0.25;
                assert!((event.time - expected).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn overlay_velocity_within_mood_range() {
        for mood in Mood::ALL {
            let g = MelodyGenerator::with_options(mood, 4, "C").unwrap();
            let events = g.generate_melody(&mut rng(11), &Tempo::default()).unwrap();
            let range = mood.profile().velocity;
            for e in events.iter().filter(|e| !e.is_chord()) {
                let v = e.velocity as f64;
                assert!(v >= range.min - 1e-6 && v <= range.max + 1e-6, "{mood}: {v}");
            }
        }
    }

    #[test]
    fn overlay_durations_follow_a_mood_rhythm() {
        let g = MelodyGenerator::new("energetic").unwrap();
        let events = g.generate_melody(&mut rng(5), &Tempo::default()).unwrap();
        let used: Vec<&str> = events
            .iter()
            .filter(|e| !e.is_chord())
            .take(OVERLAY_NOTES)
            .map(|e| e.duration.as_str())
            .collect();
        let matches_some_pattern = Mood::Energetic.profile().rhythm_patterns.iter().any(|p| {
            (0..OVERLAY_NOTES).all(|i| p[i % p.len()] == used[i])
        });
        assert!(matches_some_pattern, "overlay durations {used:?}");
    }

    #[test]
    fn same_seed_same_sequence() {
        let g = MelodyGenerator::new("mysterious").unwrap();
        let a = g.generate_melody(&mut rng(42), &Tempo::default()).unwrap();
        let b = g.generate_melody(&mut rng(42), &Tempo::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn tempo_scales_offsets() {
        let g = MelodyGenerator::new("happy").unwrap();
        let fast = g.generate_melody(&mut rng(9), &Tempo::new(120.0)).unwrap();
        let slow = g.generate_melody(&mut rng(9), &Tempo::new(60.0)).unwrap();
        for (f, s) in fast.iter().zip(&slow) {
            assert!((s.time - 2.0 * f.time).abs() < 1e-9);
            assert_eq!(f.pitch, s.pitch);
        }
    }

    #[test]
    fn variation_keeps_timing_and_length() {
        let g = MelodyGenerator::new("happy").unwrap();
        let original = g.generate_melody(&mut rng(1), &Tempo::default()).unwrap();
        let varied = g.add_variation(&original, &mut rng(2));
        assert_eq!(varied.len(), original.len());
        for (o, v) in original.iter().zip(&varied) {
            assert_eq!(o.duration, v.duration);
            assert_eq!(o.time, v.time);
            assert_eq!(o.is_chord(), v.is_chord());
        }
    }

    #[test]
    fn variation_rewrites_chords_to_tonic_triad() {
        let g = MelodyGenerator::new("happy").unwrap();
        let original = g.generate_melody(&mut rng(1), &Tempo::default()).unwrap();
        let varied = g.add_variation(&original, &mut rng(77));
        for (o, v) in original.iter().zip(&varied) {
            if o != v && v.is_chord() {
                assert_eq!(v.pitch.pitches(), &["C4", "E4", "G4"]);
                assert!((0.5..=0.8).contains(&v.velocity));
            }
        }
    }

    #[test]
    fn variation_does_not_mutate_input() {
        let g = MelodyGenerator::new("sad").unwrap();
        let original = g.generate_melody(&mut rng(4), &Tempo::default()).unwrap();
        let snapshot = original.clone();
        let _ = g.add_variation(&original, &mut rng(5));
        assert_eq!(original, snapshot);
    }
}

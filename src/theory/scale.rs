//! Scale tables and working-scale instantiation.

use serde::{Deserialize, Serialize};

use super::pitch;

/// The closed set of scales the mood presets draw from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleKind {
    Major,
    Minor,
    Pentatonic,
    Dorian,
    Mixolydian,
}

impl ScaleKind {
    /// Pitch classes of the scale rooted on C.
    pub fn pitch_classes(self) -> &'static [&'static str] {
        match self {
            ScaleKind::Major => &["C", "D", "E", "F", "G", "A", "B"],
            ScaleKind::Minor => &["C", "D", "Eb", "F", "G", "Ab", "Bb"],
            ScaleKind::Pentatonic => &["C", "D", "E", "G", "A"],
            ScaleKind::Dorian => &["C", "D", "Eb", "F", "G", "A", "Bb"],
            ScaleKind::Mixolydian => &["C", "D", "E", "F", "G", "A", "Bb"],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ScaleKind::Major => "major",
            ScaleKind::Minor => "minor",
            ScaleKind::Pentatonic => "pentatonic",
            ScaleKind::Dorian => "dorian",
            ScaleKind::Mixolydian => "mixolydian",
        }
    }

    /// Number of degrees in the scale.
    pub fn len(self) -> usize {
        self.pitch_classes().len()
    }

    /// Pitch classes transposed so that degree 1 sits on `root`.
    ///
    /// Returns `None` if `root` is not a valid pitch-class spelling. A C root
    /// yields the table unchanged, keeping its original spelling.
    pub fn transposed(self, root: &str) -> Option<Vec<String>> {
        let shift = pitch::pitch_class_semitone(root)?;
        let classes = self.pitch_classes();
        if shift == 0 {
            return Some(classes.iter().map(|c| c.to_string()).collect());
        }

        let prefer_flats = (root.len() > 1 && root.ends_with('b'))
            || classes.iter().any(|c| c.ends_with('b'));
        classes
            .iter()
            .map(|c| pitch::transpose_class(c, shift, prefer_flats).map(str::to_string))
            .collect()
    }
}

/// A concrete, octave-qualified scale: the pitch names melodic and harmonic
/// material is drawn from (e.g. `["C4", "D4", ..., "B4"]`).
///
/// Every degree carries the same octave suffix; no octave carry happens when
/// a transposed scale wraps past B.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingScale {
    notes: Vec<String>,
}

impl WorkingScale {
    /// Instantiate `kind` on `root` at `octave`. `None` if `root` is invalid.
    pub fn new(kind: ScaleKind, root: &str, octave: i32) -> Option<Self> {
        let notes = kind
            .transposed(root)?
            .into_iter()
            .map(|class| format!("{class}{octave}"))
            .collect();
        Some(Self { notes })
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn contains(&self, note: &str) -> bool {
        self.notes.iter().any(|n| n == note)
    }

    /// Note at a 0-based index, wrapping modulo the scale length.
    pub fn wrapped(&self, index: i64) -> &str {
        let n = self.notes.len() as i64;
        &self.notes[index.rem_euclid(n) as usize]
    }

    /// Triad on a 1-indexed scale degree: `[degree-1, degree+1, degree+3]`
    /// taken modulo the scale length.
    ///
    /// The +1/+3 stacking and the modulo wrap are the voicing rule of this
    /// generator; voicings can alias across the scale boundary.
    pub fn triad(&self, degree: i64) -> [String; 3] {
        [
            self.wrapped(degree - 1).to_string(),
            self.wrapped(degree + 1).to_string(),
            self.wrapped(degree + 3).to_string(),
        ]
    }
}

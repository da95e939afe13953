//! Pitch spelling: pitch classes, note names like "Eb4", and MIDI conversion.

/// Semitone offset of a pitch class from C (`"C"` = 0, `"Eb"` = 3, `"B"` = 11).
///
/// Accepts a natural letter followed by any number of `#` or `b` accidentals.
pub fn pitch_class_semitone(class: &str) -> Option<i32> {
    let mut chars = class.chars();
    let base = letter_semitone(chars.next()?)?;
    let mut offset = 0;
    for c in chars {
        match c {
            '#' => offset += 1,
            'b' => offset -= 1,
            _ => return None,
        }
    }
    Some((base + offset).rem_euclid(12))
}

fn letter_semitone(letter: char) -> Option<i32> {
    match letter {
        'C' => Some(0),
        'D' => Some(2),
        'E' => Some(4),
        'F' => Some(5),
        'G' => Some(7),
        'A' => Some(9),
        'B' => Some(11),
        _ => None,
    }
}

const SHARP_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];
const FLAT_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// Spell a semitone (mod 12) as a pitch class, preferring flats or sharps.
pub fn spell(semitone: i32, prefer_flats: bool) -> &'static str {
    let idx = semitone.rem_euclid(12) as usize;
    if prefer_flats {
        FLAT_NAMES[idx]
    } else {
        SHARP_NAMES[idx]
    }
}

/// Transpose a pitch class by `semitones`. Returns `None` if `class` is not
/// a valid spelling.
pub fn transpose_class(class: &str, semitones: i32, prefer_flats: bool) -> Option<&'static str> {
    let base = pitch_class_semitone(class)?;
    Some(spell(base + semitones, prefer_flats))
}

/// Parse a note name string into a MIDI note number.
///
/// Format: `<letter><optional accidental><octave>`
/// - Letter: C, D, E, F, G, A, B
/// - Accidental: # (sharp) or b (flat)
/// - Octave: -1 to 9 (C4 = middle C = MIDI 60)
pub fn parse_note_name(name: &str) -> Option<u8> {
    let split = name
        .char_indices()
        .skip(1)
        .find(|&(_, c)| c != '#' && c != 'b')
        .map(|(i, _)| i)?;
    let (class, octave_str) = name.split_at(split);
    let octave: i32 = octave_str.parse().ok()?;

    let base = letter_semitone(class.chars().next()?)?;
    let accidental: i32 = class
        .chars()
        .skip(1)
        .map(|c| if c == '#' { 1 } else { -1 })
        .sum();

    // C-1 = 0, C4 = 60, A4 = 69
    let midi = (octave + 1) * 12 + base + accidental;

    if !(0..=127).contains(&midi) {
        None
    } else {
        Some(midi as u8)
    }
}

/// Convert a MIDI note number to frequency in Hz (A4 = 440 Hz).
pub fn midi_to_freq(note: u8) -> f64 {
    440.0 * 2.0f64.powf((note as f64 - 69.0) / 12.0)
}

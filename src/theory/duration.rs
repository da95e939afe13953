//! Musical durations: integer-tick time and symbolic duration tokens.
//!
//! Uses 960 PPQN (Pulses Per Quarter Note) so that straight, dotted and
//! triplet subdivisions down to a 64th note are whole tick counts. Tokens
//! follow the familiar notation: `"4n"` quarter, `"8n"` eighth, `"2n."`
//! dotted half, `"8t"` eighth triplet, `"1m"` one 4/4 measure.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Add;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Ticks per quarter note (beat).
pub const TICKS_PER_BEAT: u64 = 960;

/// Beats per measure. Measures are always 4/4.
pub const BEATS_PER_BAR: u64 = 4;

const TICKS_PER_WHOLE: u64 = 4 * TICKS_PER_BEAT;

/// Musical time measured in integer ticks at [`TICKS_PER_BEAT`] resolution.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct Beat {
    ticks: u64,
}

impl Beat {
    pub const ZERO: Beat = Beat { ticks: 0 };

    pub fn from_ticks(ticks: u64) -> Self {
        Self { ticks }
    }

    /// Create a `Beat` from whole beats (quarter notes).
    pub fn from_beats(beats: u32) -> Self {
        Self {
            ticks: beats as u64 * TICKS_PER_BEAT,
        }
    }

    pub fn ticks(self) -> u64 {
        self.ticks
    }

    pub fn as_beats_f64(self) -> f64 {
        self.ticks as f64 / TICKS_PER_BEAT as f64
    }

    /// Length in seconds at the given tempo.
    pub fn to_seconds(self, bpm: f64) -> f64 {
        self.as_beats_f64() * 60.0 / bpm
    }
}

impl Ord for Beat {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ticks.cmp(&other.ticks)
    }
}

impl PartialOrd for Beat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Add for Beat {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            ticks: self.ticks + rhs.ticks,
        }
    }
}

/// A symbolic note length such as `"2n"` or `"8t"`.
///
/// The original spelling is kept so sequences round-trip through JSON
/// unchanged; the tick length is resolved once at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DurationToken {
    text: String,
    length: Beat,
}

impl DurationToken {
    /// Half note, the length of every chord event.
    pub fn half() -> Self {
        Self::parse_static("2n", 2 * TICKS_PER_BEAT)
    }

    /// Eighth note, the spacing of the melodic overlay.
    pub fn eighth() -> Self {
        Self::parse_static("8n", TICKS_PER_BEAT / 2)
    }

    /// One 4/4 measure.
    pub fn measure() -> Self {
        Self::parse_static("1m", BEATS_PER_BAR * TICKS_PER_BEAT)
    }

    fn parse_static(text: &str, ticks: u64) -> Self {
        Self {
            text: text.to_string(),
            length: Beat::from_ticks(ticks),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Musical length of the token.
    pub fn length(&self) -> Beat {
        self.length
    }

    /// Length in seconds at the given tempo.
    pub fn to_seconds(&self, bpm: f64) -> f64 {
        self.length.to_seconds(bpm)
    }

    fn resolve(text: &str) -> Option<u64> {
        if let Some(count) = text.strip_suffix('m') {
            let bars: u64 = count.parse().ok()?;
            return bars.checked_mul(BEATS_PER_BAR * TICKS_PER_BEAT);
        }

        let (body, dotted) = match text.strip_suffix('.') {
            Some(body) => (body, true),
            None => (text, false),
        };
        let (division, triplet) = if let Some(d) = body.strip_suffix('n') {
            (d, false)
        } else if let Some(d) = body.strip_suffix('t') {
            (d, true)
        } else {
            return None;
        };
        if dotted && triplet {
            return None;
        }

        let division: u64 = division.parse().ok()?;
        if !matches!(division, 1 | 2 | 4 | 8 | 16 | 32 | 64) {
            return None;
        }
        let base = TICKS_PER_WHOLE / division;
        Some(if dotted {
            base * 3 / 2
        } else if triplet {
            base * 2 / 3
        } else {
            base
        })
    }
}

impl FromStr for DurationToken {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ticks = Self::resolve(s).ok_or_else(|| Error::UnknownDuration(s.to_string()))?;
        Ok(Self {
            text: s.to_string(),
            length: Beat::from_ticks(ticks),
        })
    }
}

impl TryFrom<String> for DurationToken {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<DurationToken> for String {
    fn from(token: DurationToken) -> Self {
        token.text
    }
}

impl fmt::Display for DurationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticks(token: &str) -> u64 {
        token.parse::<DurationToken>().unwrap().length().ticks()
    }

    #[test]
    fn straight_divisions() {
        assert_eq!(ticks("1n"), 3840);
        assert_eq!(ticks("2n"), 1920);
        assert_eq!(ticks("4n"), 960);
        assert_eq!(ticks("8n"), 480);
        assert_eq!(ticks("16n"), 240);
        assert_eq!(ticks("64n"), 60);
    }

    #[test]
    fn dotted_and_triplet() {
        assert_eq!(ticks("2n."), 2880);
        assert_eq!(ticks("4n."), 1440);
        assert_eq!(ticks("8t"), 320);
        assert_eq!(ticks("4t"), 640);
    }

    #[test]
    fn measures() {
        assert_eq!(ticks("1m"), 3840);
        assert_eq!(ticks("2m"), 7680);
    }

    #[test]
    fn rejects_garbage() {
        for bad in ["", "n", "3n", "8x", "8t.", "abc", "-4n", "10000000000000000m"] {
            let result = bad.parse::<DurationToken>();
            assert!(
                matches!(result, Err(Error::UnknownDuration(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn seconds_at_120_bpm() {
        assert!((DurationToken::half().to_seconds(120.0) - 1.0).abs() < 1e-12);
        assert!((DurationToken::eighth().to_seconds(120.0) - 0.25).abs() < 1e-12);
        assert!((DurationToken::measure().to_seconds(120.0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn constructors_match_parsed() {
        assert_eq!(DurationToken::half(), "2n".parse().unwrap());
        assert_eq!(DurationToken::eighth(), "8n".parse().unwrap());
        assert_eq!(DurationToken::measure(), "1m".parse().unwrap());
    }

    #[test]
    fn serializes_as_plain_string() {
        let token: DurationToken = "2n.".parse().unwrap();
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, "\"2n.\"");
        let back: DurationToken = serde_json::from_str(&json).unwrap();
        assert_eq!(back, token);
        assert!(serde_json::from_str::<DurationToken>("\"7q\"").is_err());
    }

    #[test]
    fn beat_arithmetic() {
        let a = Beat::from_beats(1);
        let b = Beat::from_beats(2);
        assert_eq!((a + b).ticks(), 3 * TICKS_PER_BEAT);
        assert!(a < b);
        assert!((Beat::from_beats(1).to_seconds(60.0) - 1.0).abs() < 1e-12);
    }
}

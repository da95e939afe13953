//! Tempo capability: resolves duration tokens to seconds.
//!
//! Generation and rendering never read tempo from ambient state; they are
//! handed a [`Clock`]. [`Tempo`] is a fixed value, [`SharedTempo`] is a
//! process-wide handle that UI controls can retune while other holders read it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::duration::{Beat, DurationToken};

/// Default tempo in beats per minute.
pub const DEFAULT_BPM: f64 = 120.0;

/// Anything that can answer "how many seconds is this token right now".
pub trait Clock {
    /// Current tempo in beats per minute.
    fn bpm(&self) -> f64;

    fn seconds(&self, token: &DurationToken) -> f64 {
        token.to_seconds(self.bpm())
    }

    fn beat_seconds(&self, beat: Beat) -> f64 {
        beat.to_seconds(self.bpm())
    }
}

/// A fixed tempo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tempo {
    bpm: f64,
}

impl Tempo {
    /// Non-positive or non-finite values fall back to [`DEFAULT_BPM`].
    pub fn new(bpm: f64) -> Self {
        Self {
            bpm: sanitize(bpm),
        }
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self { bpm: DEFAULT_BPM }
    }
}

impl Clock for Tempo {
    fn bpm(&self) -> f64 {
        self.bpm
    }
}

/// Shared, mutable tempo. Clones observe the same value.
#[derive(Debug, Clone)]
pub struct SharedTempo {
    bits: Arc<AtomicU64>,
}

impl SharedTempo {
    pub fn new(bpm: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(sanitize(bpm).to_bits())),
        }
    }

    pub fn set_bpm(&self, bpm: f64) {
        self.bits.store(sanitize(bpm).to_bits(), Ordering::Release);
    }

    /// Freeze the current value, e.g. for the length of one render.
    pub fn snapshot(&self) -> Tempo {
        Tempo { bpm: self.bpm() }
    }
}

impl Default for SharedTempo {
    fn default() -> Self {
        Self::new(DEFAULT_BPM)
    }
}

impl Clock for SharedTempo {
    fn bpm(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn bpm(&self) -> f64 {
        (**self).bpm()
    }
}

fn sanitize(bpm: f64) -> f64 {
    if bpm.is_finite() && bpm > 0.0 {
        bpm
    } else {
        DEFAULT_BPM
    }
}

//! Waveforms for the built-in synth.

use std::f64::consts::TAU;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
    Saw,
    Square,
}

impl Waveform {
    /// Value at `phase` (one cycle per unit, wrapped), in `[-1, 1]`.
    pub fn at(self, phase: f64) -> f64 {
        let phase = phase.rem_euclid(1.0);
        match self {
            Waveform::Sine => (phase * TAU).sin(),
            Waveform::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
            Waveform::Saw => 2.0 * phase - 1.0,
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }
}

/// Phase accumulator running at a fixed frequency.
#[derive(Debug, Clone, Copy)]
pub struct Phasor {
    phase: f64,
    increment: f64,
}

impl Phasor {
    pub fn new(freq: f64, sample_rate: u32) -> Self {
        Self {
            phase: 0.0,
            increment: freq / f64::from(sample_rate),
        }
    }

    /// Current phase, then advance by one sample.
    #[inline]
    pub fn tick(&mut self) -> f64 {
        let current = self.phase;
        self.phase = (self.phase + self.increment).fract();
        current
    }
}

//! Polyphonic synth implementing [`Instrument`].

use std::f64::consts::TAU;

use tracing::debug;

use super::envelope::Envelope;
use super::oscillator::{Phasor, Waveform};
use super::Voice;
use crate::render::{Instrument, RenderContext, Trigger};
use crate::theory::pitch::{midi_to_freq, parse_note_name};

/// Per-note output gain, leaving headroom for stacked chord tones.
const VOICE_GAIN: f64 = 0.3;

/// FM carrier-to-modulator ratio and modulation index.
const FM_HARMONICITY: f64 = 3.0;
const FM_INDEX: f64 = 10.0;

/// Cutoff of the mono voice's one-pole low-pass, in Hz.
const MONO_CUTOFF: f64 = 1800.0;

/// Renders each trigger as an independent voice, so any number of notes
/// may overlap.
#[derive(Debug, Clone)]
pub struct PolySynth {
    voice: Voice,
    envelope: Envelope,
    disposed: bool,
}

impl PolySynth {
    pub fn new(voice: Voice) -> Self {
        Self {
            voice,
            envelope: voice.envelope(),
            disposed: false,
        }
    }

    pub fn voice(&self) -> Voice {
        self.voice
    }

    fn render_voice(
        &self,
        freq: f64,
        held: f64,
        velocity: f64,
        max_frames: Option<u64>,
        ctx: &RenderContext,
    ) -> Vec<f32> {
        let sr = f64::from(ctx.sample_rate);
        let mut frames = self.envelope.total_duration(held) * sr;
        if let Some(max) = max_frames {
            frames = frames.min(max as f64);
        }
        let frames = frames as usize;
        let channels = usize::from(ctx.channels);
        let mut out = Vec::with_capacity(frames * channels);

        let mut carrier = Phasor::new(freq, ctx.sample_rate);
        let mut modulator = Phasor::new(freq * FM_HARMONICITY, ctx.sample_rate);
        let lowpass = 1.0 - (-TAU * MONO_CUTOFF / sr).exp();
        let mut filtered = 0.0;

        for i in 0..frames {
            let t = i as f64 / sr;
            let raw = match self.voice {
                Voice::Synth => Waveform::Triangle.at(carrier.tick()),
                Voice::Fm => {
                    let m = Waveform::Sine.at(modulator.tick());
                    // Phase modulation; index scaled to cycles.
                    Waveform::Sine.at(carrier.tick() + m * FM_INDEX / TAU)
                }
                Voice::Mono => {
                    let x = Waveform::Square.at(carrier.tick());
                    filtered += lowpass * (x - filtered);
                    filtered
                }
            };
            let sample = (raw * self.envelope.amplitude(t, held) * velocity * VOICE_GAIN) as f32;
            out.extend(std::iter::repeat(sample).take(channels));
        }
        out
    }
}

impl Default for PolySynth {
    fn default() -> Self {
        Self::new(Voice::default())
    }
}

impl Instrument for PolySynth {
    fn name(&self) -> &str {
        self.voice.key()
    }

    fn is_ready(&self) -> bool {
        !self.disposed
    }

    fn trigger(&mut self, trigger: &Trigger, ctx: &RenderContext) -> Vec<f32> {
        if self.disposed || trigger.velocity <= 0.0 {
            return Vec::new();
        }
        let Some(note) = parse_note_name(&trigger.pitch) else {
            debug!(pitch = %trigger.pitch, "unplayable pitch skipped");
            return Vec::new();
        };
        let held = ctx.seconds(&trigger.duration);
        let velocity = f64::from(trigger.velocity.min(1.0));
        self.render_voice(midi_to_freq(note), held, velocity, trigger.max_frames, ctx)
    }

    fn dispose(&mut self) {
        self.disposed = true;
    }
}

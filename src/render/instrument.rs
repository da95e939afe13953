//! Instrument capability driven by the render pipeline.

use crate::theory::DurationToken;

/// Audio format and tempo an instrument renders against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderContext {
    pub sample_rate: u32,
    pub channels: u16,
    pub bpm: f64,
}

impl RenderContext {
    /// Seconds the given token lasts at this context's tempo.
    pub fn seconds(&self, token: &DurationToken) -> f64 {
        token.to_seconds(self.bpm)
    }
}

/// One pitch to sound. Chords are split into one trigger per pitch, all
/// sharing the same `time`.
#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    pub pitch: String,
    pub duration: DurationToken,
    /// Offset from capture start, in seconds.
    pub time: f64,
    pub velocity: f32,
    /// Most frames of output the caller keeps; `None` means unbounded.
    /// Instruments should stop rendering there.
    pub max_frames: Option<u64>,
}

/// A sound source the pipeline can play notes on.
///
/// `trigger` returns the note's interleaved samples starting at the trigger
/// time, including any release tail; the caller mixes overlapping notes.
/// An empty buffer means the note produced no sound.
pub trait Instrument: Send {
    fn name(&self) -> &str;

    /// Whether the instrument can currently produce sound.
    fn is_ready(&self) -> bool {
        true
    }

    fn trigger(&mut self, trigger: &Trigger, ctx: &RenderContext) -> Vec<f32>;

    /// Release any resources; the instrument is not used afterwards.
    fn dispose(&mut self) {}
}

impl<I: Instrument + ?Sized> Instrument for Box<I> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }

    fn trigger(&mut self, trigger: &Trigger, ctx: &RenderContext) -> Vec<f32> {
        (**self).trigger(trigger, ctx)
    }

    fn dispose(&mut self) {
        (**self).dispose()
    }
}

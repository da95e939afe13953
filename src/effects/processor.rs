//! Native offline processors behind the effect slots.
//!
//! Processors work in place on interleaved frames with per-channel state.
//! Output is blended with the dry signal by `wet`. Parameters are read on
//! every call, so an update applies from the next block on.

use std::f64::consts::PI;

use super::kind::EffectKind;
use super::params::{DelayParams, DistortionParams, EffectParams, ModulationParams, ReverbParams};

/// Fixed-length circular buffer of past samples.
#[derive(Debug, Clone)]
struct DelayLine {
    buf: Vec<f32>,
    pos: usize,
}

impl DelayLine {
    fn new(len: usize) -> Self {
        Self {
            buf: vec![0.0; len.max(2)],
            pos: 0,
        }
    }

    /// Sample written `delay` pushes ago (1 = most recent).
    fn tap(&self, delay: usize) -> f32 {
        let len = self.buf.len();
        let d = delay.clamp(1, len);
        self.buf[(self.pos + len - d) % len]
    }

    /// Linearly interpolated tap for fractional delays.
    fn tap_frac(&self, delay: f64) -> f32 {
        let max = (self.buf.len() - 1) as f64;
        let d = delay.clamp(1.0, max);
        let whole = d.floor();
        let frac = (d - whole) as f32;
        let a = self.tap(whole as usize);
        let b = self.tap(whole as usize + 1);
        a + (b - a) * frac
    }

    fn push(&mut self, sample: f32) {
        self.buf[self.pos] = sample;
        self.pos = (self.pos + 1) % self.buf.len();
    }

    fn len(&self) -> usize {
        self.buf.len()
    }

    fn clear(&mut self) {
        self.buf.fill(0.0);
        self.pos = 0;
    }
}

#[inline]
fn mix(dry: f32, processed: f32, wet: f64) -> f32 {
    let wet = wet as f32;
    dry * (1.0 - wet) + processed * wet
}

/// LFO phase offset per channel: odd channels run half a cycle behind.
#[inline]
fn spread(channel: usize) -> f64 {
    if channel % 2 == 1 {
        PI
    } else {
        0.0
    }
}

// Freeverb-style tunings at 44.1 kHz.
const COMB_TUNINGS: [usize; 4] = [1557, 1617, 1491, 1422];
const ALLPASS_TUNINGS: [usize; 2] = [556, 225];
const ALLPASS_FEEDBACK: f32 = 0.5;
const STEREO_SPREAD: usize = 23;
const MAX_PRE_DELAY_SECS: f64 = 0.1;

#[derive(Debug, Clone)]
struct ReverbChannel {
    pre_delay: DelayLine,
    combs: Vec<DelayLine>,
    allpasses: Vec<DelayLine>,
}

/// Schroeder reverb: four parallel feedback combs into two series all-passes,
/// with comb gains derived from the decay (RT60) time.
#[derive(Debug, Clone)]
pub struct Reverb {
    sample_rate: f64,
    channels: Vec<ReverbChannel>,
}

impl Reverb {
    pub fn new(sample_rate: u32, channels: usize) -> Self {
        let scale = sample_rate as f64 / 44100.0;
        let scaled = |n: usize, ch: usize| ((n + ch * STEREO_SPREAD) as f64 * scale) as usize;
        let channels = (0..channels)
            .map(|ch| ReverbChannel {
                pre_delay: DelayLine::new((MAX_PRE_DELAY_SECS * sample_rate as f64) as usize + 2),
                combs: COMB_TUNINGS
                    .iter()
                    .map(|&n| DelayLine::new(scaled(n, ch)))
                    .collect(),
                allpasses: ALLPASS_TUNINGS
                    .iter()
                    .map(|&n| DelayLine::new(scaled(n, ch)))
                    .collect(),
            })
            .collect();
        Self {
            sample_rate: sample_rate as f64,
            channels,
        }
    }

    fn comb_gain(&self, comb_len: usize, decay: f64) -> f32 {
        let loop_secs = comb_len as f64 / self.sample_rate;
        10f64.powf(-3.0 * loop_secs / decay) as f32
    }

    fn process(&mut self, params: &ReverbParams, samples: &mut [f32], channels: usize) {
        let pre_delay = (params.pre_delay * self.sample_rate).round() as usize;
        let gains: Vec<Vec<f32>> = self
            .channels
            .iter()
            .map(|st| {
                st.combs
                    .iter()
                    .map(|c| self.comb_gain(c.len(), params.decay))
                    .collect()
            })
            .collect();

        for frame in samples.chunks_mut(channels) {
            for (ch, sample) in frame.iter_mut().enumerate() {
                let Some(state) = self.channels.get_mut(ch) else {
                    continue;
                };
                let dry = *sample;
                let input = if pre_delay == 0 {
                    dry
                } else {
                    let delayed = state.pre_delay.tap(pre_delay);
                    state.pre_delay.push(dry);
                    delayed
                };

                let mut acc = 0.0;
                for (comb, &g) in state.combs.iter_mut().zip(&gains[ch]) {
                    let out = comb.tap(comb.len());
                    comb.push(input + out * g);
                    acc += out;
                }
                let mut out = acc / state.combs.len() as f32;

                for ap in state.allpasses.iter_mut() {
                    let buffered = ap.tap(ap.len());
                    ap.push(out + buffered * ALLPASS_FEEDBACK);
                    out = buffered - out;
                }

                *sample = mix(dry, out, params.wet);
            }
        }
    }

    fn reset(&mut self) {
        for st in &mut self.channels {
            st.pre_delay.clear();
            st.combs.iter_mut().for_each(DelayLine::clear);
            st.allpasses.iter_mut().for_each(DelayLine::clear);
        }
    }
}

const MAX_DELAY_SECS: f64 = 1.0;

/// Feedback delay (echo).
#[derive(Debug, Clone)]
pub struct FeedbackDelay {
    sample_rate: f64,
    lines: Vec<DelayLine>,
}

impl FeedbackDelay {
    pub fn new(sample_rate: u32, channels: usize) -> Self {
        let len = (MAX_DELAY_SECS * sample_rate as f64) as usize + 2;
        Self {
            sample_rate: sample_rate as f64,
            lines: (0..channels).map(|_| DelayLine::new(len)).collect(),
        }
    }

    fn process(&mut self, params: &DelayParams, samples: &mut [f32], channels: usize) {
        let delay = ((params.delay_time * self.sample_rate).round() as usize).max(1);
        let feedback = params.feedback as f32;
        for frame in samples.chunks_mut(channels) {
            for (ch, sample) in frame.iter_mut().enumerate() {
                let Some(line) = self.lines.get_mut(ch) else {
                    continue;
                };
                let dry = *sample;
                let echo = line.tap(delay);
                line.push(dry + echo * feedback);
                *sample = mix(dry, echo, params.wet);
            }
        }
    }

    fn reset(&mut self) {
        self.lines.iter_mut().for_each(DelayLine::clear);
    }
}

/// Waveshaping distortion; stateless.
#[derive(Debug, Clone, Default)]
pub struct Distortion;

impl Distortion {
    /// Waveshaper transfer curve for an amount in `[0, 1]`.
    pub fn shape(x: f32, amount: f64) -> f32 {
        let x = x as f64;
        if x.abs() < 0.001 {
            return 0.0;
        }
        let k = amount * 100.0;
        let deg = PI / 180.0;
        ((3.0 + k) * x * 20.0 * deg / (PI + k * x.abs())) as f32
    }

    fn process(&mut self, params: &DistortionParams, samples: &mut [f32]) {
        for sample in samples.iter_mut() {
            let dry = *sample;
            *sample = mix(dry, Self::shape(dry, params.distortion), params.wet);
        }
    }
}

const CHORUS_BASE_DELAY_SECS: f64 = 0.0035;
const CHORUS_MAX_DELAY_SECS: f64 = 0.02;

/// Chorus: a short delay line swept by a sine LFO.
#[derive(Debug, Clone)]
pub struct Chorus {
    sample_rate: f64,
    lines: Vec<DelayLine>,
    phase: f64,
}

impl Chorus {
    pub fn new(sample_rate: u32, channels: usize) -> Self {
        let len = (CHORUS_MAX_DELAY_SECS * sample_rate as f64) as usize + 2;
        Self {
            sample_rate: sample_rate as f64,
            lines: (0..channels).map(|_| DelayLine::new(len)).collect(),
            phase: 0.0,
        }
    }

    fn process(&mut self, params: &ModulationParams, samples: &mut [f32], channels: usize) {
        let step = 2.0 * PI * params.frequency / self.sample_rate;
        for frame in samples.chunks_mut(channels) {
            for (ch, sample) in frame.iter_mut().enumerate() {
                let Some(line) = self.lines.get_mut(ch) else {
                    continue;
                };
                let lfo = (self.phase + spread(ch)).sin();
                let delay_secs = CHORUS_BASE_DELAY_SECS * (1.0 + params.depth * lfo);
                let dry = *sample;
                line.push(dry);
                let swept = line.tap_frac(delay_secs * self.sample_rate);
                *sample = mix(dry, swept, params.wet);
            }
            self.phase = (self.phase + step) % (2.0 * PI);
        }
    }

    fn reset(&mut self) {
        self.lines.iter_mut().for_each(DelayLine::clear);
        self.phase = 0.0;
    }
}

/// Tremolo: amplitude modulation by a sine LFO.
#[derive(Debug, Clone)]
pub struct Tremolo {
    sample_rate: f64,
    phase: f64,
}

impl Tremolo {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate as f64,
            phase: 0.0,
        }
    }

    /// Gain at the given LFO phase; dips to `1 - depth` at the trough.
    pub fn gain(phase: f64, depth: f64) -> f32 {
        (1.0 - depth * (0.5 + 0.5 * phase.sin())) as f32
    }

    fn process(&mut self, params: &ModulationParams, samples: &mut [f32], channels: usize) {
        let step = 2.0 * PI * params.frequency / self.sample_rate;
        for frame in samples.chunks_mut(channels) {
            for (ch, sample) in frame.iter_mut().enumerate() {
                let dry = *sample;
                let gain = Self::gain(self.phase + spread(ch), params.depth);
                *sample = mix(dry, dry * gain, params.wet);
            }
            self.phase = (self.phase + step) % (2.0 * PI);
        }
    }

    fn reset(&mut self) {
        self.phase = 0.0;
    }
}

/// The signal-processing resource a slot owns.
#[derive(Debug, Clone)]
pub enum EffectProcessor {
    Reverb(Reverb),
    Delay(FeedbackDelay),
    Distortion(Distortion),
    Chorus(Chorus),
    Tremolo(Tremolo),
}

impl EffectProcessor {
    pub fn new(kind: EffectKind, sample_rate: u32, channels: usize) -> Self {
        match kind {
            EffectKind::Reverb => Self::Reverb(Reverb::new(sample_rate, channels)),
            EffectKind::Delay => Self::Delay(FeedbackDelay::new(sample_rate, channels)),
            EffectKind::Distortion => Self::Distortion(Distortion),
            EffectKind::Chorus => Self::Chorus(Chorus::new(sample_rate, channels)),
            EffectKind::Tremolo => Self::Tremolo(Tremolo::new(sample_rate)),
        }
    }

    /// Process interleaved `samples` in place. A parameter set of another
    /// kind leaves the buffer untouched.
    pub fn process(&mut self, params: &EffectParams, samples: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        match (self, params) {
            (Self::Reverb(fx), EffectParams::Reverb(p)) => fx.process(p, samples, channels),
            (Self::Delay(fx), EffectParams::Delay(p)) => fx.process(p, samples, channels),
            (Self::Distortion(fx), EffectParams::Distortion(p)) => fx.process(p, samples),
            (Self::Chorus(fx), EffectParams::Chorus(p)) => fx.process(p, samples, channels),
            (Self::Tremolo(fx), EffectParams::Tremolo(p)) => fx.process(p, samples, channels),
            _ => {}
        }
    }

    /// Clear all internal state (tails, LFO phase).
    pub fn reset(&mut self) {
        match self {
            Self::Reverb(fx) => fx.reset(),
            Self::Delay(fx) => fx.reset(),
            Self::Distortion(_) => {}
            Self::Chorus(fx) => fx.reset(),
            Self::Tremolo(fx) => fx.reset(),
        }
    }
}

//! Offline render timeline.
//!
//! Triggers are placed on a virtual frame clock up front, then the timeline
//! advances one block at a time, asking the instrument for every trigger
//! that starts inside the block. Note tails that run past the block end
//! are carried in an overlap buffer and mixed into the following blocks.
//! Nothing is rendered past the window end.

use super::instrument::{Instrument, RenderContext, Trigger};

#[derive(Debug, Clone)]
struct Scheduled {
    frame: u64,
    trigger: Trigger,
}

/// Virtual clock over a fixed window of frames.
#[derive(Debug)]
pub struct OfflineTimeline {
    ctx: RenderContext,
    block_frames: u64,
    total_frames: u64,
    position: u64,
    pending: Vec<Scheduled>,
    cursor: usize,
    sorted: bool,
    overlap: Vec<f32>,
}

impl OfflineTimeline {
    pub fn new(ctx: RenderContext, block_frames: u32, total_frames: u64) -> Self {
        Self {
            ctx,
            block_frames: u64::from(block_frames.max(1)),
            total_frames,
            position: 0,
            pending: Vec::new(),
            cursor: 0,
            sorted: true,
            overlap: Vec::new(),
        }
    }

    /// Frame a time offset lands on; negative offsets start at zero.
    pub fn frame_of(&self, seconds: f64) -> u64 {
        (seconds.max(0.0) * self.ctx.sample_rate as f64).round() as u64
    }

    /// Place a trigger on the timeline. Returns `false`, and drops the
    /// trigger, when it starts at or past the window end. The trigger's
    /// `max_frames` is capped at the frames left in the window.
    pub fn schedule(&mut self, mut trigger: Trigger) -> bool {
        let frame = self.frame_of(trigger.time);
        if frame >= self.total_frames {
            return false;
        }
        let left = self.total_frames - frame;
        trigger.max_frames = Some(trigger.max_frames.map_or(left, |max| max.min(left)));
        if self.pending.last().is_some_and(|last| last.frame > frame) {
            self.sorted = false;
        }
        self.pending.push(Scheduled { frame, trigger });
        true
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Frames rendered so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn is_finished(&self) -> bool {
        self.position >= self.total_frames
    }

    /// Triggers not yet handed to the instrument.
    pub fn remaining(&self) -> usize {
        self.pending.len() - self.cursor
    }

    /// Render the next block of interleaved samples, or `None` once the
    /// window is exhausted. The final block is shortened to the window end.
    pub fn render_block(&mut self, instrument: &mut dyn Instrument) -> Option<Vec<f32>> {
        if self.is_finished() {
            return None;
        }
        if !self.sorted {
            // Stable, so simultaneous triggers keep scheduling order.
            self.pending[self.cursor..].sort_by_key(|s| s.frame);
            self.sorted = true;
        }

        let channels = self.ctx.channels as usize;
        let from = self.position;
        let to = (from + self.block_frames).min(self.total_frames);
        let block_samples = (to - from) as usize * channels;
        let mut output = vec![0.0f32; block_samples];

        let carried = self.overlap.len().min(block_samples);
        for (out, &tail) in output.iter_mut().zip(&self.overlap[..carried]) {
            *out += tail;
        }
        self.overlap.drain(..carried);

        while let Some(next) = self.pending.get(self.cursor) {
            if next.frame >= to {
                break;
            }
            let offset = (next.frame - from) as usize * channels;
            let keep = (self.total_frames - next.frame) as usize * channels;
            let rendered = instrument.trigger(&next.trigger, &self.ctx);
            self.cursor += 1;

            for (i, sample) in rendered.into_iter().take(keep).enumerate() {
                let pos = offset + i;
                if pos < block_samples {
                    output[pos] += sample;
                } else {
                    let spill = pos - block_samples;
                    if spill >= self.overlap.len() {
                        self.overlap.resize(spill + 1, 0.0);
                    }
                    self.overlap[spill] += sample;
                }
            }
        }

        self.position = to;
        if self.is_finished() {
            self.overlap.clear();
        }
        Some(output)
    }
}

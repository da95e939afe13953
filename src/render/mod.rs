//! Offline render/export pipeline.
//!
//! Plays a generated sequence through an instrument on a virtual clock,
//! optionally through the effects chain, and captures a fixed window of
//! the result into an encoded artifact. No audio device is involved.

pub mod instrument;
pub mod limiter;
pub mod sink;
pub mod timeline;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::effects::EffectsManager;
use crate::error::{Error, Result};
use crate::sequence::{sequence_end, MusicEvent};
use crate::theory::Clock;

pub use instrument::{Instrument, RenderContext, Trigger};
pub use limiter::Limiter;
pub use sink::{CaptureFormat, CaptureSink, WavCaptureSink, WavEncoding};
pub use timeline::OfflineTimeline;

/// Suggested name of the exported file.
pub const DEFAULT_FILENAME: &str = "sequence.wav";

/// Capture window used when the caller does not pick one.
pub const DEFAULT_WINDOW_SECONDS: f64 = 10.0;

/// How long the capture runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderWindow {
    /// Capture exactly this many seconds. Triggers at or past the end are
    /// never issued and tails are cut.
    Fixed(f64),
    /// Capture until the last event ends, plus `tail_seconds` for release
    /// and effect tails.
    FitSequence { tail_seconds: f64 },
}

impl Default for RenderWindow {
    fn default() -> Self {
        RenderWindow::Fixed(DEFAULT_WINDOW_SECONDS)
    }
}

impl RenderWindow {
    /// Window length in seconds for `events`; must come out positive.
    pub fn seconds<C: Clock + ?Sized>(&self, events: &[MusicEvent], clock: &C) -> Result<f64> {
        let seconds = match *self {
            RenderWindow::Fixed(seconds) => seconds,
            RenderWindow::FitSequence { tail_seconds } => {
                sequence_end(events, clock) + tail_seconds.max(0.0)
            }
        };
        if seconds.is_finite() && seconds > 0.0 {
            Ok(seconds)
        } else {
            Err(Error::InvalidDuration(seconds))
        }
    }
}

/// Shared flag a caller sets to stop a render early.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything one render needs besides the sink and clock.
pub struct RenderRequest<'a> {
    pub events: &'a [MusicEvent],
    pub instrument: Option<&'a mut dyn Instrument>,
    pub window: RenderWindow,
    /// When set, audio runs through the manager's connected chain.
    pub effects: Option<&'a mut EffectsManager>,
    pub cancel: Option<CancelToken>,
}

impl<'a> RenderRequest<'a> {
    pub fn new(events: &'a [MusicEvent], instrument: &'a mut dyn Instrument) -> Self {
        Self {
            events,
            instrument: Some(instrument),
            window: RenderWindow::default(),
            effects: None,
            cancel: None,
        }
    }

    pub fn window(mut self, window: RenderWindow) -> Self {
        self.window = window;
        self
    }

    pub fn effects(mut self, effects: &'a mut EffectsManager) -> Self {
        self.effects = Some(effects);
        self
    }

    pub fn cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Output format of a render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub sample_rate: u32,
    pub channels: u16,
    /// Frames per processing block.
    pub block_size: u32,
    pub filename: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
            block_size: 1024,
            filename: DEFAULT_FILENAME.to_string(),
        }
    }
}

/// A finished capture. Owned by the caller; the pipeline keeps nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedArtifact {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub frames: u64,
    /// Pitches that started at or past the window end and were skipped.
    pub truncated_triggers: usize,
}

impl RenderedArtifact {
    pub fn duration_seconds(&self) -> f64 {
        self.frames as f64 / self.sample_rate as f64
    }
}

/// Drives offline renders with a fixed output format.
#[derive(Debug, Clone, Default)]
pub struct OfflineRenderer {
    config: RenderConfig,
    limiter: Limiter,
}

impl OfflineRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            limiter: Limiter::default(),
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render `request` into `sink`.
    ///
    /// Fails with [`Error::NoInstrument`] before the sink is touched when the
    /// instrument is missing or not ready. Once capture has been attempted,
    /// `sink.release()` always runs; a failed release is logged and never
    /// replaces the render's own result.
    pub fn render<C: Clock + ?Sized>(
        &self,
        request: RenderRequest<'_>,
        sink: &mut dyn CaptureSink,
        clock: &C,
    ) -> Result<RenderedArtifact> {
        let RenderRequest {
            events,
            instrument,
            window,
            mut effects,
            cancel,
        } = request;

        let instrument = match instrument {
            Some(inst) if inst.is_ready() => inst,
            _ => return Err(Error::NoInstrument),
        };
        let seconds = window.seconds(events, clock)?;
        if let Some(fx) = effects.as_deref_mut() {
            // Fails on a disposed or uninitialized manager.
            fx.reset()?;
            if fx.channels() != usize::from(self.config.channels) {
                warn!(
                    effects = fx.channels(),
                    render = self.config.channels,
                    "effects channel count differs from render format"
                );
            }
        }

        let ctx = RenderContext {
            sample_rate: self.config.sample_rate,
            channels: self.config.channels,
            bpm: clock.bpm(),
        };
        let total_frames = (seconds * f64::from(ctx.sample_rate)).round() as u64;
        let instrument_name = instrument.name().to_string();
        let mut timeline = OfflineTimeline::new(ctx, self.config.block_size, total_frames);

        let outcome = self.capture(
            events,
            instrument,
            &mut timeline,
            effects,
            cancel.as_ref(),
            sink,
        );

        if let Err(err) = sink.release() {
            warn!(error = %err, "capture sink release failed");
        }

        let (bytes, truncated_triggers) = outcome?;
        let artifact = RenderedArtifact {
            bytes,
            filename: self.config.filename.clone(),
            sample_rate: ctx.sample_rate,
            channels: ctx.channels,
            frames: total_frames,
            truncated_triggers,
        };
        info!(
            instrument = %instrument_name,
            seconds = artifact.duration_seconds(),
            bytes = artifact.bytes.len(),
            truncated = truncated_triggers,
            "render complete"
        );
        Ok(artifact)
    }

    fn capture(
        &self,
        events: &[MusicEvent],
        instrument: &mut dyn Instrument,
        timeline: &mut OfflineTimeline,
        mut effects: Option<&mut EffectsManager>,
        cancel: Option<&CancelToken>,
        sink: &mut dyn CaptureSink,
    ) -> Result<(Vec<u8>, usize)> {
        sink.start(CaptureFormat {
            sample_rate: self.config.sample_rate,
            channels: self.config.channels,
        })?;

        let mut truncated = 0;
        for event in events {
            for pitch in event.pitch.pitches() {
                let scheduled = timeline.schedule(Trigger {
                    pitch: pitch.clone(),
                    duration: event.duration.clone(),
                    time: event.time,
                    velocity: event.velocity,
                    max_frames: None,
                });
                if !scheduled {
                    truncated += 1;
                }
            }
        }
        if truncated > 0 {
            warn!(truncated, "triggers past the capture window were skipped");
        }
        debug!(
            scheduled = timeline.remaining(),
            frames = timeline.total_frames(),
            instrument = instrument.name(),
            "capture started"
        );

        let mut limited = 0;
        loop {
            if cancel.is_some_and(CancelToken::is_cancelled) {
                debug!(position = timeline.position(), "render cancelled");
                return Err(Error::Cancelled);
            }
            let Some(mut block) = timeline.render_block(instrument) else {
                break;
            };
            if let Some(fx) = effects.as_deref_mut() {
                fx.process(&mut block)?;
            }
            limited += self.limiter.process_block(&mut block);
            sink.write(&block)?;
        }
        if limited > 0 {
            debug!(limited, "limiter engaged");
        }

        let bytes = sink.stop()?;
        Ok((bytes, truncated))
    }
}

/// Render with the default output format.
pub fn render_sequence<C: Clock + ?Sized>(
    request: RenderRequest<'_>,
    sink: &mut dyn CaptureSink,
    clock: &C,
) -> Result<RenderedArtifact> {
    OfflineRenderer::default().render(request, sink, clock)
}

//! Offline render pipeline with recording test doubles and the real synth.

use std::io::Cursor;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use moodwave::effects::{EffectKind, EffectsManager, SourceId};
use moodwave::render::{
    render_sequence, CancelToken, CaptureFormat, CaptureSink, Instrument, OfflineRenderer,
    RenderConfig, RenderContext, RenderRequest, RenderWindow, Trigger, WavCaptureSink,
};
use moodwave::sequence::{MelodyGenerator, MusicEvent};
use moodwave::synth::{PolySynth, Voice};
use moodwave::theory::{DurationToken, Tempo};
use moodwave::{Error, Result};

/// Records every trigger and answers with a short click.
#[derive(Default)]
struct RecordingInstrument {
    triggers: Vec<Trigger>,
    broken: bool,
}

impl Instrument for RecordingInstrument {
    fn name(&self) -> &str {
        "recorder"
    }

    fn is_ready(&self) -> bool {
        !self.broken
    }

    fn trigger(&mut self, trigger: &Trigger, ctx: &RenderContext) -> Vec<f32> {
        self.triggers.push(trigger.clone());
        vec![trigger.velocity * 0.5; 8 * ctx.channels as usize]
    }
}

/// Wraps a WAV sink and tracks the calls made on it.
#[derive(Default)]
struct TrackingSink {
    inner: WavCaptureSink,
    started: bool,
    stopped: bool,
    releases: usize,
    frames_written: usize,
    fail_release: bool,
    fail_write: bool,
}

impl CaptureSink for TrackingSink {
    fn start(&mut self, format: CaptureFormat) -> Result<()> {
        self.started = true;
        self.inner.start(format)
    }

    fn write(&mut self, samples: &[f32]) -> Result<()> {
        if self.fail_write {
            return Err(Error::Capture("disk full".into()));
        }
        self.frames_written += samples.len() / 2;
        self.inner.write(samples)
    }

    fn stop(&mut self) -> Result<Vec<u8>> {
        self.stopped = true;
        self.inner.stop()
    }

    fn release(&mut self) -> Result<()> {
        self.releases += 1;
        self.inner.release()?;
        if self.fail_release {
            return Err(Error::Capture("already gone".into()));
        }
        Ok(())
    }
}

fn two_events() -> Vec<MusicEvent> {
    vec![
        MusicEvent::chord(
            vec!["C4".into(), "E4".into(), "G4".into()],
            DurationToken::half(),
            0.0,
            0.75,
        ),
        MusicEvent::note("D4", DurationToken::eighth(), 0.5, 0.6),
    ]
}

fn wav_frames(bytes: &[u8]) -> u32 {
    hound::WavReader::new(Cursor::new(bytes.to_vec()))
        .unwrap()
        .duration()
}

#[test]
fn chord_pitches_share_one_trigger_time() {
    let events = two_events();
    let mut inst = RecordingInstrument::default();
    let mut sink = TrackingSink::default();
    let request = RenderRequest::new(&events, &mut inst).window(RenderWindow::Fixed(1.0));
    render_sequence(request, &mut sink, &Tempo::default()).unwrap();

    let pitches: Vec<&str> = inst.triggers.iter().map(|t| t.pitch.as_str()).collect();
    assert_eq!(pitches, vec!["C4", "E4", "G4", "D4"]);
    assert!(inst.triggers[..3].iter().all(|t| t.time == 0.0));
    assert!(inst.triggers[..3].iter().all(|t| t.duration.as_str() == "2n"));
    assert_eq!(inst.triggers[3].time, 0.5);
    assert_eq!(inst.triggers[3].velocity, 0.6);
}

#[test]
fn tiny_window_still_produces_an_artifact() {
    let events = two_events();
    let mut inst = RecordingInstrument::default();
    let mut sink = TrackingSink::default();
    let request = RenderRequest::new(&events, &mut inst).window(RenderWindow::Fixed(0.01));
    let artifact = render_sequence(request, &mut sink, &Tempo::default()).unwrap();

    assert_eq!(artifact.filename, "sequence.wav");
    assert_eq!(artifact.frames, 441);
    assert_eq!(wav_frames(&artifact.bytes), 441);
    // Only the chord at 0.0 fits; the note at 0.5 s is skipped.
    assert_eq!(inst.triggers.len(), 3);
    assert_eq!(artifact.truncated_triggers, 1);
    assert_eq!(sink.releases, 1);
}

#[test]
fn fixed_window_ignores_sequence_length() {
    let events = two_events();
    let mut inst = RecordingInstrument::default();
    let mut sink = TrackingSink::default();
    let request = RenderRequest::new(&events, &mut inst).window(RenderWindow::Fixed(3.0));
    let artifact = render_sequence(request, &mut sink, &Tempo::default()).unwrap();
    assert_eq!(artifact.frames, 3 * 44100);
    assert_eq!(sink.frames_written, 3 * 44100);
}

#[test]
fn fit_window_tracks_the_last_note() {
    let events = two_events();
    let mut inst = RecordingInstrument::default();
    let mut sink = TrackingSink::default();
    let request = RenderRequest::new(&events, &mut inst).window(RenderWindow::FitSequence {
        tail_seconds: 0.5,
    });
    let artifact = render_sequence(request, &mut sink, &Tempo::new(120.0)).unwrap();
    // Chord ends at 1.0 s, the note at 0.75 s; plus half a second of tail.
    assert_eq!(artifact.frames, (1.5 * 44100.0) as u64);
    assert_eq!(artifact.truncated_triggers, 0);
}

#[test]
fn missing_instrument_fails_before_capture() {
    let events = two_events();
    let mut sink = TrackingSink::default();
    let request = RenderRequest {
        events: &events,
        instrument: None,
        window: RenderWindow::Fixed(1.0),
        effects: None,
        cancel: None,
    };
    let err = render_sequence(request, &mut sink, &Tempo::default()).unwrap_err();
    assert!(matches!(err, Error::NoInstrument));
    assert!(!sink.started);
    assert_eq!(sink.releases, 0);
}

#[test]
fn unready_instrument_counts_as_missing() {
    let events = two_events();
    let mut inst = RecordingInstrument {
        broken: true,
        ..Default::default()
    };
    let mut sink = TrackingSink::default();
    let request = RenderRequest::new(&events, &mut inst);
    let err = render_sequence(request, &mut sink, &Tempo::default()).unwrap_err();
    assert!(matches!(err, Error::NoInstrument));
    assert!(!sink.started);
}

#[test]
fn invalid_window_is_rejected() {
    let events = two_events();
    for seconds in [0.0, -1.0, f64::NAN] {
        let mut inst = RecordingInstrument::default();
        let mut sink = TrackingSink::default();
        let request = RenderRequest::new(&events, &mut inst).window(RenderWindow::Fixed(seconds));
        let err = render_sequence(request, &mut sink, &Tempo::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidDuration(_)));
    }
}

#[test]
fn failed_write_still_releases() {
    let events = two_events();
    let mut inst = RecordingInstrument::default();
    let mut sink = TrackingSink {
        fail_write: true,
        ..Default::default()
    };
    let request = RenderRequest::new(&events, &mut inst).window(RenderWindow::Fixed(1.0));
    let err = render_sequence(request, &mut sink, &Tempo::default()).unwrap_err();
    assert!(matches!(err, Error::Capture(_)));
    assert!(!sink.stopped);
    assert_eq!(sink.releases, 1);
}

#[test]
fn failed_release_does_not_mask_success() {
    let events = two_events();
    let mut inst = RecordingInstrument::default();
    let mut sink = TrackingSink {
        fail_release: true,
        ..Default::default()
    };
    let request = RenderRequest::new(&events, &mut inst).window(RenderWindow::Fixed(0.5));
    assert!(render_sequence(request, &mut sink, &Tempo::default()).is_ok());
    assert_eq!(sink.releases, 1);
}

#[test]
fn cancelled_render_cleans_up() {
    let events = two_events();
    let mut inst = RecordingInstrument::default();
    let mut sink = TrackingSink::default();
    let token = CancelToken::new();
    token.cancel();
    let request = RenderRequest::new(&events, &mut inst)
        .window(RenderWindow::Fixed(5.0))
        .cancel(token);
    let err = render_sequence(request, &mut sink, &Tempo::default()).unwrap_err();
    assert!(matches!(err, Error::Cancelled));
    assert!(sink.started);
    assert!(!sink.stopped);
    assert_eq!(sink.releases, 1);
}

#[test]
fn disposed_effects_manager_is_an_error() {
    let events = two_events();
    let mut inst = RecordingInstrument::default();
    let mut sink = TrackingSink::default();
    let mut fx = EffectsManager::default();
    fx.initialize().unwrap();
    fx.dispose();
    let request = RenderRequest::new(&events, &mut inst).effects(&mut fx);
    let err = render_sequence(request, &mut sink, &Tempo::default()).unwrap_err();
    assert!(matches!(err, Error::DisposedManager));
    assert!(!sink.started);
}

#[test]
fn generated_melody_renders_through_effects() {
    let tempo = Tempo::new(120.0);
    let generator = MelodyGenerator::new("happy").unwrap();
    let events = generator
        .generate_melody(&mut ChaCha8Rng::seed_from_u64(21), &tempo)
        .unwrap();

    let mut fx = EffectsManager::new(22050, 1);
    fx.initialize().unwrap();
    fx.connect_source(SourceId(0), &[EffectKind::Delay, EffectKind::Reverb])
        .unwrap();

    let renderer = OfflineRenderer::new(RenderConfig {
        sample_rate: 22050,
        channels: 1,
        block_size: 512,
        filename: "happy.wav".into(),
    });
    let mut synth = PolySynth::new(Voice::Synth);
    let mut sink = WavCaptureSink::default();
    let request = RenderRequest::new(&events, &mut synth)
        .window(RenderWindow::Fixed(2.0))
        .effects(&mut fx);
    let artifact = renderer.render(request, &mut sink, &tempo).unwrap();

    assert_eq!(artifact.filename, "happy.wav");
    assert!(sink.is_released());
    let mut reader = hound::WavReader::new(Cursor::new(artifact.bytes)).unwrap();
    assert_eq!(reader.spec().channels, 1);
    assert_eq!(reader.duration(), 44100);
    let peak = reader
        .samples::<i16>()
        .map(|s| s.unwrap().unsigned_abs())
        .max()
        .unwrap();
    assert!(peak > 1000, "render is silent");
    assert!(f32::from(peak) <= 0.95 * i16::MAX as f32 + 1.0);
    // Happy melodies last four seconds, so the second half is cut.
    assert!(artifact.truncated_triggers > 0);
}

#[test]
fn very_long_note_renders_only_the_window() {
    let events = vec![MusicEvent::note(
        "C4",
        "100000m".parse().unwrap(),
        0.0,
        0.9,
    )];
    let mut synth = PolySynth::new(Voice::Mono);
    let mut sink = WavCaptureSink::default();
    let request = RenderRequest::new(&events, &mut synth).window(RenderWindow::Fixed(0.01));
    let artifact = render_sequence(request, &mut sink, &Tempo::new(120.0)).unwrap();
    assert_eq!(artifact.frames, 441);
    assert_eq!(wav_frames(&artifact.bytes), 441);
    assert_eq!(artifact.truncated_triggers, 0);
}

#[test]
fn triggers_carry_the_frames_left_in_the_window() {
    let events = two_events();
    let mut inst = RecordingInstrument::default();
    let mut sink = TrackingSink::default();
    let request = RenderRequest::new(&events, &mut inst).window(RenderWindow::Fixed(1.0));
    render_sequence(request, &mut sink, &Tempo::default()).unwrap();
    assert_eq!(inst.triggers[0].max_frames, Some(44100));
    assert_eq!(inst.triggers[3].max_frames, Some(44100 - 22050));
}

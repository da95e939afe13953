//! moodwave: generate a melody for a mood and export it as a WAV file.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;

use moodwave::config::Config;
use moodwave::effects::{EffectKind, EffectsManager, SourceId};
use moodwave::preset::{Composition, EffectPreset};
use moodwave::render::{
    CancelToken, Instrument, OfflineRenderer, RenderRequest, RenderWindow, WavCaptureSink,
};
use moodwave::sequence::{loop_sequence, MelodyGenerator};
use moodwave::synth::{PolySynth, Voice};
use moodwave::theory::{Clock, DurationToken, Mood, Tempo};
use moodwave::{Error, Result};

/// Length of one loop pass when `--loops` is above one.
const LOOP_LENGTH: &str = "2m";

#[derive(Debug, Parser)]
#[command(name = "moodwave", version, about)]
struct Cli {
    /// Mood preset: happy, sad, energetic, calm or mysterious
    #[arg(short, long, default_value = "happy")]
    mood: String,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Tempo in beats per minute
    #[arg(long)]
    bpm: Option<f64>,

    /// Draw the tempo from the mood's range
    #[arg(long, conflicts_with = "bpm")]
    mood_tempo: bool,

    #[arg(long)]
    octave: Option<i32>,

    /// Root note, e.g. C, F#, Bb
    #[arg(long)]
    root: Option<String>,

    /// Effect chain in routing order, comma separated (e.g. delay,reverb)
    #[arg(short, long, value_delimiter = ',')]
    effects: Option<Vec<String>>,

    /// Effect parameter override, repeatable
    #[arg(long = "param", value_name = "EFFECT.NAME=VALUE")]
    params: Vec<String>,

    /// Effect preset JSON to load before applying --effects/--param
    #[arg(long)]
    preset: Option<PathBuf>,

    /// Instrument voice: synth, fm or mono
    #[arg(short, long)]
    instrument: Option<String>,

    /// Capture window in seconds
    #[arg(short, long)]
    duration: Option<f64>,

    /// Size the capture to the sequence instead of a fixed window
    #[arg(long, conflicts_with = "duration")]
    fit: bool,

    /// Extra seconds captured after the last note with --fit
    #[arg(long, default_value_t = 2.0)]
    tail: f64,

    /// Apply one round of random variation to the generated melody
    #[arg(long)]
    variation: bool,

    /// Number of two-bar loop passes to render
    #[arg(long, default_value_t = 1)]
    loops: usize,

    /// Output WAV path
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Also save the composition as JSON
    #[arg(long)]
    save: Option<PathBuf>,

    /// Config file (defaults to ~/.moodwave/config.yaml)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("moodwave=info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(Error::Cancelled) => {
            warn!("export cancelled");
            ExitCode::from(130)
        }
        Err(err) => {
            eprintln!("moodwave: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Split `reverb.decay=3.5` into its parts.
fn parse_param(spec: &str) -> Result<(EffectKind, String, f64)> {
    let invalid = || Error::InvalidParam(spec.to_string());
    let (target, value) = spec.split_once('=').ok_or_else(invalid)?;
    let (effect, name) = target.split_once('.').ok_or_else(invalid)?;
    let value: f64 = value.trim().parse().map_err(|_| invalid())?;
    Ok((effect.trim().parse()?, name.trim().to_string(), value))
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let mut rng = match cli.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };

    let mood: Mood = cli.mood.parse()?;
    let bpm = match cli.bpm {
        Some(bpm) => bpm,
        None if cli.mood_tempo => mood.suggested_tempo(&mut rng),
        None => config.bpm,
    };
    let tempo = Tempo::new(bpm);

    let octave = cli.octave.unwrap_or(config.octave);
    let root = cli.root.as_deref().unwrap_or(&config.root);
    let generator = MelodyGenerator::with_options(mood, octave, root)?;

    let mut events = generator.generate_melody(&mut rng, &tempo)?;
    if cli.variation {
        events = generator.add_variation(&events, &mut rng);
    }
    if cli.loops > 1 {
        let loop_end = tempo.seconds(&LOOP_LENGTH.parse::<DurationToken>()?);
        events = loop_sequence(&events, loop_end, cli.loops);
    }
    info!(%mood, bpm = tempo.bpm(), events = events.len(), "melody ready");

    let voice: Voice = cli.instrument.as_deref().unwrap_or(&config.instrument).parse()?;

    if let Some(path) = &cli.save {
        Composition::new(mood.label(), mood, tempo.bpm(), voice.key(), &events).save(path)?;
        info!(path = %path.display(), "composition saved");
    }

    let mut effects = EffectsManager::new(config.sample_rate, usize::from(config.channels));
    effects.initialize()?;
    if let Some(path) = &cli.preset {
        EffectPreset::from_json(&std::fs::read_to_string(path)?)?.apply_to(&mut effects)?;
    }
    for spec in &cli.params {
        let (kind, name, value) = parse_param(spec)?;
        effects.update_effect(kind, [(name, value)])?;
    }
    let chain = match (&cli.effects, &cli.preset) {
        (Some(keys), _) => EffectKind::parse_list(keys)?,
        (None, Some(_)) => effects.chain()?.nodes().to_vec(),
        (None, None) => EffectKind::parse_list(&config.effects)?,
    };
    let chain = effects.connect_source(SourceId(0), &chain)?;
    info!(%chain, "signal chain");

    let window = if cli.fit {
        RenderWindow::FitSequence {
            tail_seconds: cli.tail,
        }
    } else {
        RenderWindow::Fixed(cli.duration.unwrap_or(config.export_seconds))
    };

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    if let Err(err) = ctrlc::set_handler(move || handler_token.cancel()) {
        warn!(error = %err, "could not install Ctrl-C handler");
    }

    let mut synth = PolySynth::new(voice);
    let renderer = OfflineRenderer::new(config.render_config());
    let mut sink = WavCaptureSink::default();
    let request = RenderRequest::new(&events, &mut synth)
        .window(window)
        .effects(&mut effects)
        .cancel(cancel);
    let result = renderer.render(request, &mut sink, &tempo);

    synth.dispose();
    effects.dispose();
    let artifact = result?;

    let out = cli
        .out
        .unwrap_or_else(|| PathBuf::from(&artifact.filename));
    std::fs::write(&out, &artifact.bytes)?;
    info!(
        path = %out.display(),
        seconds = artifact.duration_seconds(),
        skipped_notes = artifact.truncated_triggers,
        "exported"
    );
    Ok(())
}

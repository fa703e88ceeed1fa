use std::{path::PathBuf, process::ExitCode, sync::Arc, time::Instant};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use wavesynth_core::{
    instrument::BackendKind,
    sample::{load_sample_file, SampleOptions},
    ChannelCount,
};
use wavesynth_render::{
    demo::{backend_name, demo_instrument, demo_phrase, pluck_sample},
    utils::{audio_channels_parser, backends_parser},
    wavesynth_renderer, RenderError,
};

/// Renders a demo phrase with each instrument backend into WAV files.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Directory the WAV files are written to
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// subtractive, wavetable, chip, sampler or all
    #[arg(short, long, default_value = "all")]
    backend: String,

    #[arg(short, long, default_value_t = 48000)]
    sample_rate: u32,

    /// mono or stereo
    #[arg(short, long, default_value = "stereo", value_parser = audio_channels_parser)]
    audio_channels: ChannelCount,

    /// Voices per channel
    #[arg(short, long, default_value_t = 16)]
    voices: usize,

    /// Cut stolen voices instead of fading them out
    #[arg(long)]
    hard_cut: bool,

    /// Longest release tail after the phrase, in seconds
    #[arg(long, default_value_t = 10.0)]
    tail_limit: f64,

    /// Audio file for the sampler. A generated looping tone is used if
    /// not set.
    #[arg(long)]
    sample: Option<PathBuf>,
}

fn run(args: Args, backends: Vec<BackendKind>) -> Result<(), RenderError> {
    let sample = match &args.sample {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading sample");
            let sample = load_sample_file(path, SampleOptions::default())?;
            Arc::new(sample)
        }
        None => Arc::new(pluck_sample(args.sample_rate)?),
    };

    for kind in backends {
        let name = backend_name(kind);
        let path = args.out_dir.join(format!("{name}.wav"));
        let now = Instant::now();

        let summary = wavesynth_renderer(&path)
            .with_sample_rate(args.sample_rate)
            .with_audio_channels(args.audio_channels)
            .with_voice_count(args.voices)
            .with_fade_out_killing(!args.hard_cut)
            .with_tail_limit(args.tail_limit)
            .add_instrument(demo_instrument(kind, sample.clone()))
            .with_progress_callback(|stats| {
                tracing::trace!(
                    progress = stats.progress,
                    voices = stats.voice_count,
                    "render progress"
                )
            })
            .run(demo_phrase(0))?;

        tracing::info!(
            backend = name,
            path = %path.display(),
            seconds = summary.seconds,
            elapsed = ?now.elapsed(),
            "rendered"
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let backends = match backends_parser(&args.backend) {
        Ok(backends) => backends,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match run(args, backends) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::PathBuf,
};

use clap::Parser;
use playback::{
    gpx_export::write_track_as_gpx, load_track, PlaybackConfig, PlaybackSample, PlaybackSession,
};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Replay a recorded track frame by frame and print one JSON sample per frame"
)]
struct Args {
    /// Track file: JSON point features, JSON line geometry, or GPX
    #[arg(long)]
    track: PathBuf,

    /// Simulated frames per second
    #[arg(long, default_value_t = 30.0)]
    fps: f64,

    /// Playback rate multiplier, clamped to [0.5, 3.0]
    #[arg(long)]
    rate: Option<f64>,

    /// Maximum gap between points when densifying a bare line
    #[arg(long)]
    step_meters: Option<f64>,

    /// Track points traversed per second at rate 1.0
    #[arg(long)]
    base_points_per_second: Option<f64>,

    /// Start position as a fraction of the track
    #[arg(long, default_value_t = 0.0)]
    seek: f64,

    /// Also write the normalized track geometry to this GPX file
    #[arg(long)]
    gpx_out: Option<PathBuf>,
}

impl Args {
    fn config(&self) -> Result<PlaybackConfig, playback::ConfigError> {
        let mut config = PlaybackConfig::from_env()?;
        if let Some(step) = self.step_meters {
            config.step_meters = step;
        }
        if let Some(pace) = self.base_points_per_second {
            config.base_points_per_second = pace;
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Serialize)]
struct FrameRecord<'a> {
    frame: usize,
    progress: f64,
    #[serde(flatten)]
    sample: &'a PlaybackSample,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();
    if !(args.fps.is_finite() && args.fps > 0.0) {
        return Err(format!("--fps must be a positive number, got {}", args.fps).into());
    }

    let config = args.config()?;
    tracing::info!("replaying {:?} with {:?}", args.track, config);

    let raw = load_track(&args.track)?;
    let mut session = PlaybackSession::new(config);
    let summary = session.load_raw(raw)?.clone();
    tracing::info!("route summary: {summary}");

    if let (Some(path), Some(engine)) = (&args.gpx_out, session.engine()) {
        let name = args
            .track
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("track");
        write_track_as_gpx(engine.points(), name, BufWriter::new(File::create(path)?))?;
        tracing::info!("normalized track written to {:?}", path);
    }

    if let Some(rate) = args.rate {
        session.set_rate(rate);
    }
    session.seek(args.seek);
    session.play();

    let frame_seconds = 1.0 / args.fps;
    let mut out = BufWriter::new(io::stdout().lock());
    let mut frames = 0;
    while let Some(sample) = session.advance(frame_seconds) {
        let record = FrameRecord {
            frame: frames,
            progress: session.progress(),
            sample: &sample,
        };
        serde_json::to_writer(&mut out, &record)?;
        writeln!(out)?;
        frames += 1;

        if !session.engine().is_some_and(|engine| engine.is_playing()) {
            break;
        }
    }
    out.flush()?;

    tracing::info!("replayed {frames} frames");
    Ok(())
}

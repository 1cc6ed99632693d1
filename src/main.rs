use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use quote_reel::{
    composition::OverlayOrchestrator,
    config::Config,
    video::AudioSelection,
};

#[derive(Parser)]
#[command(
    name = "quote-reel",
    version,
    about = "Lay a transparent quote image over a background video",
    long_about = "Quote-Reel extracts every frame of a background video, turns it into a blurred grayscale backdrop sized to the overlay image, composites the overlay on top and encodes the result with fades and an optional audio track."
)]
struct Cli {
    /// Background video file
    #[arg(short = 'i', long)]
    video: PathBuf,

    /// Overlay image with an alpha channel (PNG)
    #[arg(short = 'q', long)]
    overlay: PathBuf,

    /// Output video file path
    #[arg(short, long)]
    output: PathBuf,

    /// Audio track to mux into the output (MP3, WAV, AAC)
    #[arg(short, long)]
    audio: Option<PathBuf>,

    /// Start of the audio section in seconds
    #[arg(long, requires_all = ["audio", "audio_end"])]
    audio_start: Option<f64>,

    /// End of the audio section in seconds
    #[arg(long, requires_all = ["audio", "audio_start"])]
    audio_end: Option<f64>,

    /// Frame rate used for both extraction and encoding
    #[arg(long)]
    fps: Option<u32>,

    /// Fade-in duration in seconds (0 disables)
    #[arg(long)]
    fade_in: Option<f64>,

    /// Fade-out duration in seconds (0 disables)
    #[arg(long)]
    fade_out: Option<f64>,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Temporary working directory, removed when the run ends
    #[arg(long)]
    workdir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn audio_selection(&self) -> Result<Option<AudioSelection>> {
        let Some(path) = &self.audio else {
            return Ok(None);
        };

        match (self.audio_start, self.audio_end) {
            (Some(start), Some(end)) => {
                if start < 0.0 || end <= start {
                    bail!("Invalid audio section {}..{}: end must be after a non-negative start", start, end);
                }
                Ok(Some(AudioSelection::section(path, start, end)))
            }
            _ => Ok(Some(AudioSelection::whole(path))),
        }
    }

    fn apply_overrides(&self, config: &mut Config) {
        if let Some(fps) = self.fps {
            config.assembler.fps = fps;
        }
        if let Some(fade_in) = self.fade_in {
            config.assembler.fade_in = fade_in;
        }
        if let Some(fade_out) = self.fade_out {
            config.assembler.fade_out = fade_out;
        }
        if let Some(workdir) = &self.workdir {
            config.workspace.root = workdir.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    info!("Starting Quote-Reel v{}", env!("CARGO_PKG_VERSION"));
    info!("Video: {:?}", cli.video);
    info!("Overlay: {:?}", cli.overlay);
    info!("Output: {:?}", cli.output);

    // Load configuration
    let mut config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)?
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    };
    cli.apply_overrides(&mut config);
    config.validate()?;

    let audio = cli.audio_selection()?;
    if let Some(audio) = &audio {
        info!("Audio: {:?} ({:?})", audio.path, audio.section);
    }
    let spec = config.video_spec(audio);

    let progress = ProgressBar::new(0);
    let style = ProgressStyle::with_template(
        "{spinner:.green} {bar:40.cyan/blue} {pos}/{len} frames {msg}",
    )?;
    progress.set_style(style.progress_chars("##-"));

    let orchestrator = OverlayOrchestrator::new(config);
    let video = orchestrator
        .run_async(cli.video.clone(), cli.overlay.clone(), cli.output.clone(), spec, progress)
        .await?;

    info!(
        "Reel complete! {} frames, {:.2}s, {} bytes saved to: {:?}",
        video.frame_count, video.duration, video.file_size, video.path
    );
    Ok(())
}

//! Hand sign guide: live distance guidance, sign classification and data collection.

use anyhow::{Context, Result};
use clap::Parser;
use hand_sign_guide::{
    app::{AppConfig, HandSignApp, VideoSource},
    config::Config,
    pipeline::Mode,
};
use log::{info, warn};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Camera index to use
    #[arg(long, default_value = "0", conflicts_with = "video")]
    cam: i32,

    /// Video file to process instead of a camera
    #[arg(short, long)]
    video: Option<String>,

    /// Pipeline mode (collect, classify)
    #[arg(short, long, default_value = "classify")]
    mode: String,

    /// Directory for captured frames (collect mode)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Glyph file with one `<index> <glyph>` pair per line (built-in Kannada glyphs otherwise)
    #[arg(short, long)]
    labels: Option<PathBuf>,

    /// Font file able to render the label glyphs
    #[arg(long)]
    font: Option<PathBuf>,

    /// Mirror the camera image horizontally
    #[arg(long)]
    mirror: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    info!("Hand Sign Guide");

    let mode: Mode = args.mode.parse()?;

    let mut settings = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path);
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("Failed to load config file: {}. Using defaults.", e);
                Config::default()
            }
        }
    } else {
        Config::default()
    };

    if let Some(dir) = args.output_dir {
        settings.capture.directory = dir;
    }
    if let Some(labels) = args.labels {
        settings.models.labels = Some(labels);
    }
    if let Some(font) = args.font {
        settings.display.font_path = Some(font);
    }
    settings.display.mirror |= args.mirror;

    settings.validate(mode).context("Invalid configuration")?;

    let config = AppConfig {
        video_source: if let Some(video_path) = args.video {
            VideoSource::File(video_path)
        } else {
            VideoSource::Camera(args.cam)
        },
        mode,
        settings,
    };

    let mut app = HandSignApp::new(config).context("Failed to start")?;
    app.run()?;

    Ok(())
}

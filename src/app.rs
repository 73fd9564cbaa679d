//! Main application module: owns the video source and preview window and
//! drives the pipeline once per frame.

use crate::{
    capture::DiskCaptureSink,
    classifier::OnnxSymbolClassifier,
    config::Config,
    constants::{READ_FAILURE_LOG_INTERVAL, READ_RETRY_DELAY_MS},
    error::{Error, Result},
    hand_detection::OnnxHandDetector,
    labels::LabelMap,
    overlay::OverlayRenderer,
    pipeline::{Command, LoopControl, Mode, Pipeline, PipelineMode},
};
use log::{debug, info, warn};
use opencv::{
    core::Mat,
    highgui::{self, WINDOW_AUTOSIZE},
    prelude::*,
    videoio::{self, VideoCapture, CAP_PROP_BUFFERSIZE},
};
use std::time::Instant;

/// Video source type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoSource {
    /// Webcam index
    Camera(i32),
    /// Video file path
    File(String),
}

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Camera index or video file path
    pub video_source: VideoSource,
    /// Collection or classification
    pub mode: Mode,
    /// File-backed settings, already merged with command line overrides
    pub settings: Config,
}

impl AppConfig {
    /// Title of the preview window for the configured mode
    #[must_use]
    pub fn window_name(&self) -> &'static str {
        match self.mode {
            Mode::Collect => "Live Feed",
            Mode::Classify => "Live Prediction",
        }
    }
}

/// Run length of consecutive failed frame reads
#[derive(Debug, Default)]
struct ReadFailures {
    consecutive: u64,
}

impl ReadFailures {
    /// Count a failed read. Returns `true` when it should be reported at warn
    /// level: the first failure of a run, then once per log interval.
    fn record(&mut self) -> bool {
        self.consecutive += 1;
        self.consecutive == 1 || self.consecutive % READ_FAILURE_LOG_INTERVAL == 0
    }

    /// End the current run, returning how many reads had failed in a row
    fn reset(&mut self) -> u64 {
        std::mem::take(&mut self.consecutive)
    }
}

/// Main application struct.
///
/// The camera and window are released in `Drop`, so every exit path out of
/// [`HandSignApp::run`] (quit, error or panic) frees them.
pub struct HandSignApp {
    config: AppConfig,
    pipeline: Pipeline,
    video_capture: VideoCapture,
    window_open: bool,
    read_failures: ReadFailures,
}

impl HandSignApp {
    /// Load models, open the video source and create the preview window
    ///
    /// # Errors
    ///
    /// Returns an error if a required model cannot be loaded or the video
    /// source cannot be opened. Both are fatal before the loop starts.
    pub fn new(config: AppConfig) -> Result<Self> {
        info!("Initializing hand sign guide in {} mode", config.mode);
        let settings = &config.settings;

        let detector = OnnxHandDetector::new(
            &settings.models.hand_landmarks,
            settings.detection.presence_threshold,
        )?;

        let mode = match config.mode {
            Mode::Collect => PipelineMode::Collect(Box::new(DiskCaptureSink::new(
                &settings.capture.directory,
                &settings.capture.extension,
            )?)),
            Mode::Classify => {
                let labels = match &settings.models.labels {
                    Some(path) => LabelMap::from_file(path)?,
                    None => {
                        info!("No labels file configured, using built-in label map");
                        LabelMap::default()
                    }
                };
                PipelineMode::Classify {
                    classifier: Box::new(OnnxSymbolClassifier::new(&settings.models.classifier)?),
                    labels,
                }
            }
        };

        let renderer = OverlayRenderer::new(
            settings.display.font_path.as_deref(),
            settings.display.font_size,
            settings.crop.margin,
        );
        let pipeline = Pipeline::new(Box::new(detector), mode, renderer, settings.pipeline_settings()?);

        let video_capture = open_video_source(&config.video_source)?;

        highgui::named_window(config.window_name(), WINDOW_AUTOSIZE)?;

        Ok(Self {
            config,
            pipeline,
            video_capture,
            window_open: true,
            read_failures: ReadFailures::default(),
        })
    }

    /// Frames saved so far in this session
    #[must_use]
    pub fn captures(&self) -> u64 {
        self.pipeline.counters().captures()
    }

    /// Run the main application loop until the user quits or a video file ends
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or displaying a frame fails
    pub fn run(&mut self) -> Result<()> {
        info!("Starting main loop. Keys: 's' save (collect mode), 'q' / Esc quit");
        let window = self.config.window_name();
        let mut frame_count: u64 = 0;
        let start_time = Instant::now();

        loop {
            let Some(frame) = self.acquire_frame()? else {
                if matches!(self.config.video_source, VideoSource::File(_)) {
                    info!("End of video file reached");
                    break;
                }
                // Pace retries and keep the quit key responsive while the camera is down
                let key = highgui::wait_key(READ_RETRY_DELAY_MS)?;
                if Command::from_key(key) == Some(Command::Quit) {
                    info!("Exit requested by user");
                    break;
                }
                continue;
            };

            let outcome = self.pipeline.process_frame(&frame)?;
            if let Some(hand) = &outcome.hand {
                debug!(
                    "Frame {frame_count}: distance {:?} cm, guidance {:?}, symbol {:?}",
                    hand.distance_cm,
                    hand.guidance,
                    hand.symbol.as_ref().map(|s| s.glyph.as_str())
                );
            }

            highgui::imshow(window, &outcome.output)?;
            frame_count += 1;

            let key = highgui::wait_key(1)?;
            if let Some(command) = Command::from_key(key) {
                if self.pipeline.handle_command(command, &frame) == LoopControl::Stop {
                    break;
                }
            }
        }

        let elapsed = start_time.elapsed().as_secs_f64();
        #[allow(clippy::cast_precision_loss)]
        let fps = if elapsed > 0.0 { frame_count as f64 / elapsed } else { 0.0 };
        info!(
            "Processed {frame_count} frames ({fps:.1} FPS), saved {} captures",
            self.captures()
        );
        Ok(())
    }

    /// Read the next frame. Camera read failures are transient and yield `None`.
    fn acquire_frame(&mut self) -> Result<Option<Mat>> {
        let mut frame = Mat::default();
        match self.video_capture.read(&mut frame) {
            Ok(true) if !frame.empty() => {
                let failed = self.read_failures.reset();
                if failed > 0 {
                    info!("Frame acquisition recovered after {failed} failed reads");
                }
            }
            Ok(_) => {
                if matches!(self.config.video_source, VideoSource::Camera(_)) {
                    self.report_read_failure("no frame");
                }
                return Ok(None);
            }
            Err(e) => {
                self.report_read_failure(&e.to_string());
                return Ok(None);
            }
        }

        if self.config.settings.display.mirror {
            let mut mirrored = Mat::default();
            opencv::core::flip(&frame, &mut mirrored, 1)?;
            frame = mirrored;
        }
        Ok(Some(frame))
    }

    fn report_read_failure(&mut self, reason: &str) {
        if self.read_failures.record() {
            warn!(
                "Failed to read frame ({reason}), {} in a row, retrying...",
                self.read_failures.consecutive
            );
        } else {
            debug!("Failed to read frame ({reason}), retrying...");
        }
    }
}

impl Drop for HandSignApp {
    fn drop(&mut self) {
        if let Err(e) = self.video_capture.release() {
            warn!("Failed to release video source: {e}");
        }
        if self.window_open {
            if let Err(e) = highgui::destroy_all_windows() {
                warn!("Failed to close preview window: {e}");
            }
            self.window_open = false;
        }
        info!("Application shut down");
    }
}

fn open_video_source(source: &VideoSource) -> Result<VideoCapture> {
    let mut cap = match source {
        VideoSource::Camera(index) => {
            info!("Opening camera {index}");
            VideoCapture::new(*index, videoio::CAP_ANY)?
        }
        VideoSource::File(path) => {
            info!("Opening video file: {path}");
            VideoCapture::from_file(path, videoio::CAP_ANY)?
        }
    };

    if !cap.is_opened()? {
        return Err(Error::Camera(match source {
            VideoSource::Camera(index) => format!("Failed to open camera {index}"),
            VideoSource::File(path) => format!("Failed to open video file {path}"),
        }));
    }

    if matches!(source, VideoSource::Camera(_)) {
        // Keep latency low by not queueing stale frames
        if !cap.set(CAP_PROP_BUFFERSIZE, 1.0)? {
            debug!("Camera backend ignored buffer size request");
        }
    }
    Ok(cap)
}

//! Per-frame guidance pipeline shared by the collection and classification modes.
//!
//! Each call to [`Pipeline::process_frame`] runs detect → estimate distance →
//! classify guidance → classify symbol (classification mode) → render. Keyboard
//! commands are applied separately through [`Pipeline::handle_command`] so that
//! captures always receive the raw, pre-overlay frame.

use crate::{
    capture::{CaptureSink, SessionCounters},
    classifier::SymbolClassifier,
    constants::{KEY_ESCAPE, KEY_QUIT, KEY_SAVE},
    crop::crop,
    distance::DistanceEstimator,
    guidance::{GuidanceBands, GuidanceState},
    hand_detection::{select_primary_hand, HandDetection, HandDetector},
    labels::LabelMap,
    overlay::{HandOverlay, OverlayRenderer},
    Error, Result,
};
use log::{debug, info, warn};
use opencv::{core::Mat, prelude::*};
use std::fmt;
use std::str::FromStr;

/// Which of the two workflows the pipeline runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Guidance only; the save key stores raw frames
    Collect,
    /// Guidance plus live symbol classification
    Classify,
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "collect" | "collection" => Ok(Self::Collect),
            "classify" | "predict" => Ok(Self::Classify),
            other => Err(Error::InvalidInput(format!(
                "Unknown mode '{other}', expected 'collect' or 'classify'"
            ))),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Collect => write!(f, "collect"),
            Self::Classify => write!(f, "classify"),
        }
    }
}

/// Mode together with the collaborator that mode needs
pub enum PipelineMode {
    /// Save raw frames on request
    Collect(Box<dyn CaptureSink>),
    /// Classify the cropped hand and show its glyph
    Classify {
        classifier: Box<dyn SymbolClassifier>,
        labels: LabelMap,
    },
}

impl PipelineMode {
    #[must_use]
    pub fn mode(&self) -> Mode {
        match self {
            Self::Collect(_) => Mode::Collect,
            Self::Classify { .. } => Mode::Classify,
        }
    }
}

/// Single-key commands read from the preview window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Save,
    Quit,
}

impl Command {
    /// Decode a `highgui::wait_key` result; unrelated keys and "no key" (-1) map to `None`
    #[must_use]
    pub fn from_key(key: i32) -> Option<Self> {
        if key < 0 {
            return None;
        }
        match key & 0xFF {
            KEY_SAVE => Some(Self::Save),
            KEY_QUIT | KEY_ESCAPE => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Whether the main loop should keep running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Stop,
}

/// Geometry and calibration settings for the pipeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineSettings {
    pub estimator: DistanceEstimator,
    pub bands: GuidanceBands,
    pub margin: i32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            estimator: DistanceEstimator::default(),
            bands: GuidanceBands::default(),
            margin: crate::constants::CROP_MARGIN_PX,
        }
    }
}

/// Classified glyph for the primary hand
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolLabel {
    pub index: usize,
    pub glyph: String,
    pub confidence: f32,
}

/// What the pipeline derived for the primary hand
#[derive(Debug, Clone, PartialEq)]
pub struct HandObservation {
    pub detection: HandDetection,
    /// `None` when the hand box has no width
    pub distance_cm: Option<f64>,
    pub guidance: Option<GuidanceState>,
    /// `None` outside classification mode, on an empty crop or a classifier error
    pub symbol: Option<SymbolLabel>,
}

/// Result of processing one frame
pub struct FrameOutcome {
    /// Annotated copy of the input frame
    pub output: Mat,
    /// Primary hand, if any was detected
    pub hand: Option<HandObservation>,
}

/// One pipeline serving both modes
pub struct Pipeline {
    detector: Box<dyn HandDetector>,
    mode: PipelineMode,
    renderer: OverlayRenderer,
    settings: PipelineSettings,
    counters: SessionCounters,
}

impl Pipeline {
    #[must_use]
    pub fn new(
        detector: Box<dyn HandDetector>,
        mode: PipelineMode,
        renderer: OverlayRenderer,
        settings: PipelineSettings,
    ) -> Self {
        info!("Pipeline running in {} mode", mode.mode());
        Self {
            detector,
            mode,
            renderer,
            settings,
            counters: SessionCounters::default(),
        }
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode.mode()
    }

    #[must_use]
    pub fn counters(&self) -> SessionCounters {
        self.counters
    }

    /// Detect, guide, classify and render one frame. `frame` itself is not modified.
    ///
    /// Detector and classifier failures are logged and treated as "no hand" and
    /// "no label" respectively, so a bad frame never stops the loop.
    ///
    /// # Errors
    ///
    /// Returns an error if copying or drawing on the frame fails
    pub fn process_frame(&mut self, frame: &Mat) -> Result<FrameOutcome> {
        let detections = self.detector.detect(frame).unwrap_or_else(|e| {
            warn!("Hand detection failed: {e}");
            Vec::new()
        });

        let mut output = frame.try_clone()?;
        let Some(primary) = select_primary_hand(&detections) else {
            return Ok(FrameOutcome { output, hand: None });
        };
        let hand = self.observe(frame, primary)?;

        let overlay = HandOverlay {
            bbox: hand.detection.bbox,
            landmarks: &hand.detection.landmarks,
            guidance: hand.guidance.zip(hand.distance_cm),
            glyph: hand.symbol.as_ref().map(|s| s.glyph.as_str()),
        };
        self.renderer.render(&mut output, Some(&overlay))?;

        Ok(FrameOutcome {
            output,
            hand: Some(hand),
        })
    }

    fn observe(&mut self, frame: &Mat, detection: &HandDetection) -> Result<HandObservation> {
        let bbox = detection.bbox;
        let distance_cm = if bbox.width > 0 {
            Some(self.settings.estimator.estimate(f64::from(bbox.width))?)
        } else {
            debug!("Degenerate hand box {bbox:?}, skipping distance estimate");
            None
        };
        let guidance = distance_cm.map(|d| self.settings.bands.classify(d));

        let symbol = match &mut self.mode {
            PipelineMode::Collect(_) => None,
            PipelineMode::Classify { classifier, labels } => {
                match crop(frame, bbox, self.settings.margin)? {
                    None => {
                        debug!("Empty crop for {bbox:?}, skipping classification");
                        None
                    }
                    Some(region) => match classifier.classify(&region) {
                        Ok(prediction) => {
                            let glyph = labels.resolve(prediction.index).to_string();
                            debug!(
                                "Predicted {} ({glyph}) with confidence {:.2}",
                                prediction.index,
                                prediction.confidence()
                            );
                            Some(SymbolLabel {
                                index: prediction.index,
                                glyph,
                                confidence: prediction.confidence(),
                            })
                        }
                        Err(e) => {
                            warn!("Classification failed, skipping frame: {e}");
                            None
                        }
                    },
                }
            }
        };

        Ok(HandObservation {
            detection: detection.clone(),
            distance_cm,
            guidance,
            symbol,
        })
    }

    /// Apply a keyboard command. `raw_frame` must be the frame before any overlay.
    ///
    /// A failed save is reported as a warning and does not count as a capture.
    pub fn handle_command(&mut self, command: Command, raw_frame: &Mat) -> LoopControl {
        match command {
            Command::Quit => {
                info!("Exit requested by user");
                LoopControl::Stop
            }
            Command::Save => {
                match &mut self.mode {
                    PipelineMode::Collect(sink) => match sink.save(raw_frame) {
                        Ok(path) => {
                            let total = self.counters.record_capture();
                            info!("Saved Image: {total} ({})", path.display());
                        }
                        Err(e) => warn!("Failed to save capture: {e}"),
                    },
                    PipelineMode::Classify { .. } => {
                        debug!("Save ignored in classify mode");
                    }
                }
                LoopControl::Continue
            }
        }
    }
}

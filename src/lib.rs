//! Realtime hand positioning guidance and hand sign classification.
//!
//! This library guides a user to hold one hand at a usable distance from a
//! camera, classifies the hand sign into a glyph of a target script and draws
//! the result over the live feed. It is built on:
//! - `OpenCV` for capture, drawing and the preview window
//! - ONNX Runtime for the hand landmark and sign classifier models
//! - `imageproc` / `ab_glyph` for rendering glyphs `OpenCV` fonts cannot draw
//!
//! Each frame goes through:
//! 1. Hand detection (first detected hand only)
//! 2. Distance estimation from the hand box width
//! 3. Guidance banding: too close / good / too far
//! 4. Symbol classification of the padded crop (classification mode), or
//!    capture of the raw frame on request (collection mode)
//! 5. Overlay rendering
//!
//! # Examples
//!
//! ## Distance guidance
//!
//! ```
//! use hand_sign_guide::{distance::DistanceEstimator, guidance::GuidanceState};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let estimator = DistanceEstimator::default();
//! let distance = estimator.estimate(171.0)?;
//! let state = GuidanceState::from_distance(distance);
//! assert_eq!(state, GuidanceState::GoodPosition);
//! println!("{} ({distance:.0} cm)", state.message());
//! # Ok(())
//! # }
//! ```
//!
//! ## Complete pipeline
//!
//! ```no_run
//! use hand_sign_guide::{
//!     classifier::OnnxSymbolClassifier,
//!     hand_detection::OnnxHandDetector,
//!     labels::LabelMap,
//!     overlay::OverlayRenderer,
//!     pipeline::{Command, LoopControl, Pipeline, PipelineMode, PipelineSettings},
//! };
//! use opencv::{core::Mat, highgui, prelude::*, videoio};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let detector = OnnxHandDetector::new("assets/hand_landmarks.onnx", 0.5)?;
//! let mode = PipelineMode::Classify {
//!     classifier: Box::new(OnnxSymbolClassifier::new("mod/model.onnx")?),
//!     labels: LabelMap::default(),
//! };
//! let renderer = OverlayRenderer::new(Some(Path::new("NotoSansKannada.ttf")), 40.0, 20);
//! let mut pipeline = Pipeline::new(Box::new(detector), mode, renderer, PipelineSettings::default());
//!
//! let mut cap = videoio::VideoCapture::new(0, videoio::CAP_ANY)?;
//! let mut frame = Mat::default();
//! loop {
//!     if !cap.read(&mut frame)? || frame.empty() {
//!         continue;
//!     }
//!     let outcome = pipeline.process_frame(&frame)?;
//!     highgui::imshow("Live Prediction", &outcome.output)?;
//!
//!     if let Some(command) = Command::from_key(highgui::wait_key(1)?) {
//!         if pipeline.handle_command(command, &frame) == LoopControl::Stop {
//!             break;
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```

/// Distance estimation from hand box width
pub mod distance;

/// Guidance states and distance bands
pub mod guidance;

/// Margin-padded, clamped hand cropping
pub mod crop;

/// Hand detection contract and `ONNX` landmark detector
pub mod hand_detection;

/// Symbol classification contract and `ONNX` classifier
pub mod classifier;

/// Classifier index to glyph mapping
pub mod labels;

/// Overlay drawing
pub mod overlay;

/// Frame capture for data collection
pub mod capture;

/// Per-frame pipeline shared by both modes
pub mod pipeline;

/// Utility functions for image conversion and model plumbing
pub mod utils;

/// Error types and result handling
pub mod error;

/// Main application module
pub mod app;

/// Constants used throughout the application
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};

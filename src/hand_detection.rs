use crate::{
    constants::{DEFAULT_LANDMARK_INPUT_SIZE, LANDMARK_COORDS, NUM_HAND_LANDMARKS},
    utils::{self, image_conversion::mat_to_nhwc_tensor},
    Error, Result,
};
use opencv::core::{Mat, Point3f, Rect};
use opencv::prelude::*;
use ort::Session;
use std::path::Path;

/// Hand detection result
#[derive(Debug, Clone, PartialEq)]
pub struct HandDetection {
    /// Axis-aligned box around the hand, in frame pixels
    pub bbox: Rect,
    /// Keypoints in detector order; `z` is 0 when the detector has no depth
    pub landmarks: Vec<Point3f>,
    /// Detector confidence in `[0, 1]`
    pub score: f32,
}

impl HandDetection {
    /// Build a detection whose box is the extent of its landmarks
    #[must_use]
    pub fn from_landmarks(landmarks: Vec<Point3f>, score: f32) -> Option<Self> {
        let bbox = bbox_from_landmarks(&landmarks)?;
        Some(Self {
            bbox,
            landmarks,
            score,
        })
    }
}

/// Anything that can locate hands in a BGR frame
pub trait HandDetector {
    /// Detect hands, ordered by the detector's own preference
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails
    fn detect(&mut self, frame: &Mat) -> Result<Vec<HandDetection>>;
}

/// Use the first detection as the hand to guide and classify.
///
/// Only one hand is tracked. The detector's ordering decides which one, so the
/// choice is deterministic whenever the detector is.
#[must_use]
pub fn select_primary_hand(detections: &[HandDetection]) -> Option<&HandDetection> {
    detections.first()
}

/// Smallest integer rectangle enclosing every landmark
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn bbox_from_landmarks(landmarks: &[Point3f]) -> Option<Rect> {
    let finite = landmarks.iter().filter(|p| p.x.is_finite() && p.y.is_finite());
    let (min_x, min_y, max_x, max_y) = finite.fold(None, |acc, p| {
        Some(match acc {
            None => (p.x, p.y, p.x, p.y),
            Some((x0, y0, x1, y1)) => (x0.min(p.x), y0.min(p.y), x1.max(p.x), y1.max(p.y)),
        })
    })?;

    let left = min_x.floor() as i32;
    let top = min_y.floor() as i32;
    let right = max_x.ceil() as i32;
    let bottom = max_y.ceil() as i32;
    Some(Rect::new(
        left,
        top,
        right.saturating_sub(left),
        bottom.saturating_sub(top),
    ))
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Single-hand landmark regressor running on the whole frame via `ONNX` Runtime.
///
/// Expects an NHWC RGB input in `[0, 1]` and two outputs: 21 `(x, y, z)`
/// keypoints in input pixels, and a hand-presence logit.
pub struct OnnxHandDetector {
    session: Session,
    input_size: i32,
    presence_threshold: f32,
}

impl OnnxHandDetector {
    /// Create a new hand detector from an `ONNX` model file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The model file does not exist or cannot be loaded
    /// - The model has no inputs or outputs
    /// - `presence_threshold` is outside `[0, 1]`
    pub fn new<P: AsRef<Path>>(model_path: P, presence_threshold: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&presence_threshold) {
            return Err(Error::InvalidInput(format!(
                "Presence threshold must be between 0.0 and 1.0, got {presence_threshold}"
            )));
        }
        let session = utils::load_onnx_session("hand_detector", model_path)?;
        let input_size = utils::nhwc_input_size(&session, DEFAULT_LANDMARK_INPUT_SIZE);
        log::info!("Hand landmark model input size: {input_size}x{input_size}");

        Ok(Self {
            session,
            input_size,
            presence_threshold,
        })
    }

    /// Map raw model outputs to at most one detection in frame coordinates
    ///
    /// # Errors
    ///
    /// Returns an error if the landmark output is shorter than 21 keypoints
    #[allow(clippy::cast_precision_loss)]
    fn postprocess(
        &self,
        outputs: &[Vec<f32>],
        frame_width: i32,
        frame_height: i32,
    ) -> Result<Option<HandDetection>> {
        let marks = outputs
            .first()
            .ok_or_else(|| Error::ModelOutputError("No landmark output from model".to_string()))?;
        let needed = NUM_HAND_LANDMARKS * LANDMARK_COORDS;
        if marks.len() < needed {
            return Err(Error::ModelOutputError(format!(
                "Expected at least {needed} landmark values, got {}",
                marks.len()
            )));
        }

        let score = outputs
            .get(1)
            .and_then(|presence| presence.first())
            .map_or(1.0, |&logit| sigmoid(logit));
        if score < self.presence_threshold {
            return Ok(None);
        }

        let scale_x = frame_width as f32 / self.input_size as f32;
        let scale_y = frame_height as f32 / self.input_size as f32;
        let landmarks = marks[..needed]
            .chunks_exact(LANDMARK_COORDS)
            .map(|c| Point3f::new(c[0] * scale_x, c[1] * scale_y, c[2]))
            .collect();

        Ok(HandDetection::from_landmarks(landmarks, score))
    }
}

impl HandDetector for OnnxHandDetector {
    fn detect(&mut self, frame: &Mat) -> Result<Vec<HandDetection>> {
        let input = mat_to_nhwc_tensor(frame, self.input_size, 1.0 / 255.0, 0.0)?;
        let outputs = utils::run_flattened(&self.session, input)?;
        let detection = self.postprocess(&outputs, frame.cols(), frame.rows())?;
        Ok(detection.into_iter().collect())
    }
}

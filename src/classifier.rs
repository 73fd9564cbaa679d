//! Hand sign classifier adapter.

use crate::{
    constants::{CLASSIFIER_NORMALIZATION_OFFSET, CLASSIFIER_NORMALIZATION_SCALE, DEFAULT_CLASSIFIER_INPUT_SIZE},
    utils::{self, argmax, image_conversion::mat_to_nhwc_tensor},
    Error, Result,
};
use opencv::core::Mat;
use ort::Session;
use std::path::Path;

/// Classifier output for one image
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Per-class confidence, in model output order
    pub confidences: Vec<f32>,
    /// Index of the most confident class
    pub index: usize,
}

impl Prediction {
    /// Pick the most confident class
    ///
    /// # Errors
    ///
    /// Returns an error if there is no finite confidence value
    pub fn from_confidences(confidences: Vec<f32>) -> Result<Self> {
        let index = argmax(&confidences)
            .ok_or_else(|| Error::ModelOutputError("Classifier returned no confidences".to_string()))?;
        Ok(Self { confidences, index })
    }

    /// Confidence of the chosen class
    #[must_use]
    pub fn confidence(&self) -> f32 {
        self.confidences.get(self.index).copied().unwrap_or(0.0)
    }
}

/// Anything that can assign a class index to a cropped hand image
pub trait SymbolClassifier {
    /// Classify a non-empty BGR image
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails or produces no output
    fn classify(&mut self, image: &Mat) -> Result<Prediction>;
}

/// Image classifier exported from Keras / Teachable Machine to `ONNX`.
///
/// Input is NHWC RGB normalized to `pixel / 127 - 1`; the first output is the
/// class confidence vector.
pub struct OnnxSymbolClassifier {
    session: Session,
    input_size: i32,
}

impl OnnxSymbolClassifier {
    /// Load the classifier model
    ///
    /// # Errors
    ///
    /// Returns an error if the model file is missing or cannot be loaded
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let session = utils::load_onnx_session("symbol_classifier", model_path)?;
        let input_size = utils::nhwc_input_size(&session, DEFAULT_CLASSIFIER_INPUT_SIZE);
        log::info!("Classifier input size: {input_size}x{input_size}");
        Ok(Self { session, input_size })
    }
}

impl SymbolClassifier for OnnxSymbolClassifier {
    fn classify(&mut self, image: &Mat) -> Result<Prediction> {
        let input = mat_to_nhwc_tensor(
            image,
            self.input_size,
            CLASSIFIER_NORMALIZATION_SCALE,
            CLASSIFIER_NORMALIZATION_OFFSET,
        )?;
        let confidences = utils::run_flattened(&self.session, input)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::ModelOutputError("No output from classifier".to_string()))?;
        Prediction::from_confidences(confidences)
    }
}

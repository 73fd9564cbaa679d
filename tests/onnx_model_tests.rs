//! Tests for ONNX model loading and inference

use hand_sign_guide::{
    classifier::{OnnxSymbolClassifier, SymbolClassifier},
    hand_detection::{HandDetector, OnnxHandDetector},
    Error, Result,
};
use opencv::core::{Mat, Scalar, CV_8UC3};
use std::path::Path;

const HAND_MODEL: &str = "assets/hand_landmarks.onnx";
const CLASSIFIER_MODEL: &str = "mod/model.onnx";

#[test]
fn test_missing_models_are_reported() {
    assert!(matches!(
        OnnxHandDetector::new("/nonexistent/hand.onnx", 0.5),
        Err(Error::ModelError(_))
    ));
    assert!(matches!(
        OnnxSymbolClassifier::new("/nonexistent/model.onnx"),
        Err(Error::ModelError(_))
    ));
}

#[test]
fn test_garbage_model_file_fails_to_load() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("model.onnx");
    std::fs::write(&path, b"not an onnx graph")?;

    assert!(OnnxSymbolClassifier::new(&path).is_err());
    assert!(OnnxHandDetector::new(&path, 0.5).is_err());
    Ok(())
}

#[test]
#[ignore = "Requires ONNX models"]
fn test_load_hand_landmark_model() -> Result<()> {
    assert!(Path::new(HAND_MODEL).exists(), "Hand landmark model not found");

    let _detector = OnnxHandDetector::new(HAND_MODEL, 0.5)?;

    Ok(())
}

#[test]
#[ignore = "Requires ONNX models"]
fn test_load_classifier_model() -> Result<()> {
    assert!(Path::new(CLASSIFIER_MODEL).exists(), "Classifier model not found");

    let _classifier = OnnxSymbolClassifier::new(CLASSIFIER_MODEL)?;

    Ok(())
}

#[test]
#[ignore = "Requires ONNX models"]
fn test_hand_detection_on_blank_frame() -> Result<()> {
    let mut detector = OnnxHandDetector::new(HAND_MODEL, 0.5)?;
    let frame = Mat::new_rows_cols_with_default(480, 640, CV_8UC3, Scalar::new(128.0, 128.0, 128.0, 0.0))?;

    let hands = detector.detect(&frame)?;

    // A flat grey frame holds no hand
    assert!(hands.is_empty());
    Ok(())
}

#[test]
#[ignore = "Requires ONNX models"]
fn test_classifier_returns_distribution() -> Result<()> {
    let mut classifier = OnnxSymbolClassifier::new(CLASSIFIER_MODEL)?;
    let crop = Mat::new_rows_cols_with_default(180, 150, CV_8UC3, Scalar::new(90.0, 120.0, 200.0, 0.0))?;

    let prediction = classifier.classify(&crop)?;

    assert!(!prediction.confidences.is_empty());
    assert!(prediction.index < prediction.confidences.len());
    assert!(prediction.confidences.iter().all(|c| c.is_finite()));
    Ok(())
}

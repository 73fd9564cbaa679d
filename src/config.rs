//! Configuration management for the hand sign guidance application

use crate::{
    constants::{
        CROP_MARGIN_PX, DEFAULT_FONT_SIZE, FOCAL_LENGTH_PX, GUIDANCE_FAR_CM, GUIDANCE_NEAR_CM,
        KNOWN_HAND_WIDTH_CM,
    },
    distance::DistanceEstimator,
    guidance::GuidanceBands,
    pipeline::{Mode, PipelineSettings},
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Model file paths
    pub models: ModelConfig,

    /// Hand detection parameters
    pub detection: DetectionConfig,

    /// Distance estimation and guidance bands
    pub guidance: GuidanceConfig,

    /// Crop geometry
    pub crop: CropConfig,

    /// Data collection output
    pub capture: CaptureConfig,

    /// Preview and overlay settings
    pub display: DisplayConfig,
}

/// Model file paths configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the hand landmark ONNX model
    pub hand_landmarks: PathBuf,

    /// Path to the symbol classifier ONNX model
    pub classifier: PathBuf,

    /// Optional `<index> <glyph>` glyph file; the built-in Kannada map is used when absent.
    /// This is not the classifier's class-name list.
    pub labels: Option<PathBuf>,
}

/// Hand detection parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectionConfig {
    /// Minimum hand presence probability (0.0-1.0)
    pub presence_threshold: f32,
}

/// Distance estimation constants and guidance band edges
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GuidanceConfig {
    /// Assumed physical hand width in centimeters
    pub known_width_cm: f64,

    /// Assumed focal length in pixels
    pub focal_length_px: f64,

    /// Closer than this asks the user to move further away
    pub near_cm: f64,

    /// Further than this asks the user to come closer
    pub far_cm: f64,
}

/// Crop geometry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CropConfig {
    /// Padding around the hand box in pixels
    pub margin: i32,
}

/// Data collection output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CaptureConfig {
    /// Directory receiving captured frames
    pub directory: PathBuf,

    /// Image format extension
    pub extension: String,
}

/// Preview and overlay settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    /// Font able to render the label glyphs
    pub font_path: Option<PathBuf>,

    /// Glyph size in pixels
    pub font_size: f32,

    /// Mirror the camera image horizontally
    pub mirror: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            hand_landmarks: PathBuf::from("assets/hand_landmarks.onnx"),
            classifier: PathBuf::from("mod/model.onnx"),
            labels: None,
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            presence_threshold: 0.5,
        }
    }
}

impl Default for GuidanceConfig {
    fn default() -> Self {
        Self {
            known_width_cm: KNOWN_HAND_WIDTH_CM,
            focal_length_px: FOCAL_LENGTH_PX,
            near_cm: GUIDANCE_NEAR_CM,
            far_cm: GUIDANCE_FAR_CM,
        }
    }
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            margin: CROP_MARGIN_PX,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("Data/Ee"),
            extension: "jpg".to_string(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            font_path: Some(PathBuf::from("NotoSansKannada.ttf")),
            font_size: DEFAULT_FONT_SIZE,
            mirror: false,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Build the pipeline settings described by this configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the calibration constants or band edges are invalid
    pub fn pipeline_settings(&self) -> Result<PipelineSettings> {
        Ok(PipelineSettings {
            estimator: DistanceEstimator::new(self.guidance.known_width_cm, self.guidance.focal_length_px)?,
            bands: GuidanceBands::new(self.guidance.near_cm, self.guidance.far_cm)?,
            margin: self.crop.margin,
        })
    }

    /// Validate value ranges, and that the model files `mode` needs exist
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` describing the first invalid setting
    pub fn validate(&self, mode: Mode) -> Result<()> {
        if !(0.0..=1.0).contains(&self.detection.presence_threshold) {
            return Err(Error::ConfigError(
                "Presence threshold must be between 0.0 and 1.0".to_string(),
            ));
        }
        if self.crop.margin < 0 {
            return Err(Error::ConfigError("Crop margin must not be negative".to_string()));
        }
        if !(self.display.font_size.is_finite() && self.display.font_size > 0.0) {
            return Err(Error::ConfigError("Font size must be greater than 0".to_string()));
        }
        if self.capture.extension.trim_start_matches('.').is_empty() {
            return Err(Error::ConfigError("Capture extension must not be empty".to_string()));
        }
        self.pipeline_settings()
            .map_err(|e| Error::ConfigError(format!("Invalid guidance settings: {e}")))?;

        if !self.models.hand_landmarks.exists() {
            return Err(Error::ConfigError(format!(
                "Hand landmark model not found: {}",
                self.models.hand_landmarks.display()
            )));
        }
        if mode == Mode::Classify {
            if !self.models.classifier.exists() {
                return Err(Error::ConfigError(format!(
                    "Classifier model not found: {}",
                    self.models.classifier.display()
                )));
            }
            if let Some(labels) = &self.models.labels {
                if !labels.exists() {
                    return Err(Error::ConfigError(format!(
                        "Labels file not found: {}",
                        labels.display()
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Hand Sign Guide Configuration

# Model paths
models:
  hand_landmarks: "assets/hand_landmarks.onnx"
  classifier: "mod/model.onnx"
  # Optional "<index> <glyph>" file replacing the built-in Kannada glyphs
  # labels: "mod/glyphs.txt"

# Hand detection
detection:
  presence_threshold: 0.5

# Distance estimation and guidance bands (cm)
guidance:
  known_width_cm: 10.0
  focal_length_px: 600.0
  near_cm: 30.0
  far_cm: 40.0

# Padding around the hand box (px)
crop:
  margin: 20

# Data collection output
capture:
  directory: "Data/Ee"
  extension: "jpg"

# Preview
display:
  font_path: "NotoSansKannada.ttf"
  font_size: 40.0
  mirror: false
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_matches_defaults() {
        let parsed = Config::from_yaml(EXAMPLE_CONFIG).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed = Config::from_yaml("crop:\n  margin: 35\n").unwrap();
        assert_eq!(parsed.crop.margin, 35);
        assert_eq!(parsed.guidance, GuidanceConfig::default());
        assert_eq!(parsed.capture.extension, "jpg");
    }

    #[test]
    fn test_malformed_yaml() {
        assert!(matches!(
            Config::from_yaml("crop: [1, 2"),
            Err(Error::ConfigError(_))
        ));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let mut config = Config::default();
        config.guidance.near_cm = 25.0;
        config.display.mirror = true;
        config.to_file(&path).unwrap();
        assert_eq!(Config::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_pipeline_settings() {
        let settings = Config::default().pipeline_settings().unwrap();
        assert_eq!(settings, PipelineSettings::default());

        let mut config = Config::default();
        config.guidance.near_cm = 50.0;
        assert!(config.pipeline_settings().is_err());
    }

    #[test]
    fn test_validate_ranges() {
        let mut config = Config::default();
        config.detection.presence_threshold = 1.5;
        assert!(matches!(config.validate(Mode::Collect), Err(Error::ConfigError(_))));

        let mut config = Config::default();
        config.crop.margin = -1;
        assert!(config.validate(Mode::Collect).is_err());

        let mut config = Config::default();
        config.guidance.focal_length_px = 0.0;
        assert!(config.validate(Mode::Collect).is_err());
    }

    #[test]
    fn test_classify_defaults_to_builtin_glyphs() {
        let dir = tempfile::tempdir().unwrap();
        let hand_model = dir.path().join("hand.onnx");
        let classifier = dir.path().join("model.onnx");
        std::fs::write(&hand_model, b"").unwrap();
        std::fs::write(&classifier, b"").unwrap();

        let mut config = Config::default();
        assert_eq!(config.models.labels, None);
        config.models.hand_landmarks = hand_model;
        config.models.classifier = classifier;
        assert!(config.validate(Mode::Classify).is_ok());

        // A configured glyph file must exist
        config.models.labels = Some(dir.path().join("glyphs.txt"));
        assert!(matches!(config.validate(Mode::Classify), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_validate_model_paths() {
        let dir = tempfile::tempdir().unwrap();
        let hand_model = dir.path().join("hand.onnx");
        std::fs::write(&hand_model, b"").unwrap();

        let mut config = Config::default();
        config.models.hand_landmarks = hand_model;
        config.models.classifier = dir.path().join("missing.onnx");
        config.models.labels = None;

        assert!(config.validate(Mode::Collect).is_ok());
        assert!(config.validate(Mode::Classify).is_err());
    }
}

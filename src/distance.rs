//! Distance estimation from the apparent width of a detected hand.
//!
//! Uses the pinhole relation `distance = known_width * focal_length / perceived_width`.
//! Both constants are fixed at startup; there is no runtime calibration.

use crate::{
    constants::{FOCAL_LENGTH_PX, KNOWN_HAND_WIDTH_CM},
    Error, Result,
};

/// Converts a bounding box width in pixels to an approximate distance in centimeters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceEstimator {
    known_width_cm: f64,
    focal_length_px: f64,
}

impl Default for DistanceEstimator {
    fn default() -> Self {
        Self {
            known_width_cm: KNOWN_HAND_WIDTH_CM,
            focal_length_px: FOCAL_LENGTH_PX,
        }
    }
}

impl DistanceEstimator {
    /// Create an estimator with custom calibration constants
    ///
    /// # Errors
    ///
    /// Returns an error if either constant is not a positive finite number
    pub fn new(known_width_cm: f64, focal_length_px: f64) -> Result<Self> {
        if !(known_width_cm.is_finite() && known_width_cm > 0.0) {
            return Err(Error::InvalidInput(format!(
                "Known width must be positive, got {known_width_cm}"
            )));
        }
        if !(focal_length_px.is_finite() && focal_length_px > 0.0) {
            return Err(Error::InvalidInput(format!(
                "Focal length must be positive, got {focal_length_px}"
            )));
        }
        Ok(Self {
            known_width_cm,
            focal_length_px,
        })
    }

    /// Estimate the hand distance in centimeters
    ///
    /// # Errors
    ///
    /// Returns an error if `perceived_width_px` is zero, negative or not finite.
    /// Callers are expected to skip the estimate for degenerate boxes.
    pub fn estimate(&self, perceived_width_px: f64) -> Result<f64> {
        if !(perceived_width_px.is_finite() && perceived_width_px > 0.0) {
            return Err(Error::InvalidInput(format!(
                "Perceived width must be positive, got {perceived_width_px}"
            )));
        }
        Ok(self.known_width_cm * self.focal_length_px / perceived_width_px)
    }

    /// Known physical hand width in centimeters
    #[must_use]
    pub fn known_width_cm(&self) -> f64 {
        self.known_width_cm
    }

    /// Focal length in pixels
    #[must_use]
    pub fn focal_length_px(&self) -> f64 {
        self.focal_length_px
    }
}

//! Distance bands that drive the on-screen positioning instructions.

use crate::{
    constants::{GUIDANCE_FAR_CM, GUIDANCE_NEAR_CM},
    Error, Result,
};
use opencv::core::Scalar;

/// Positioning instruction for the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuidanceState {
    /// Hand is closer than the near band edge
    MoveFurther,
    /// Hand is inside the usable band (edges inclusive)
    GoodPosition,
    /// Hand is beyond the far band edge
    ComeCloser,
}

impl GuidanceState {
    /// Classify a distance using the default 30-40 cm band
    #[must_use]
    pub fn from_distance(distance_cm: f64) -> Self {
        GuidanceBands::default().classify(distance_cm)
    }

    /// Instruction text shown on the preview
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::MoveFurther => "Move Hands further!",
            Self::GoodPosition => "Good Position!",
            Self::ComeCloser => "Come Closer",
        }
    }

    /// Text color in BGR order
    #[must_use]
    pub fn color(self) -> Scalar {
        match self {
            Self::MoveFurther => Scalar::new(0.0, 0.0, 255.0, 0.0),   // Red
            Self::GoodPosition => Scalar::new(0.0, 255.0, 0.0, 0.0),  // Green
            Self::ComeCloser => Scalar::new(0.0, 165.0, 255.0, 0.0),  // Orange
        }
    }
}

/// Band edges in centimeters. Both edges belong to [`GuidanceState::GoodPosition`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuidanceBands {
    near_cm: f64,
    far_cm: f64,
}

impl Default for GuidanceBands {
    fn default() -> Self {
        Self {
            near_cm: GUIDANCE_NEAR_CM,
            far_cm: GUIDANCE_FAR_CM,
        }
    }
}

impl GuidanceBands {
    /// Create bands with custom edges
    ///
    /// # Errors
    ///
    /// Returns an error if the edges are not finite or `near_cm > far_cm`
    pub fn new(near_cm: f64, far_cm: f64) -> Result<Self> {
        if !near_cm.is_finite() || !far_cm.is_finite() || near_cm > far_cm {
            return Err(Error::InvalidInput(format!(
                "Invalid guidance band [{near_cm}, {far_cm}]"
            )));
        }
        Ok(Self { near_cm, far_cm })
    }

    /// Map a distance to exactly one guidance state.
    ///
    /// `< near` is too close, `[near, far]` is good, anything else (including NaN)
    /// asks the user to come closer.
    #[must_use]
    pub fn classify(&self, distance_cm: f64) -> GuidanceState {
        if distance_cm < self.near_cm {
            GuidanceState::MoveFurther
        } else if distance_cm <= self.far_cm {
            GuidanceState::GoodPosition
        } else {
            GuidanceState::ComeCloser
        }
    }

    #[must_use]
    pub fn near_cm(&self) -> f64 {
        self.near_cm
    }

    #[must_use]
    pub fn far_cm(&self) -> f64 {
        self.far_cm
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_band_edges_are_good() {
        assert_eq!(GuidanceState::from_distance(30.0), GuidanceState::GoodPosition);
        assert_eq!(GuidanceState::from_distance(40.0), GuidanceState::GoodPosition);
        assert_eq!(GuidanceState::from_distance(29.999), GuidanceState::MoveFurther);
        assert_eq!(GuidanceState::from_distance(40.001), GuidanceState::ComeCloser);
    }

    #[test]
    fn test_scenarios() {
        let too_close = GuidanceState::from_distance(25.0);
        assert_eq!(too_close, GuidanceState::MoveFurther);
        assert_eq!(too_close.message(), "Move Hands further!");
        assert_eq!(too_close.color(), Scalar::new(0.0, 0.0, 255.0, 0.0));

        let good = GuidanceState::from_distance(35.0);
        assert_eq!(good, GuidanceState::GoodPosition);
        assert_eq!(good.message(), "Good Position!");
        assert_eq!(good.color(), Scalar::new(0.0, 255.0, 0.0, 0.0));

        let too_far = GuidanceState::from_distance(50.0);
        assert_eq!(too_far, GuidanceState::ComeCloser);
        assert_eq!(too_far.message(), "Come Closer");
        // Orange: strong red, medium green, no blue
        let color = too_far.color();
        assert_eq!(color[2], 255.0);
        assert_eq!(color[1], 165.0);
        assert_eq!(color[0], 0.0);
    }

    #[test]
    fn test_nan_is_total() {
        assert_eq!(GuidanceState::from_distance(f64::NAN), GuidanceState::ComeCloser);
        assert_eq!(GuidanceState::from_distance(f64::INFINITY), GuidanceState::ComeCloser);
        assert_eq!(GuidanceState::from_distance(0.0), GuidanceState::MoveFurther);
    }

    #[test]
    fn test_custom_bands() {
        let bands = GuidanceBands::new(20.0, 25.0).unwrap();
        assert_eq!(bands.classify(22.0), GuidanceState::GoodPosition);
        assert_eq!(bands.classify(30.0), GuidanceState::ComeCloser);
        assert!(GuidanceBands::new(40.0, 30.0).is_err());
        assert!(GuidanceBands::new(f64::NAN, 30.0).is_err());
    }

    proptest! {
        #[test]
        fn prop_exactly_one_state(distance in 0.0f64..1e4) {
            let bands = GuidanceBands::default();
            let state = bands.classify(distance);
            let expected = if distance < 30.0 {
                GuidanceState::MoveFurther
            } else if distance <= 40.0 {
                GuidanceState::GoodPosition
            } else {
                GuidanceState::ComeCloser
            };
            prop_assert_eq!(state, expected);
        }
    }
}

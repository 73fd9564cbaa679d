//! Constants used throughout the application

/// Approximate width of an adult hand in centimeters
pub const KNOWN_HAND_WIDTH_CM: f64 = 10.0;

/// Estimated camera focal length in pixels (uncalibrated)
pub const FOCAL_LENGTH_PX: f64 = 600.0;

/// Distances below this are too close to the camera
pub const GUIDANCE_NEAR_CM: f64 = 30.0;

/// Distances above this are too far from the camera
pub const GUIDANCE_FAR_CM: f64 = 40.0;

/// Padding added on every side of the hand box before cropping
pub const CROP_MARGIN_PX: i32 = 20;

/// Number of keypoints produced by the hand landmark model
pub const NUM_HAND_LANDMARKS: usize = 21;

/// Values per landmark in the model output (x, y, z)
pub const LANDMARK_COORDS: usize = 3;

/// Default square input size of the hand landmark model
pub const DEFAULT_LANDMARK_INPUT_SIZE: i32 = 224;

/// Default square input size of the symbol classifier
pub const DEFAULT_CLASSIFIER_INPUT_SIZE: i32 = 224;

/// Classifier pixel normalization: `pixel / 127 - 1`
pub const CLASSIFIER_NORMALIZATION_SCALE: f32 = 1.0 / 127.0;
pub const CLASSIFIER_NORMALIZATION_OFFSET: f32 = -1.0;

/// Glyph shown when the classifier returns an index with no mapping
pub const UNKNOWN_GLYPH: &str = "?";

/// Default glyph font size in pixels
pub const DEFAULT_FONT_SIZE: f32 = 40.0;

/// Label box geometry, measured upward from the expanded hand box
pub const LABEL_BOX_OFFSET_TOP: i32 = 50;
pub const LABEL_BOX_OFFSET_BOTTOM: i32 = 10;

/// Key codes polled from the preview window
pub const KEY_SAVE: i32 = b's' as i32;
pub const KEY_QUIT: i32 = b'q' as i32;
pub const KEY_ESCAPE: i32 = 27;

/// Delay between retries after a failed camera read, in milliseconds
pub const READ_RETRY_DELAY_MS: i32 = 10;

/// While camera reads keep failing, repeat the warning once per this many failures
pub const READ_FAILURE_LOG_INTERVAL: u64 = 100;

//! Utility functions shared by the model adapters and the overlay renderer.

pub mod image_conversion;

use crate::{Error, Result};
use ndarray::{Array4, CowArray};
use opencv::core::{Point, Point3f};
use ort::{Environment, GraphOptimizationLevel, LoggingLevel, Session, SessionBuilder, Value};
use std::path::Path;
use std::sync::Arc;

/// Convert a landmark to integer pixel coordinates.
///
/// Float-to-int `as` casts saturate, so out-of-range or NaN coordinates never
/// wrap around; `OpenCV` clips the drawing itself.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn to_pixel(point: &Point3f) -> Point {
    Point::new(point.x.round() as i32, point.y.round() as i32)
}

/// Index of the largest value, ignoring NaN entries
#[must_use]
pub fn argmax(values: &[f32]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(i, _)| i)
}

/// Open an `ONNX` model with the optimization settings used by every adapter
///
/// # Errors
///
/// Returns an error if the environment cannot be created or the model cannot be loaded
pub(crate) fn load_onnx_session<P: AsRef<Path>>(name: &str, model_path: P) -> Result<Session> {
    log::info!("Loading {} model: {}", name, model_path.as_ref().display());
    if !model_path.as_ref().exists() {
        return Err(Error::ModelError(format!(
            "Model file not found: {}",
            model_path.as_ref().display()
        )));
    }

    let environment = Arc::new(
        Environment::builder()
            .with_name(name)
            .with_log_level(LoggingLevel::Warning)
            .build()?,
    );

    let session = SessionBuilder::new(&environment)?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_model_from_file(model_path)?;

    if session.inputs.is_empty() {
        return Err(Error::ModelInputError("Model has no inputs".to_string()));
    }
    if session.outputs.is_empty() {
        return Err(Error::ModelOutputError("Model has no outputs".to_string()));
    }
    Ok(session)
}

/// Square NHWC input size declared by the model, falling back to `default`
/// when the dimensions are dynamic
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub(crate) fn nhwc_input_size(session: &Session, default: i32) -> i32 {
    session
        .inputs
        .first()
        .and_then(|input| {
            if input.dimensions.len() == 4 {
                input.dimensions[1]
            } else {
                None
            }
        })
        .map_or(default, |dim| dim as i32)
}

/// Run a single-input model and flatten every output tensor
///
/// # Errors
///
/// Returns an error if inference fails or an output is not an f32 tensor
pub(crate) fn run_flattened(session: &Session, input: Array4<f32>) -> Result<Vec<Vec<f32>>> {
    let cow_array = CowArray::from(input.into_dyn());
    let input_tensor = Value::from_array(session.allocator(), &cow_array)?;

    let outputs = session.run(vec![input_tensor])?;

    let mut flattened = Vec::with_capacity(outputs.len());
    for output in outputs {
        let tensor = output.try_extract::<f32>()?;
        flattened.push(tensor.view().iter().copied().collect());
    }
    Ok(flattened)
}

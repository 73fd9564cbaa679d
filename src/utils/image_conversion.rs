//! Conversions between `OpenCV` BGR frames, `image` RGB buffers and model input tensors.

use crate::{Error, Result};
use image::{Rgb, RgbImage};
use ndarray::Array4;
use opencv::core::{Mat, Scalar, Size, Vec3b, Vec3f, CV_32F, CV_8UC3};
use opencv::imgproc::{self, InterpolationFlags};
use opencv::prelude::*;

fn ensure_bgr8(mat: &Mat) -> Result<()> {
    if mat.typ() != CV_8UC3 {
        return Err(Error::InvalidInput(format!(
            "Expected 8-bit 3-channel image, got type {}",
            mat.typ()
        )));
    }
    if mat.rows() <= 0 || mat.cols() <= 0 {
        return Err(Error::InvalidInput(format!(
            "Invalid Mat dimensions: {}x{}",
            mat.cols(),
            mat.rows()
        )));
    }
    Ok(())
}

/// Convert a BGR `CV_8UC3` Mat into an RGB image buffer
///
/// # Errors
///
/// Returns an error if the Mat is empty or not `CV_8UC3`
#[allow(clippy::cast_sign_loss)] // Dimensions checked positive
pub fn mat_to_rgb_image(mat: &Mat) -> Result<RgbImage> {
    ensure_bgr8(mat)?;
    let mut image = RgbImage::new(mat.cols() as u32, mat.rows() as u32);
    for row in 0..mat.rows() {
        for col in 0..mat.cols() {
            let bgr = mat.at_2d::<Vec3b>(row, col)?;
            image.put_pixel(col as u32, row as u32, Rgb([bgr[2], bgr[1], bgr[0]]));
        }
    }
    Ok(image)
}

/// Convert an RGB image buffer back into a BGR `CV_8UC3` Mat
///
/// # Errors
///
/// Returns an error if the image is too large for `OpenCV` or Mat creation fails
#[allow(clippy::cast_possible_wrap)] // Bounded by width/height above
pub fn rgb_image_to_mat(image: &RgbImage) -> Result<Mat> {
    let width = i32::try_from(image.width())
        .map_err(|_| Error::InvalidInput(format!("Image width {} too large", image.width())))?;
    let height = i32::try_from(image.height())
        .map_err(|_| Error::InvalidInput(format!("Image height {} too large", image.height())))?;

    let mut mat = Mat::new_rows_cols_with_default(height, width, CV_8UC3, Scalar::default())?;
    for (x, y, pixel) in image.enumerate_pixels() {
        let Rgb([r, g, b]) = *pixel;
        *mat.at_2d_mut::<Vec3b>(y as i32, x as i32)? = Vec3b::from_array([b, g, r]);
    }
    Ok(mat)
}

/// Resize a BGR image and pack it as a `1 x size x size x 3` RGB tensor with
/// every value mapped through `pixel * scale + offset`
///
/// # Errors
///
/// Returns an error if the image is not `CV_8UC3` or an `OpenCV` call fails
#[allow(clippy::cast_sign_loss)] // size is a positive model dimension
pub fn mat_to_nhwc_tensor(image: &Mat, size: i32, scale: f32, offset: f32) -> Result<Array4<f32>> {
    ensure_bgr8(image)?;
    if size <= 0 {
        return Err(Error::ModelInputError(format!("Invalid model input size {size}")));
    }

    let mut resized = Mat::default();
    imgproc::resize(
        image,
        &mut resized,
        Size::new(size, size),
        0.0,
        0.0,
        InterpolationFlags::INTER_LINEAR as i32,
    )?;

    let mut rgb_image = Mat::default();
    imgproc::cvt_color(&resized, &mut rgb_image, imgproc::COLOR_BGR2RGB, 0)?;

    let mut float_image = Mat::default();
    rgb_image.convert_to(&mut float_image, CV_32F, f64::from(scale), f64::from(offset))?;

    let side = size as usize;
    let mut data = Vec::with_capacity(side * side * 3);
    for row in 0..size {
        for col in 0..size {
            let pixel = float_image.at_2d::<Vec3f>(row, col)?;
            data.extend_from_slice(&[pixel[0], pixel[1], pixel[2]]);
        }
    }

    Array4::from_shape_vec((1, side, side, 3), data)
        .map_err(|e| Error::ModelInputError(format!("Failed to create input tensor: {e}")))
}

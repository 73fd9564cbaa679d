//! Margin-padded, bounds-clamped cropping of the hand region.

use crate::Result;
use opencv::{
    core::{Mat, Rect, Size},
    prelude::*,
};

/// Expand `bbox` by `margin` on every side and clamp it to a frame of `frame_size`.
///
/// Returns `None` when the clamped region has zero width or height, i.e. the
/// hand box lies entirely outside the frame.
#[must_use]
pub fn crop_bounds(bbox: Rect, margin: i32, frame_size: Size) -> Option<Rect> {
    let left = bbox.x.saturating_sub(margin).max(0);
    let top = bbox.y.saturating_sub(margin).max(0);
    let right = bbox
        .x
        .saturating_add(bbox.width)
        .saturating_add(margin)
        .min(frame_size.width);
    let bottom = bbox
        .y
        .saturating_add(bbox.height)
        .saturating_add(margin)
        .min(frame_size.height);

    if right <= left || bottom <= top {
        return None;
    }
    Some(Rect::new(left, top, right - left, bottom - top))
}

/// Copy the padded hand region out of `frame`.
///
/// # Errors
///
/// Returns an error if `OpenCV` fails to create or copy the region of interest
pub fn crop(frame: &Mat, bbox: Rect, margin: i32) -> Result<Option<Mat>> {
    let Some(bounds) = crop_bounds(bbox, margin, frame.size()?) else {
        return Ok(None);
    };
    let roi = Mat::roi(frame, bounds)?;
    Ok(Some(roi.try_clone()?))
}

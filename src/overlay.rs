//! Guidance, skeleton and label overlays drawn onto the preview frame.
//!
//! `OpenCV`'s Hershey fonts only cover ASCII, so the classified glyph is drawn
//! with a TrueType font through `imageproc`. Only the label box is converted
//! to RGB and back; the rest of the frame is never touched by that path.

use crate::{
    constants::{DEFAULT_FONT_SIZE, LABEL_BOX_OFFSET_BOTTOM, LABEL_BOX_OFFSET_TOP},
    guidance::GuidanceState,
    utils::{
        image_conversion::{mat_to_rgb_image, rgb_image_to_mat},
        to_pixel,
    },
    Error, Result,
};
use ab_glyph::{FontArc, PxScale};
use image::Rgb;
use imageproc::{
    drawing::{draw_filled_rect_mut, draw_text_mut},
    rect::Rect as PixelRect,
};
use log::{debug, warn};
use opencv::{
    core::{Mat, Point, Point3f, Rect, Scalar, Size},
    imgproc::{self, FILLED, FONT_HERSHEY_SIMPLEX, LINE_8},
    prelude::*,
};
use std::path::Path;

const GUIDANCE_TEXT_ORIGIN: (i32, i32) = (50, 50);
const DISTANCE_TEXT_ORIGIN: (i32, i32) = (50, 100);
const LANDMARK_RADIUS: i32 = 5;
const HAND_BOX_THICKNESS: i32 = 4;
/// Horizontal offset of the glyph from the hand box center
const GLYPH_CENTER_OFFSET: i32 = 20;
/// Vertical padding of the glyph inside the label box
const GLYPH_TOP_PADDING: i32 = 5;

fn distance_color() -> Scalar {
    Scalar::new(255.0, 0.0, 0.0, 0.0) // Blue
}

fn hand_box_color() -> Scalar {
    Scalar::new(255.0, 0.0, 255.0, 0.0) // Magenta
}

fn landmark_color() -> Scalar {
    Scalar::new(0.0, 255.0, 0.0, 0.0) // Green
}

fn connection_color() -> Scalar {
    Scalar::new(255.0, 0.0, 0.0, 0.0) // Blue
}

/// Everything drawn for the primary hand of one frame
#[derive(Debug, Clone, Copy)]
pub struct HandOverlay<'a> {
    /// Hand bounding box (before margin expansion)
    pub bbox: Rect,
    /// Landmarks in detector order
    pub landmarks: &'a [Point3f],
    /// Guidance state and the distance it was derived from
    pub guidance: Option<(GuidanceState, f64)>,
    /// Classified glyph; `None` outside classification mode or when skipped
    pub glyph: Option<&'a str>,
}

enum GlyphFont {
    TrueType(FontArc),
    Hershey,
}

/// Draws overlays in a fixed order: guidance text, distance text, hand box,
/// landmark dots, landmark connections, then the glyph label box.
pub struct OverlayRenderer {
    font: GlyphFont,
    font_size: f32,
    margin: i32,
}

impl OverlayRenderer {
    /// Create a renderer, loading the glyph font from `font_path`.
    ///
    /// A missing or unreadable font is not an error: a warning is logged and
    /// labels are drawn with `OpenCV`'s built-in font instead.
    #[must_use]
    pub fn new(font_path: Option<&Path>, font_size: f32, margin: i32) -> Self {
        let font = match font_path.map(Self::load_font) {
            Some(Ok(font)) => GlyphFont::TrueType(font),
            Some(Err(e)) => {
                warn!("Glyph font unavailable ({e}). Using default font.");
                GlyphFont::Hershey
            }
            None => {
                warn!("No glyph font configured. Using default font.");
                GlyphFont::Hershey
            }
        };
        Self {
            font,
            font_size,
            margin,
        }
    }

    /// Renderer that always uses the built-in `OpenCV` font
    #[must_use]
    pub fn with_default_font(margin: i32) -> Self {
        Self {
            font: GlyphFont::Hershey,
            font_size: DEFAULT_FONT_SIZE,
            margin,
        }
    }

    /// Read a TrueType/OpenType font file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid font
    pub fn load_font<P: AsRef<Path>>(path: P) -> Result<FontArc> {
        let bytes = std::fs::read(path.as_ref())
            .map_err(|e| Error::Font(format!("{}: {e}", path.as_ref().display())))?;
        FontArc::try_from_vec(bytes).map_err(|e| Error::Font(format!("{}: {e}", path.as_ref().display())))
    }

    /// Whether labels fall back to the built-in font
    #[must_use]
    pub fn uses_default_font(&self) -> bool {
        matches!(self.font, GlyphFont::Hershey)
    }

    /// Crop margin used for the hand box and label box geometry
    #[must_use]
    pub fn margin(&self) -> i32 {
        self.margin
    }

    /// Draw the overlay for one frame. With no hand the frame is left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if an `OpenCV` drawing or conversion call fails
    pub fn render(&self, frame: &mut Mat, overlay: Option<&HandOverlay<'_>>) -> Result<()> {
        let Some(overlay) = overlay else {
            return Ok(());
        };

        if let Some((state, distance_cm)) = overlay.guidance {
            self.draw_guidance(frame, state, distance_cm)?;
        }
        self.draw_hand(frame, overlay.bbox, overlay.landmarks)?;
        if let Some(glyph) = overlay.glyph {
            self.draw_label(frame, overlay.bbox, glyph)?;
        }
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn draw_guidance(&self, frame: &mut Mat, state: GuidanceState, distance_cm: f64) -> Result<()> {
        imgproc::put_text(
            frame,
            state.message(),
            Point::new(GUIDANCE_TEXT_ORIGIN.0, GUIDANCE_TEXT_ORIGIN.1),
            FONT_HERSHEY_SIMPLEX,
            1.0,
            state.color(),
            2,
            LINE_8,
            false,
        )?;

        let distance_text = format!("Distance: {} cm", distance_cm.trunc() as i64);
        imgproc::put_text(
            frame,
            &distance_text,
            Point::new(DISTANCE_TEXT_ORIGIN.0, DISTANCE_TEXT_ORIGIN.1),
            FONT_HERSHEY_SIMPLEX,
            1.0,
            distance_color(),
            2,
            LINE_8,
            false,
        )?;
        Ok(())
    }

    fn draw_hand(&self, frame: &mut Mat, bbox: Rect, landmarks: &[Point3f]) -> Result<()> {
        imgproc::rectangle(
            frame,
            expand(bbox, self.margin),
            hand_box_color(),
            HAND_BOX_THICKNESS,
            LINE_8,
            0,
        )?;

        for landmark in landmarks {
            imgproc::circle(
                frame,
                to_pixel(landmark),
                LANDMARK_RADIUS,
                landmark_color(),
                FILLED,
                LINE_8,
                0,
            )?;
        }

        for pair in landmarks.windows(2) {
            imgproc::line(
                frame,
                to_pixel(&pair[0]),
                to_pixel(&pair[1]),
                connection_color(),
                2,
                LINE_8,
                0,
            )?;
        }
        Ok(())
    }

    fn draw_label(&self, frame: &mut Mat, bbox: Rect, glyph: &str) -> Result<()> {
        let Some(region) = label_box(bbox, self.margin, frame.size()?) else {
            debug!("Label box for {bbox:?} falls outside the frame, skipping");
            return Ok(());
        };
        let text_x = bbox.x.saturating_add(bbox.width / 2).saturating_sub(GLYPH_CENTER_OFFSET);

        match &self.font {
            GlyphFont::TrueType(font) => self.draw_glyph_truetype(frame, region, text_x - region.x, font, glyph),
            GlyphFont::Hershey => {
                imgproc::rectangle(frame, region, Scalar::all(0.0), FILLED, LINE_8, 0)?;
                imgproc::put_text(
                    frame,
                    glyph,
                    Point::new(text_x, region.y + region.height - GLYPH_TOP_PADDING * 2),
                    FONT_HERSHEY_SIMPLEX,
                    1.0,
                    Scalar::all(255.0),
                    2,
                    LINE_8,
                    false,
                )?;
                Ok(())
            }
        }
    }

    /// Composite the glyph in RGB space, limited to `region`
    #[allow(clippy::cast_sign_loss)] // region is non-empty
    fn draw_glyph_truetype(
        &self,
        frame: &mut Mat,
        region: Rect,
        text_x: i32,
        font: &FontArc,
        glyph: &str,
    ) -> Result<()> {
        let patch = Mat::roi(&*frame, region)?.try_clone()?;
        let mut canvas = mat_to_rgb_image(&patch)?;

        draw_filled_rect_mut(
            &mut canvas,
            PixelRect::at(0, 0).of_size(region.width as u32, region.height as u32),
            Rgb([0, 0, 0]),
        );
        draw_text_mut(
            &mut canvas,
            Rgb([255, 255, 255]),
            text_x,
            GLYPH_TOP_PADDING,
            PxScale::from(self.font_size),
            font,
            glyph,
        );

        let composited = rgb_image_to_mat(&canvas)?;
        let mut roi = frame.roi_mut(region)?;
        composited.copy_to(&mut roi)?;
        Ok(())
    }
}

/// Grow a rectangle by `margin` on every side
#[must_use]
pub fn expand(bbox: Rect, margin: i32) -> Rect {
    Rect::new(
        bbox.x.saturating_sub(margin),
        bbox.y.saturating_sub(margin),
        bbox.width.saturating_add(margin.saturating_mul(2)),
        bbox.height.saturating_add(margin.saturating_mul(2)),
    )
}

/// Label box directly above the margin-expanded hand box, clamped to the frame.
///
/// When the hand is near the top edge the box slides down to stay fully
/// visible. Returns `None` if nothing of it would be on screen.
#[must_use]
pub fn label_box(bbox: Rect, margin: i32, frame_size: Size) -> Option<Rect> {
    let height = LABEL_BOX_OFFSET_TOP - LABEL_BOX_OFFSET_BOTTOM;
    let top = bbox
        .y
        .saturating_sub(margin)
        .saturating_sub(LABEL_BOX_OFFSET_TOP)
        .max(0);
    let bottom = top.saturating_add(height).min(frame_size.height);
    let left = bbox.x.saturating_sub(margin).max(0);
    let right = bbox
        .x
        .saturating_add(bbox.width)
        .saturating_add(margin)
        .min(frame_size.width);

    if right <= left || bottom <= top {
        return None;
    }
    Some(Rect::new(left, top, right - left, bottom - top))
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{Vec3b, CV_8UC3};

    const FRAME: Size = Size {
        width: 640,
        height: 480,
    };

    fn blank_frame() -> Mat {
        Mat::new_rows_cols_with_default(480, 640, CV_8UC3, Scalar::all(128.0)).unwrap()
    }

    fn pixel(frame: &Mat, x: i32, y: i32) -> Vec3b {
        *frame.at_2d::<Vec3b>(y, x).unwrap()
    }

    #[test]
    fn test_label_box_above_hand() {
        let region = label_box(Rect::new(200, 200, 100, 120), 20, FRAME).unwrap();
        assert_eq!(region, Rect::new(180, 130, 140, 40));
    }

    #[test]
    fn test_label_box_slides_down_at_top_edge() {
        let region = label_box(Rect::new(200, 10, 100, 120), 20, FRAME).unwrap();
        assert_eq!(region.y, 0);
        assert_eq!(region.height, 40);
    }

    #[test]
    fn test_label_box_outside_frame() {
        assert!(label_box(Rect::new(1000, 200, 50, 50), 20, FRAME).is_none());
        assert!(label_box(Rect::new(100, 100, 50, 50), 20, Size::new(0, 0)).is_none());
    }

    #[test]
    fn test_expand() {
        assert_eq!(expand(Rect::new(10, 20, 30, 40), 5), Rect::new(5, 15, 40, 50));
    }

    #[test]
    fn test_no_hand_leaves_frame_untouched() {
        let renderer = OverlayRenderer::with_default_font(20);
        let original = blank_frame();
        let mut frame = original.try_clone().unwrap();
        renderer.render(&mut frame, None).unwrap();
        assert_eq!(frame.data_bytes().unwrap(), original.data_bytes().unwrap());
    }

    #[test]
    fn test_landmark_dot_is_green() {
        let renderer = OverlayRenderer::with_default_font(20);
        let mut frame = blank_frame();
        let landmarks = [Point3f::new(320.0, 240.0, 0.0)];
        let overlay = HandOverlay {
            bbox: Rect::new(300, 220, 40, 40),
            landmarks: &landmarks,
            guidance: None,
            glyph: None,
        };
        renderer.render(&mut frame, Some(&overlay)).unwrap();
        assert_eq!(pixel(&frame, 320, 240), Vec3b::from_array([0, 255, 0]));
        // Hand box outline, expanded by the margin
        assert_eq!(pixel(&frame, 280, 250), Vec3b::from_array([255, 0, 255]));
        // Far from every overlay
        assert_eq!(pixel(&frame, 600, 450), Vec3b::from_array([128, 128, 128]));
    }

    #[test]
    fn test_guidance_text_drawn() {
        let renderer = OverlayRenderer::with_default_font(20);
        let original = blank_frame();
        let mut frame = original.try_clone().unwrap();
        let overlay = HandOverlay {
            bbox: Rect::new(400, 300, 50, 50),
            landmarks: &[],
            guidance: Some((GuidanceState::GoodPosition, 35.2)),
            glyph: None,
        };
        renderer.render(&mut frame, Some(&overlay)).unwrap();

        let top_band = Mat::roi(&frame, Rect::new(40, 20, 300, 90)).unwrap().try_clone().unwrap();
        let original_band = Mat::roi(&original, Rect::new(40, 20, 300, 90)).unwrap().try_clone().unwrap();
        assert_ne!(top_band.data_bytes().unwrap(), original_band.data_bytes().unwrap());
    }

    #[test]
    fn test_default_font_label_box() {
        let renderer = OverlayRenderer::with_default_font(20);
        assert!(renderer.uses_default_font());
        let mut frame = blank_frame();
        let overlay = HandOverlay {
            bbox: Rect::new(200, 200, 100, 120),
            landmarks: &[],
            guidance: None,
            glyph: Some("?"),
        };
        renderer.render(&mut frame, Some(&overlay)).unwrap();
        // Label box corner is filled black
        assert_eq!(pixel(&frame, 182, 132), Vec3b::from_array([0, 0, 0]));
        assert_eq!(pixel(&frame, 10, 10), Vec3b::from_array([128, 128, 128]));
    }

    #[test]
    fn test_missing_font_falls_back() {
        let renderer = OverlayRenderer::new(Some(Path::new("/nonexistent/font.ttf")), 40.0, 20);
        assert!(renderer.uses_default_font());
        assert!(matches!(
            OverlayRenderer::load_font("/nonexistent/font.ttf"),
            Err(Error::Font(_))
        ));
    }

    #[test]
    fn test_corrupt_font_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"not a font").unwrap();
        let renderer = OverlayRenderer::new(Some(&path), 40.0, 20);
        assert!(renderer.uses_default_font());
    }

    const FIXTURE_FONT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/DejaVuSans.ttf");

    #[test]
    fn test_truetype_label_only_touches_label_box() {
        let renderer = OverlayRenderer::new(Some(Path::new(FIXTURE_FONT)), 40.0, 20);
        assert!(!renderer.uses_default_font());

        let original = blank_frame();
        let mut frame = original.try_clone().unwrap();
        let bbox = Rect::new(200, 200, 100, 120);
        renderer.draw_label(&mut frame, bbox, "A").unwrap();

        let region = label_box(bbox, 20, FRAME).unwrap();
        let mut glyph_pixels = 0;
        for y in 0..480 {
            for x in 0..640 {
                let p = pixel(&frame, x, y);
                if region.contains(Point::new(x, y)) {
                    if p[0] > 200 && p[1] > 200 && p[2] > 200 {
                        glyph_pixels += 1;
                    }
                } else {
                    assert_eq!(p, pixel(&original, x, y), "pixel ({x}, {y}) outside the label box changed");
                }
            }
        }
        assert_eq!(pixel(&frame, region.x, region.y), Vec3b::from_array([0, 0, 0]));
        assert!(glyph_pixels > 0, "glyph was not drawn");
    }

    #[test]
    fn test_truetype_label_at_top_edge() {
        let renderer = OverlayRenderer::new(Some(Path::new(FIXTURE_FONT)), 40.0, 20);
        let mut frame = blank_frame();
        let bbox = Rect::new(600, 0, 80, 80);
        renderer.draw_label(&mut frame, bbox, "A").unwrap();

        let region = label_box(bbox, 20, FRAME).unwrap();
        assert_eq!(region, Rect::new(580, 0, 60, 40));
        assert_eq!(pixel(&frame, 581, 1), Vec3b::from_array([0, 0, 0]));
        assert_eq!(pixel(&frame, 579, 1), Vec3b::from_array([128, 128, 128]));
    }
}

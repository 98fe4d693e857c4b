use crate::bounding_box::{BoxCorners, Prediction};
use crate::config::AnnotationConfig;
use ab_glyph::{FontVec, PxScale};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnnotateError {
    #[error("failed to read font file {path}: {source}")]
    FontRead {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse font file {0}")]
    FontParse(String),
}

/// Draws prediction boxes and class labels onto uploaded images. The font is
/// loaded once at startup from the configured path.
pub struct Annotator {
    font: FontVec,
    stroke_width: u32,
    font_scale: PxScale,
    color: Rgb<u8>,
}

impl Annotator {
    pub fn new(config: &AnnotationConfig) -> Result<Self, AnnotateError> {
        let font_data =
            std::fs::read(&config.font_path).map_err(|source| AnnotateError::FontRead {
                path: config.font_path.display().to_string(),
                source,
            })?;
        let font = FontVec::try_from_vec(font_data)
            .map_err(|_| AnnotateError::FontParse(config.font_path.display().to_string()))?;

        Ok(Self {
            font,
            stroke_width: config.stroke_width,
            font_scale: PxScale::from(config.font_size),
            color: Rgb(config.box_color),
        })
    }

    /// Draws every prediction onto a fresh copy; the caller's image is never
    /// mutated. Labels sit at the box's top-left corner.
    pub fn annotate(&self, image: &DynamicImage, predictions: &[Prediction]) -> RgbImage {
        let mut canvas = image.to_rgb8();

        for prediction in predictions {
            let corners = prediction.corners();
            draw_box_outline(&mut canvas, &corners, self.stroke_width, self.color);
            draw_text_mut(
                &mut canvas,
                self.color,
                corners.x1 as i32,
                corners.y1 as i32,
                self.font_scale,
                &self.font,
                &prediction.class_label,
            );
        }

        canvas
    }
}

fn draw_box_outline(canvas: &mut RgbImage, corners: &BoxCorners, stroke_width: u32, color: Rgb<u8>) {
    // A degenerate box collapses to a 1px rectangle instead of panicking.
    let width = (corners.x2 - corners.x1).round().max(1.0) as u32;
    let height = (corners.y2 - corners.y1).round().max(1.0) as u32;
    let base = Rect::at(corners.x1 as i32, corners.y1 as i32).of_size(width, height);

    for i in 0..stroke_width {
        let ring = Rect::at(base.left() - i as i32, base.top() - i as i32)
            .of_size(base.width() + 2 * i, base.height() + 2 * i);
        draw_hollow_rect_mut(canvas, ring, color);
    }
}

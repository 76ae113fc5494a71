use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::{DynamicImage, Rgb};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use crate::config::StageLabels;
use crate::error::{PipelineError, Result};
use crate::models::FlowerObservation;

const TEXT_HEIGHT: f32 = 16.0;

/// Draws detection boxes and stage labels onto a copy of the source
/// image. The box color comes from the injected label table; the
/// original image is never mutated.
pub struct Annotator {
    labels: StageLabels,
    font: Option<FontVec>,
}

impl Annotator {
    pub fn new(labels: StageLabels) -> Self {
        Self { labels, font: None }
    }

    /// Load a TTF/OTF font for label text. Without a font only the
    /// boxes are drawn.
    pub fn with_font_file(mut self, path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| PipelineError::FontLoad {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;
        let font = FontVec::try_from_vec(bytes).map_err(|e| PipelineError::FontLoad {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;
        self.font = Some(font);
        Ok(self)
    }

    /// Produce a new annotated image. Observations are drawn in order;
    /// later boxes may overlap earlier ones.
    pub fn annotate(
        &self,
        image: &DynamicImage,
        observations: &[FlowerObservation],
    ) -> DynamicImage {
        let mut canvas = image.to_rgb8();

        for obs in observations {
            let color = Rgb(self.labels.color_for(&obs.classification.class_name));
            let bbox = obs
                .detection
                .bbox
                .normalized()
                .clip(canvas.width(), canvas.height());

            let width = bbox.width().round() as u32;
            let height = bbox.height().round() as u32;
            if width == 0 || height == 0 {
                continue;
            }
            let x = bbox.x1.round() as i32;
            let y = bbox.y1.round() as i32;

            // 2px border
            draw_hollow_rect_mut(&mut canvas, Rect::at(x, y).of_size(width, height), color);
            if width > 2 && height > 2 {
                draw_hollow_rect_mut(
                    &mut canvas,
                    Rect::at(x + 1, y + 1).of_size(width - 2, height - 2),
                    color,
                );
            }

            if let Some(font) = &self.font {
                let label = format!(
                    "{} {:.2} (det: {:.2})",
                    obs.classification.class_name,
                    obs.classification.confidence,
                    obs.detection.confidence
                );
                let text_y = (y - TEXT_HEIGHT as i32 - 2).max(0);
                draw_text_mut(
                    &mut canvas,
                    color,
                    x,
                    text_y,
                    PxScale::from(TEXT_HEIGHT),
                    font,
                    &label,
                );
            }
        }

        DynamicImage::ImageRgb8(canvas)
    }
}

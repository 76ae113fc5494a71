use std::path::Path;

use image::DynamicImage;
use rten::Model;
use rten_tensor::prelude::*;
use rten_tensor::NdTensor;
use tracing::{debug, info};

use super::preprocess;
use super::Detector;
use crate::error::{PipelineError, Result};
use crate::models::{BoundingBox, Detection};

/// Square model input size.
const INPUT_SIZE: u32 = 640;
/// IoU threshold for greedy NMS.
const IOU_THRESHOLD: f32 = 0.45;

/// YOLO-style flower region detector backed by a pretrained `.rten`
/// model. Weights are loaded once at construction; a load failure is
/// fatal and surfaces before any image is processed.
pub struct FlowerDetector {
    model: Model,
}

impl FlowerDetector {
    pub fn load(path: &Path) -> Result<Self> {
        info!(model = %path.display(), "loading detection model");
        let model = Model::load_file(path).map_err(|e| PipelineError::model_load(path, e))?;
        Ok(Self { model })
    }
}

impl Detector for FlowerDetector {
    fn detect(&self, image: &DynamicImage, confidence_threshold: f32) -> Result<Vec<Detection>> {
        let (src_w, src_h) = (image.width(), image.height());
        let resized = preprocess::resize_rgb(image, INPUT_SIZE);
        let input = preprocess::to_nchw(&resized);

        let output = self
            .model
            .run_one(input.view().into(), None)
            .map_err(|e| PipelineError::Inference(format!("detector inference failed: {e}")))?;
        let output: NdTensor<f32, 3> = output
            .try_into()
            .map_err(|e| PipelineError::Inference(format!("unexpected detector output: {e}")))?;

        // Output layout: [1, 4 + classes, proposals] with rows
        // cx, cy, w, h followed by one score row per class.
        let [_, rows, proposals] = output.shape();
        if rows < 5 {
            return Err(PipelineError::Inference(format!(
                "detector output has {rows} rows, expected at least 5"
            )));
        }
        let num_classes = rows - 4;

        let scale_x = src_w as f32 / INPUT_SIZE as f32;
        let scale_y = src_h as f32 / INPUT_SIZE as f32;

        let mut candidates = Vec::new();
        for i in 0..proposals {
            let mut score = 0f32;
            for c in 0..num_classes {
                score = score.max(output[[0, 4 + c, i]]);
            }
            if score < confidence_threshold {
                continue;
            }

            let cx = output[[0, 0, i]];
            let cy = output[[0, 1, i]];
            let w = output[[0, 2, i]];
            let h = output[[0, 3, i]];

            let bbox = BoundingBox::new(
                (cx - w / 2.0) * scale_x,
                (cy - h / 2.0) * scale_y,
                (cx + w / 2.0) * scale_x,
                (cy + h / 2.0) * scale_y,
            )
            .clip(src_w, src_h);

            candidates.push(Detection {
                bbox,
                confidence: score,
            });
        }

        let kept = nms(candidates, IOU_THRESHOLD);
        debug!(detections = kept.len(), "detection complete");
        Ok(kept)
    }
}

/// Greedy NMS: sort by confidence descending, suppress overlaps.
fn nms(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    detections.sort_unstable_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<Detection> = Vec::new();
    let mut suppressed = vec![false; detections.len()];

    for i in 0..detections.len() {
        if suppressed[i] {
            continue;
        }
        kept.push(detections[i]);
        for j in (i + 1)..detections.len() {
            if detections[i].bbox.iou(&detections[j].bbox) > iou_threshold {
                suppressed[j] = true;
            }
        }
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(x1: f32, y1: f32, x2: f32, y2: f32, confidence: f32) -> Detection {
        Detection {
            bbox: BoundingBox::new(x1, y1, x2, y2),
            confidence,
        }
    }

    #[test]
    fn nms_suppresses_overlapping_lower_confidence_boxes() {
        let kept = nms(
            vec![
                det(0.0, 0.0, 10.0, 10.0, 0.6),
                det(1.0, 1.0, 11.0, 11.0, 0.9),
                det(50.0, 50.0, 60.0, 60.0, 0.7),
            ],
            0.45,
        );
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].confidence, 0.9);
        assert_eq!(kept[1].confidence, 0.7);
    }

    #[test]
    fn nms_keeps_disjoint_boxes() {
        let kept = nms(
            vec![det(0.0, 0.0, 10.0, 10.0, 0.6), det(20.0, 20.0, 30.0, 30.0, 0.8)],
            0.45,
        );
        assert_eq!(kept.len(), 2);
    }
}

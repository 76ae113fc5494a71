use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageBuffer, Rgb};

use bloomsight::{
    Annotator, BoundingBox, Classification, Classifier, Detection, Detector, FlowerPipeline,
    PipelineConfig, RegionCrop, Result, StageLabels,
};

/// Detector stub that replays a fixed candidate list, honoring the
/// confidence threshold the way the real detector does.
pub struct StubDetector {
    pub detections: Vec<Detection>,
}

impl Detector for StubDetector {
    fn detect(
        &self,
        _image: &DynamicImage,
        confidence_threshold: f32,
    ) -> Result<Vec<Detection>> {
        Ok(self
            .detections
            .iter()
            .copied()
            .filter(|d| d.confidence >= confidence_threshold)
            .collect())
    }
}

/// Classifier stub that assigns every non-empty region the same stage
/// with probability 0.8 and splits the remainder over the other labels.
/// Empty regions short-circuit to the unknown outcome, as the contract
/// requires.
pub struct StubClassifier {
    pub stage: String,
}

impl Classifier for StubClassifier {
    fn classify(&self, region: &RegionCrop) -> Result<Classification> {
        if region.is_empty() {
            return Ok(Classification::unknown());
        }
        let labels = StageLabels::default();
        let names: Vec<&str> = labels.names().collect();
        let probs: Vec<f32> = names
            .iter()
            .map(|n| if *n == self.stage { 0.8 } else { 0.1 })
            .collect();
        Ok(Classification::from_probs(&names, &probs))
    }
}

pub fn detection(x1: f32, y1: f32, x2: f32, y2: f32, confidence: f32) -> Detection {
    Detection {
        bbox: BoundingBox::new(x1, y1, x2, y2),
        confidence,
    }
}

/// Build a pipeline around stubs; no model files involved.
pub fn stub_pipeline(detections: Vec<Detection>, stage: &str) -> FlowerPipeline {
    FlowerPipeline::from_parts(
        Box::new(StubDetector { detections }),
        Box::new(StubClassifier {
            stage: stage.to_string(),
        }),
        Annotator::new(StageLabels::default()),
        PipelineConfig::default(),
    )
}

pub fn stub_pipeline_with_config(
    detections: Vec<Detection>,
    stage: &str,
    config: PipelineConfig,
) -> FlowerPipeline {
    FlowerPipeline::from_parts(
        Box::new(StubDetector { detections }),
        Box::new(StubClassifier {
            stage: stage.to_string(),
        }),
        Annotator::new(config.labels.clone()),
        config,
    )
}

/// Write a deterministic gradient PNG and return its path.
pub fn save_test_image(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 60u8])
    });
    let path = dir.join(name);
    img.save_with_format(&path, image::ImageFormat::Png)
        .expect("Failed to save test image");
    path
}

/// Write a file with an image extension that is not a decodable image.
pub fn save_corrupt_image(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"definitely not an image").expect("Failed to write corrupt file");
    path
}

use std::path::Path;

use rten::Model;
use rten_tensor::prelude::*;
use rten_tensor::NdTensor;
use tracing::info;

use super::preprocess;
use super::Classifier;
use crate::config::StageLabels;
use crate::error::{PipelineError, Result};
use crate::models::{Classification, RegionCrop};

/// Square classifier input size.
const INPUT_SIZE: u32 = 224;
/// Tolerance for deciding whether the model output is already a
/// probability distribution.
const PROB_SUM_TOLERANCE: f32 = 1e-3;

/// Readiness-stage classifier backed by a pretrained `.rten` CNN.
///
/// The label set is fixed at construction; every outcome maps the same
/// labels. Crops are handed over in memory — there is no temp-file
/// round trip between extraction and classification.
pub struct CnnClassifier {
    model: Model,
    labels: StageLabels,
}

impl CnnClassifier {
    pub fn load(path: &Path, labels: StageLabels) -> Result<Self> {
        info!(model = %path.display(), "loading classification model");
        let model = Model::load_file(path).map_err(|e| PipelineError::model_load(path, e))?;
        Ok(Self { model, labels })
    }
}

impl Classifier for CnnClassifier {
    fn classify(&self, region: &RegionCrop) -> Result<Classification> {
        // Empty regions are unclassifiable by design, not an error.
        let pixels = match region.pixels() {
            Some(pixels) => pixels,
            None => return Ok(Classification::unknown()),
        };

        let resized = preprocess::resize_rgb(pixels, INPUT_SIZE);
        let input = preprocess::to_nchw(&resized);

        let output = self
            .model
            .run_one(input.view().into(), None)
            .map_err(|e| PipelineError::Inference(format!("classifier inference failed: {e}")))?;
        let output: NdTensor<f32, 2> = output
            .try_into()
            .map_err(|e| PipelineError::Inference(format!("unexpected classifier output: {e}")))?;

        let [_, classes] = output.shape();
        if classes < self.labels.len() {
            return Err(PipelineError::Inference(format!(
                "classifier emits {classes} classes but {} labels are configured",
                self.labels.len()
            )));
        }

        let mut probs: Vec<f32> = (0..self.labels.len()).map(|c| output[[0, c]]).collect();

        // Exported models may or may not bake in a final softmax.
        let sum: f32 = probs.iter().sum();
        if (sum - 1.0).abs() > PROB_SUM_TOLERANCE {
            preprocess::softmax(&mut probs);
        }

        let names: Vec<&str> = self.labels.names().collect();
        Ok(Classification::from_probs(&names, &probs))
    }
}

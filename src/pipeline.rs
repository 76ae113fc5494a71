use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use image::{DynamicImage, ImageReader};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::annotate::Annotator;
use crate::config::{BatchPolicy, PipelineConfig, SUPPORTED_EXTENSIONS};
use crate::detection::{region, Classifier, CnnClassifier, Detector, FlowerDetector};
use crate::error::{PipelineError, Result};
use crate::models::{FlowerObservation, ImageResult};
use crate::stats::{self, BatchStatistics};

/// Best-effort batch cancellation. Cancellation is only observed
/// between images, never mid-image: an image that has started
/// processing always runs to completion.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// One image that failed during batch processing.
#[derive(Debug)]
pub struct BatchFailure {
    pub path: PathBuf,
    pub error: PipelineError,
}

/// Outcome of a batch run: per-image results in directory order, plus
/// the images that were skipped under [`BatchPolicy::SkipAndContinue`].
#[derive(Debug)]
pub struct BatchOutcome {
    pub results: Vec<(PathBuf, ImageResult)>,
    pub failures: Vec<BatchFailure>,
}

/// Two-stage flower pipeline: detect regions, crop each one, classify
/// its readiness stage, and draw an annotated overlay.
///
/// Both models are loaded once at construction and used read-only
/// afterwards, so one pipeline can serve a parallel batch without
/// extra synchronisation.
pub struct FlowerPipeline {
    detector: Box<dyn Detector>,
    classifier: Box<dyn Classifier>,
    annotator: Annotator,
    config: PipelineConfig,
}

impl FlowerPipeline {
    /// Load both pretrained models and build the pipeline. A model (or
    /// configured font) that fails to load is fatal: the error is
    /// raised here, once, and the pipeline is never constructed.
    pub fn new(
        detector_path: &Path,
        classifier_path: &Path,
        config: PipelineConfig,
    ) -> Result<Self> {
        let detector = FlowerDetector::load(detector_path)?;
        let classifier = CnnClassifier::load(classifier_path, config.labels.clone())?;

        let mut annotator = Annotator::new(config.labels.clone());
        if let Some(font) = &config.font_path {
            annotator = annotator.with_font_file(font)?;
        }

        info!("pipeline ready");
        Ok(Self::from_parts(
            Box::new(detector),
            Box::new(classifier),
            annotator,
            config,
        ))
    }

    /// Assemble a pipeline from already-built components. This is the
    /// seam tests use to substitute stub detectors and classifiers.
    pub fn from_parts(
        detector: Box<dyn Detector>,
        classifier: Box<dyn Classifier>,
        annotator: Annotator,
        config: PipelineConfig,
    ) -> Self {
        Self {
            detector,
            classifier,
            annotator,
            config,
        }
    }

    /// Run the full chain on one image file. Decode failures surface
    /// as [`PipelineError::ImageLoad`].
    pub fn process_image(&self, path: &Path) -> Result<ImageResult> {
        let image = load_image(path)?;
        self.process_decoded(&image)
    }

    /// Run the full chain on an already-decoded image.
    ///
    /// Zero detections produce a valid result with no observations and
    /// an annotated image pixel-equal to the input.
    pub fn process_decoded(&self, image: &DynamicImage) -> Result<ImageResult> {
        let detections = self
            .detector
            .detect(image, self.config.confidence_threshold)?;
        debug!(detections = detections.len(), "running classification");

        let mut observations = Vec::with_capacity(detections.len());
        for detection in detections {
            let crop = region::extract(image, &detection.bbox);
            let classification = self.classifier.classify(&crop)?;
            observations.push(FlowerObservation {
                detection,
                classification,
                crop,
            });
        }

        let annotated = self.annotator.annotate(image, &observations);
        Ok(ImageResult {
            observations,
            annotated,
        })
    }

    /// Process every supported image file in a directory.
    pub fn process_batch(&self, dir: &Path) -> Result<BatchOutcome> {
        self.process_batch_with(dir, &CancelToken::new())
    }

    /// Process a directory, checking `cancel` before each image.
    /// Images run in parallel across a worker pool; the models are
    /// shared read-only.
    pub fn process_batch_with(&self, dir: &Path, cancel: &CancelToken) -> Result<BatchOutcome> {
        let mut files = list_images(dir)?;
        files.sort();
        info!(images = files.len(), dir = %dir.display(), "processing batch");

        let processed: Vec<(PathBuf, Result<ImageResult>)> = files
            .into_par_iter()
            .filter_map(|path| {
                if cancel.is_cancelled() {
                    return None;
                }
                debug!(image = %path.display(), "processing");
                let result = self.process_image(&path);
                Some((path, result))
            })
            .collect();

        let mut results = Vec::new();
        let mut failures = Vec::new();
        for (path, outcome) in processed {
            match outcome {
                Ok(result) => results.push((path, result)),
                Err(error) => match self.config.batch_policy {
                    BatchPolicy::Propagate => return Err(error),
                    BatchPolicy::SkipAndContinue => {
                        warn!(image = %path.display(), %error, "skipping image");
                        failures.push(BatchFailure { path, error });
                    }
                },
            }
        }

        Ok(BatchOutcome { results, failures })
    }

    /// Summary statistics over a batch of results. Pure; an empty
    /// slice yields all-zero statistics.
    pub fn get_statistics(&self, results: &[ImageResult]) -> BatchStatistics {
        stats::compute(&self.config.labels, results)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}

fn load_image(path: &Path) -> Result<DynamicImage> {
    let reader = ImageReader::open(path).map_err(|e| PipelineError::image_load(path, e))?;
    reader
        .decode()
        .map_err(|e| PipelineError::image_load(path, e))
}

fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| PipelineError::image_load(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PipelineError::image_load(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let supported = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if supported {
            files.push(path);
        }
    }
    Ok(files)
}

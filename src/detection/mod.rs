pub mod classifier;
pub mod detector;
pub mod preprocess;
pub mod region;

pub use classifier::CnnClassifier;
pub use detector::FlowerDetector;

use crate::error::Result;
use crate::models::{Classification, Detection, RegionCrop};
use image::DynamicImage;

/// Finds candidate flower regions in a full image.
///
/// Implementations must be safe for concurrent read-only use: batch
/// processing shares one detector across a worker pool.
pub trait Detector: Send + Sync {
    /// Return every candidate with confidence at or above
    /// `confidence_threshold`, in emission order. There is no upper
    /// bound on the candidate count.
    fn detect(&self, image: &DynamicImage, confidence_threshold: f32) -> Result<Vec<Detection>>;
}

/// Classifies one cropped region into a readiness stage.
///
/// An empty region must short-circuit to [`Classification::unknown`]
/// without invoking any model. Each region is classified independently
/// of every other region.
pub trait Classifier: Send + Sync {
    fn classify(&self, region: &RegionCrop) -> Result<Classification>;
}

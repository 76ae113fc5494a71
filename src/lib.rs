pub mod annotate;
pub mod config;
pub mod detection;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod stats;

pub use annotate::Annotator;
pub use config::{BatchPolicy, PipelineConfig, StageLabel, StageLabels, SUPPORTED_EXTENSIONS};
pub use detection::{Classifier, CnnClassifier, Detector, FlowerDetector};
pub use error::{PipelineError, Result};
pub use models::{
    BoundingBox, Classification, Detection, FlowerObservation, ImageResult, RegionCrop,
};
pub use pipeline::{BatchFailure, BatchOutcome, CancelToken, FlowerPipeline};
pub use stats::BatchStatistics;

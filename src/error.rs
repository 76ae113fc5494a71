use std::path::PathBuf;
use thiserror::Error;

type Source = Box<dyn std::error::Error + Send + Sync>;

/// Errors produced by the pipeline.
///
/// `ModelLoad` and `FontLoad` can only occur at construction and leave
/// the pipeline unusable; `ImageLoad` is per-call and recoverable
/// (batch mode records it and continues). Empty crop regions are not
/// errors at all — they degrade to the unknown classification.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to load model from {path}")]
    ModelLoad {
        path: PathBuf,
        #[source]
        source: Source,
    },

    #[error("failed to load image {path}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: Source,
    },

    #[error("failed to load font {path}")]
    FontLoad {
        path: PathBuf,
        #[source]
        source: Source,
    },

    #[error("inference failed: {0}")]
    Inference(String),
}

impl PipelineError {
    pub(crate) fn model_load(
        path: impl Into<PathBuf>,
        source: impl Into<Source>,
    ) -> Self {
        Self::ModelLoad {
            path: path.into(),
            source: source.into(),
        }
    }

    pub(crate) fn image_load(
        path: impl Into<PathBuf>,
        source: impl Into<Source>,
    ) -> Self {
        Self::ImageLoad {
            path: path.into(),
            source: source.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

use std::path::PathBuf;

/// File suffixes considered images when scanning a batch directory.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// One readiness stage: its label and the annotation color (RGB).
#[derive(Debug, Clone)]
pub struct StageLabel {
    pub name: String,
    pub color: [u8; 3],
}

impl StageLabel {
    pub fn new(name: impl Into<String>, color: [u8; 3]) -> Self {
        Self {
            name: name.into(),
            color,
        }
    }
}

/// The ordered, fixed set of readiness-stage labels the classifier can
/// emit, plus which of them counts as "receptive" for statistics.
///
/// The set is injected configuration: adding a stage means adding a
/// table entry, not touching classification or annotation logic.
#[derive(Debug, Clone)]
pub struct StageLabels {
    stages: Vec<StageLabel>,
    receptive: String,
}

impl StageLabels {
    pub fn new(stages: Vec<StageLabel>, receptive: impl Into<String>) -> Self {
        Self {
            stages,
            receptive: receptive.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|s| s.name.as_str())
    }

    /// Label name for a class index, if the index is known.
    pub fn name(&self, index: usize) -> Option<&str> {
        self.stages.get(index).map(|s| s.name.as_str())
    }

    /// Annotation color for a label; unknown labels draw in white.
    pub fn color_for(&self, name: &str) -> [u8; 3] {
        self.stages
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.color)
            .unwrap_or([255, 255, 255])
    }

    /// The label designated as "ready for pollination".
    pub fn receptive(&self) -> &str {
        &self.receptive
    }
}

impl Default for StageLabels {
    fn default() -> Self {
        Self::new(
            vec![
                StageLabel::new("bud", [255, 165, 0]),
                StageLabel::new("open", [0, 255, 0]),
                StageLabel::new("post-pollination", [255, 0, 0]),
            ],
            "open",
        )
    }
}

/// What to do when one image in a batch fails to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchPolicy {
    /// Record the failure and keep processing the remaining images.
    #[default]
    SkipAndContinue,
    /// Surface the first failure and stop.
    Propagate,
}

/// Pipeline construction options.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub labels: StageLabels,
    /// Detections below this confidence are discarded.
    pub confidence_threshold: f32,
    pub batch_policy: BatchPolicy,
    /// TTF/OTF font for annotation text. Without one, boxes are still
    /// drawn but labels are not rendered.
    pub font_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            labels: StageLabels::default(),
            confidence_threshold: 0.5,
            batch_policy: BatchPolicy::default(),
            font_path: None,
        }
    }
}

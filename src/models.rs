use image::DynamicImage;
use std::collections::HashMap;

/// Axis-aligned bounding box in pixel coordinates of the source image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    /// Reorder corners so that x1 <= x2 and y1 <= y2.
    /// Malformed boxes are repaired, never rejected.
    pub fn normalized(&self) -> Self {
        Self {
            x1: self.x1.min(self.x2),
            y1: self.y1.min(self.y2),
            x2: self.x1.max(self.x2),
            y2: self.y1.max(self.y2),
        }
    }

    /// Clamp the box to an image of the given dimensions.
    /// The result may have zero width or height if the box lies
    /// entirely outside the image.
    pub fn clip(&self, image_width: u32, image_height: u32) -> Self {
        let w = image_width as f32;
        let h = image_height as f32;
        Self {
            x1: self.x1.clamp(0.0, w),
            y1: self.y1.clamp(0.0, h),
            x2: self.x2.clamp(0.0, w),
            y2: self.y2.clamp(0.0, h),
        }
    }

    /// Intersection over union with another box.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);
        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }
        let union = self.width() * self.height() + other.width() * other.height() - inter;
        inter / union
    }
}

/// One candidate region emitted by the detector: a box plus the
/// model-reported confidence that it contains a flower.
#[derive(Debug, Clone, Copy)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub confidence: f32,
}

/// Readiness-stage prediction for one cropped region.
///
/// `class_probs` maps every known stage label to its probability; the
/// values sum to 1 within floating-point tolerance and `confidence`
/// equals the probability of `class_name`.
#[derive(Debug, Clone)]
pub struct Classification {
    pub class_name: String,
    pub confidence: f32,
    pub class_probs: HashMap<String, f32>,
}

impl Classification {
    /// The degenerate outcome for regions that could not be classified
    /// (empty crops). Not an error.
    pub fn unknown() -> Self {
        Self {
            class_name: "unknown".to_string(),
            confidence: 0.0,
            class_probs: HashMap::new(),
        }
    }

    /// Build an outcome from an ordered label list and a matching
    /// probability vector. The top class becomes `class_name`.
    pub fn from_probs<S: AsRef<str>>(labels: &[S], probs: &[f32]) -> Self {
        debug_assert_eq!(labels.len(), probs.len());

        let mut class_probs = HashMap::with_capacity(labels.len());
        let mut top_index = 0;
        let mut top_prob = f32::MIN;
        for (i, (label, &p)) in labels.iter().zip(probs).enumerate() {
            class_probs.insert(label.as_ref().to_string(), p);
            if p > top_prob {
                top_prob = p;
                top_index = i;
            }
        }

        match labels.get(top_index) {
            Some(label) => Self {
                class_name: label.as_ref().to_string(),
                confidence: top_prob,
                class_probs,
            },
            None => Self::unknown(),
        }
    }
}

/// Cropped pixels for one detection, or an explicit marker for a box
/// whose clipped area is zero. Empty regions degrade to the unknown
/// classification downstream instead of raising.
#[derive(Debug, Clone)]
pub enum RegionCrop {
    Pixels(DynamicImage),
    Empty,
}

impl RegionCrop {
    pub fn is_empty(&self) -> bool {
        matches!(self, RegionCrop::Empty)
    }

    pub fn pixels(&self) -> Option<&DynamicImage> {
        match self {
            RegionCrop::Pixels(img) => Some(img),
            RegionCrop::Empty => None,
        }
    }
}

/// One detected flower: the detection, its readiness classification and
/// the crop that was classified. Scoped to a single pipeline invocation.
#[derive(Debug, Clone)]
pub struct FlowerObservation {
    pub detection: Detection,
    pub classification: Classification,
    pub crop: RegionCrop,
}

/// Everything the pipeline produces for one image. Observations follow
/// the detector's emission order.
#[derive(Debug)]
pub struct ImageResult {
    pub observations: Vec<FlowerObservation>,
    pub annotated: DynamicImage,
}

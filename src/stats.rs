use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::StageLabels;
use crate::models::ImageResult;

/// Summary statistics over a batch of image results. Derived and
/// read-only: always recomputed from the results, never updated
/// incrementally.
#[derive(Debug, Clone, Serialize)]
pub struct BatchStatistics {
    pub total_flowers: usize,
    pub class_distribution: BTreeMap<String, usize>,
    pub avg_detection_confidence: f32,
    pub avg_classification_confidence: f32,
    pub receptive_flowers: usize,
    /// Percentage of observations labelled with the receptive stage.
    pub receptivity_rate: f32,
}

/// Pure fold over a batch of results. All means and rates are defined
/// as 0 when there are no observations.
pub fn compute(labels: &StageLabels, results: &[ImageResult]) -> BatchStatistics {
    let mut class_distribution: BTreeMap<String, usize> =
        labels.names().map(|n| (n.to_string(), 0)).collect();

    let mut total = 0usize;
    let mut det_sum = 0f32;
    let mut clf_sum = 0f32;

    for result in results {
        for obs in &result.observations {
            total += 1;
            *class_distribution
                .entry(obs.classification.class_name.clone())
                .or_insert(0) += 1;
            det_sum += obs.detection.confidence;
            clf_sum += obs.classification.confidence;
        }
    }

    let receptive = class_distribution
        .get(labels.receptive())
        .copied()
        .unwrap_or(0);

    BatchStatistics {
        total_flowers: total,
        avg_detection_confidence: if total > 0 { det_sum / total as f32 } else { 0.0 },
        avg_classification_confidence: if total > 0 { clf_sum / total as f32 } else { 0.0 },
        receptive_flowers: receptive,
        receptivity_rate: if total > 0 {
            receptive as f32 / total as f32 * 100.0
        } else {
            0.0
        },
        class_distribution,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        BoundingBox, Classification, Detection, FlowerObservation, RegionCrop,
    };
    use image::DynamicImage;

    fn observation(stage: &str, det_conf: f32, clf_conf: f32) -> FlowerObservation {
        FlowerObservation {
            detection: Detection {
                bbox: BoundingBox::new(0.0, 0.0, 10.0, 10.0),
                confidence: det_conf,
            },
            classification: Classification {
                class_name: stage.to_string(),
                confidence: clf_conf,
                class_probs: Default::default(),
            },
            crop: RegionCrop::Empty,
        }
    }

    fn result(observations: Vec<FlowerObservation>) -> ImageResult {
        ImageResult {
            observations,
            annotated: DynamicImage::new_rgb8(1, 1),
        }
    }

    #[test]
    fn empty_batch_is_all_zeros() {
        let stats = compute(&StageLabels::default(), &[]);
        assert_eq!(stats.total_flowers, 0);
        assert_eq!(stats.receptive_flowers, 0);
        assert_eq!(stats.receptivity_rate, 0.0);
        assert_eq!(stats.avg_detection_confidence, 0.0);
        assert_eq!(stats.avg_classification_confidence, 0.0);
        assert!(stats.class_distribution.values().all(|&c| c == 0));
    }

    #[test]
    fn receptivity_rate_is_open_fraction_in_percent() {
        let mut observations: Vec<_> = (0..3).map(|_| observation("open", 0.9, 0.8)).collect();
        observations.extend((0..7).map(|_| observation("bud", 0.9, 0.8)));
        // Split across two results to exercise the cross-image fold.
        let batch = vec![
            result(observations[..4].to_vec()),
            result(observations[4..].to_vec()),
        ];

        let stats = compute(&StageLabels::default(), &batch);
        assert_eq!(stats.total_flowers, 10);
        assert_eq!(stats.class_distribution["open"], 3);
        assert_eq!(stats.class_distribution["bud"], 7);
        assert_eq!(stats.class_distribution["post-pollination"], 0);
        assert_eq!(stats.receptive_flowers, 3);
        assert!((stats.receptivity_rate - 30.0).abs() < 1e-6);
    }

    #[test]
    fn confidence_means_are_averaged_over_all_observations() {
        let batch = vec![result(vec![
            observation("open", 0.6, 0.4),
            observation("bud", 0.8, 0.6),
        ])];
        let stats = compute(&StageLabels::default(), &batch);
        assert!((stats.avg_detection_confidence - 0.7).abs() < 1e-6);
        assert!((stats.avg_classification_confidence - 0.5).abs() < 1e-6);
    }

    #[test]
    fn unlisted_labels_are_still_counted() {
        let batch = vec![result(vec![observation("unknown", 0.5, 0.0)])];
        let stats = compute(&StageLabels::default(), &batch);
        assert_eq!(stats.total_flowers, 1);
        assert_eq!(stats.class_distribution["unknown"], 1);
    }

    #[test]
    fn statistics_serialize_to_json() {
        let stats = compute(&StageLabels::default(), &[]);
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"total_flowers\":0"));
        assert!(json.contains("\"receptivity_rate\":0.0"));
    }
}

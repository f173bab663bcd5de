//! Average precision computation and the per-class metrics reduction.

use std::collections::BTreeSet;

use crate::accumulator::PredictionStat;
use crate::metrics::f1_score::{calculate_f1, f1_curve};
use crate::metrics::precision_recall::{cumulative_curves, interpolate_at};
use crate::types::ClassMetrics;

/// Confidence at which the summary precision/recall scalars are read off the
/// per-class curves.
const REFERENCE_CONFIDENCE: f64 = 0.1;

/// Compute Average Precision from a precision-recall curve.
///
/// Precision is first made monotonically non-increasing from the right
/// (running maximum from high recall to low recall), then integrated with
/// the step rule over the recall breakpoints. Both slices are indexed by
/// descending-confidence rank.
///
/// # Example
///
/// ```
/// use det_eval::metrics::ap::compute_ap;
///
/// let recall = vec![0.5, 0.5, 1.0];
/// let precision = vec![1.0, 0.5, 2.0 / 3.0];
/// let ap = compute_ap(&recall, &precision);
/// assert!((ap - 5.0 / 6.0).abs() < 1e-6);
/// ```
#[must_use]
pub fn compute_ap(recall: &[f64], precision: &[f64]) -> f64 {
    assert_eq!(
        recall.len(),
        precision.len(),
        "precision/recall curve length mismatch"
    );
    if recall.is_empty() {
        return 0.0;
    }

    // Sentinel points at both ends of the curve
    let mut mrec = Vec::with_capacity(recall.len() + 2);
    mrec.push(0.0);
    mrec.extend_from_slice(recall);
    mrec.push((recall[recall.len() - 1] + 1e-3).min(1.0));

    let mut mpre = Vec::with_capacity(precision.len() + 2);
    mpre.push(0.0);
    mpre.extend_from_slice(precision);
    mpre.push(0.0);

    // Monotone envelope from the right
    for i in (0..mpre.len() - 1).rev() {
        mpre[i] = mpre[i].max(mpre[i + 1]);
    }

    // Step integration over recall breakpoints
    let mut ap = 0.0;
    for i in 0..mrec.len() - 1 {
        if mrec[i + 1] != mrec[i] {
            ap += (mrec[i + 1] - mrec[i]) * mpre[i + 1];
        }
    }

    ap
}

/// Reduce accumulated per-detection statistics to per-class metrics.
///
/// Detections are globally sorted by descending confidence (ties broken by
/// accumulation index, so the reduction is deterministic and independent of
/// image processing order). Classes are the union of predicted and target
/// classes, ascending. A class with zero ground truths or zero predictions
/// gets zero curves and scalars; zero-support classes are additionally
/// excluded from every mean (see [`mean_over_supported`]).
///
/// The `correct` flags of every statistic row must have one entry per IoU
/// threshold; a mismatch is an accumulation bug and panics.
#[must_use]
pub fn ap_per_class(
    stats: &[PredictionStat],
    target_classes: &[u64],
    iou_thresholds: &[f64],
) -> Vec<ClassMetrics> {
    assert!(!iou_thresholds.is_empty(), "no IoU thresholds to evaluate");
    for stat in stats {
        assert_eq!(
            stat.correct.len(),
            iou_thresholds.len(),
            "statistic row evaluated at a different threshold count"
        );
    }

    let mut order: Vec<usize> = (0..stats.len()).collect();
    order.sort_by(|&a, &b| {
        stats[b]
            .confidence
            .partial_cmp(&stats[a].confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });

    let mut class_ids: BTreeSet<u64> = stats.iter().map(|s| s.class_id).collect();
    class_ids.extend(target_classes.iter().copied());

    let mut results = Vec::with_capacity(class_ids.len());
    for class_id in class_ids {
        let support = target_classes.iter().filter(|&&c| c == class_id).count();
        let class_stats: Vec<&PredictionStat> = order
            .iter()
            .map(|&i| &stats[i])
            .filter(|s| s.class_id == class_id)
            .collect();

        let mut metrics = ClassMetrics {
            class_id,
            support,
            predictions: class_stats.len(),
            ..ClassMetrics::default()
        };

        if support == 0 || class_stats.is_empty() {
            results.push(metrics);
            continue;
        }

        let mut aps = Vec::with_capacity(iou_thresholds.len());
        for threshold_index in 0..iou_thresholds.len() {
            let correct: Vec<bool> = class_stats
                .iter()
                .map(|s| s.correct[threshold_index])
                .collect();
            let (precisions, recalls) = cumulative_curves(&correct, support);
            aps.push(compute_ap(&recalls, &precisions));

            // Curves and scalars are reported at the primary threshold
            if threshold_index == 0 {
                let neg_conf: Vec<f64> = class_stats.iter().map(|s| -s.confidence).collect();
                metrics.precision =
                    interpolate_at(-REFERENCE_CONFIDENCE, &neg_conf, &precisions);
                metrics.recall = interpolate_at(-REFERENCE_CONFIDENCE, &neg_conf, &recalls);
                metrics.f1 = calculate_f1(metrics.precision, metrics.recall);
                metrics.f1_curve = f1_curve(&precisions, &recalls);
                metrics.precision_curve = precisions;
                metrics.recall_curve = recalls;
            }
        }

        metrics.ap_primary = aps[0];
        metrics.ap_mean = aps.iter().sum::<f64>() / aps.len() as f64;
        results.push(metrics);
    }

    results
}

/// Unweighted means over classes with at least one ground truth.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub ap_primary: f64,
    pub ap_mean: f64,
}

/// Average metrics over classes that have support; zero-support classes are
/// excluded rather than dragging the means down as false zeros.
#[must_use]
pub fn mean_over_supported(classes: &[ClassMetrics]) -> MeanMetrics {
    let supported: Vec<&ClassMetrics> = classes.iter().filter(|c| c.has_support()).collect();
    if supported.is_empty() {
        return MeanMetrics::default();
    }

    let n = supported.len() as f64;
    MeanMetrics {
        precision: supported.iter().map(|c| c.precision).sum::<f64>() / n,
        recall: supported.iter().map(|c| c.recall).sum::<f64>() / n,
        f1: supported.iter().map(|c| c.f1).sum::<f64>() / n,
        ap_primary: supported.iter().map(|c| c.ap_primary).sum::<f64>() / n,
        ap_mean: supported.iter().map(|c| c.ap_mean).sum::<f64>() / n,
    }
}

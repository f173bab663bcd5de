//! Dataset-wide accumulation of per-image match statistics.
//!
//! Two-pass design: every image is folded into a flat, ordered statistic
//! log first, and the metrics reduction consumes the log afterwards. AP
//! needs a global sort by confidence within each class, so nothing is
//! reduced while images are still arriving.

use std::collections::BTreeSet;

use tracing::warn;

use crate::matching::{match_image_class, StratificationFilter};
use crate::types::{Detection, GroundTruth, MatchRecord};

/// One statistic row per kept detection.
///
/// `correct` holds one flag per evaluated IoU threshold; an unmatched
/// detection has every flag false.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionStat {
    pub correct: Vec<bool>,
    pub confidence: f64,
    pub class_id: u64,
}

/// Running counters over an evaluation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunCounters {
    /// Images folded into the accumulator
    pub images_seen: usize,
    /// Detections that survived suppression and were counted
    pub detections_kept: usize,
    /// Ground truths counted (stratification-admitted)
    pub ground_truths: usize,
    /// Boxes with zero or negative extent encountered on either side
    pub degenerate_boxes: usize,
}

impl RunCounters {
    /// Get a formatted one-line summary of the counters.
    pub fn summary_string(&self) -> String {
        format!(
            "RunCounters {{ images: {}, detections: {}, ground_truths: {}, degenerate: {} }}",
            self.images_seen, self.detections_kept, self.ground_truths, self.degenerate_boxes
        )
    }
}

/// Accumulates match statistics across a full dataset pass.
///
/// For every image, classes are evaluated in ascending id order over the
/// union of classes present on either side; each (image, class) pair goes
/// through the per-image matcher and lands in the log exactly once per
/// ground truth and per detection. Unmatched sides are labelled as
/// background in the confusion sequences.
#[derive(Debug, Clone)]
pub struct DatasetAccumulator {
    iou_thresholds: Vec<f64>,
    filter: StratificationFilter,
    stats: Vec<PredictionStat>,
    target_classes: Vec<u64>,
    match_records: Vec<MatchRecord>,
    /// True class per record; `None` is the background label
    y_true: Vec<Option<u64>>,
    /// Predicted class per record; `None` is the background label
    y_pred: Vec<Option<u64>>,
    counters: RunCounters,
}

impl DatasetAccumulator {
    /// Create an accumulator evaluating the given IoU thresholds.
    ///
    /// Thresholds are sorted ascending; the first is the primary threshold
    /// used for matching.
    ///
    /// # Panics
    ///
    /// Panics if `iou_thresholds` is empty.
    pub fn new(mut iou_thresholds: Vec<f64>, filter: StratificationFilter) -> Self {
        assert!(
            !iou_thresholds.is_empty(),
            "at least one IoU threshold is required"
        );
        iou_thresholds.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        Self {
            iou_thresholds,
            filter,
            stats: Vec::new(),
            target_classes: Vec::new(),
            match_records: Vec::new(),
            y_true: Vec::new(),
            y_pred: Vec::new(),
            counters: RunCounters::default(),
        }
    }

    /// The lowest evaluated IoU threshold, used for matching.
    pub fn primary_iou_threshold(&self) -> f64 {
        self.iou_thresholds[0]
    }

    /// The evaluated IoU thresholds, ascending.
    pub fn iou_thresholds(&self) -> &[f64] {
        &self.iou_thresholds
    }

    /// Fold one image's ground truths and kept detections into the log.
    pub fn record_image(&mut self, ground_truths: &[GroundTruth], detections: &[Detection]) {
        self.counters.images_seen += 1;

        let degenerate = ground_truths
            .iter()
            .map(|gt| &gt.bbox)
            .chain(detections.iter().map(|d| &d.bbox))
            .filter(|bbox| !bbox.is_valid())
            .count();
        if degenerate > 0 {
            self.counters.degenerate_boxes += degenerate;
            warn!(degenerate, "degenerate boxes in image; treated as unmatched");
        }

        // Union of classes present on either side, ascending for
        // reproducible iteration
        let mut class_ids: BTreeSet<u64> = ground_truths.iter().map(|gt| gt.class_id).collect();
        class_ids.extend(detections.iter().map(|d| d.class_id));

        for class_id in class_ids {
            let class_gts: Vec<GroundTruth> = ground_truths
                .iter()
                .filter(|gt| gt.class_id == class_id)
                .cloned()
                .collect();
            let class_dets: Vec<Detection> = detections
                .iter()
                .filter(|d| d.class_id == class_id)
                .cloned()
                .collect();

            let outcome = match_image_class(
                &class_gts,
                &class_dets,
                self.primary_iou_threshold(),
                &self.filter,
            );

            for pair in &outcome.matched {
                let gt = &class_gts[pair.gt_index];
                let detection = &class_dets[pair.detection_index];

                self.stats.push(PredictionStat {
                    correct: self.iou_thresholds.iter().map(|&t| pair.iou > t).collect(),
                    confidence: detection.score,
                    class_id: detection.class_id,
                });
                self.target_classes.push(gt.class_id);

                self.y_true.push(Some(gt.class_id));
                self.y_pred.push(Some(detection.class_id));
                self.match_records
                    .push(MatchRecord::matched(gt.clone(), detection.clone()));
            }

            for &gt_index in &outcome.unmatched_ground_truths {
                let gt = &class_gts[gt_index];
                self.target_classes.push(gt.class_id);

                self.y_true.push(Some(gt.class_id));
                self.y_pred.push(None);
                self.match_records.push(MatchRecord::missed(gt.clone()));
            }

            for &det_index in &outcome.unmatched_detections {
                let detection = &class_dets[det_index];
                self.stats.push(PredictionStat {
                    correct: vec![false; self.iou_thresholds.len()],
                    confidence: detection.score,
                    class_id: detection.class_id,
                });

                self.y_true.push(None);
                self.y_pred.push(Some(detection.class_id));
                self.match_records
                    .push(MatchRecord::spurious(detection.clone()));
            }

            // Skipped entities (stratified-out ground truths and the
            // detections they claim) count on neither side
            self.counters.detections_kept +=
                outcome.matched.len() + outcome.unmatched_detections.len();
            self.counters.ground_truths +=
                outcome.matched.len() + outcome.unmatched_ground_truths.len();
        }

        self.assert_consistent();
    }

    /// Verify the exactly-once invariant and parallel-sequence alignment.
    ///
    /// A violation is an accumulation bug, not a recoverable state.
    pub fn assert_consistent(&self) {
        assert_eq!(
            self.stats.len(),
            self.counters.detections_kept,
            "statistic rows diverged from counted detections"
        );
        assert_eq!(
            self.target_classes.len(),
            self.counters.ground_truths,
            "target classes diverged from counted ground truths"
        );
        assert_eq!(self.y_true.len(), self.y_pred.len());
        assert_eq!(self.y_true.len(), self.match_records.len());
    }

    /// Per-detection statistic rows in accumulation order.
    pub fn stats(&self) -> &[PredictionStat] {
        &self.stats
    }

    /// True class of every counted ground truth, in accumulation order.
    pub fn target_classes(&self) -> &[u64] {
        &self.target_classes
    }

    /// The full ordered match log.
    pub fn match_records(&self) -> &[MatchRecord] {
        &self.match_records
    }

    /// Parallel (true, predicted) label sequences for confusion reporting;
    /// `None` is the background label for the unmatched side.
    pub fn confusion_labels(&self) -> (&[Option<u64>], &[Option<u64>]) {
        (&self.y_true, &self.y_pred)
    }

    pub fn counters(&self) -> &RunCounters {
        &self.counters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BoundingBox, MatchKind};

    fn gt(image_id: u64, class_id: u64, bbox: BoundingBox) -> GroundTruth {
        GroundTruth::new(image_id, class_id, bbox)
    }

    fn det(image_id: u64, class_id: u64, bbox: BoundingBox, score: f64) -> Detection {
        Detection {
            image_id,
            class_id,
            bbox,
            score,
        }
    }

    #[test]
    #[should_panic(expected = "at least one IoU threshold")]
    fn test_empty_thresholds_panic() {
        DatasetAccumulator::new(vec![], StratificationFilter::none());
    }

    #[test]
    fn test_thresholds_sorted_primary_is_lowest() {
        let acc = DatasetAccumulator::new(vec![0.75, 0.5], StratificationFilter::none());
        assert_eq!(acc.primary_iou_threshold(), 0.5);
        assert_eq!(acc.iou_thresholds(), &[0.5, 0.75]);
    }

    #[test]
    fn test_matched_pair_single_row_each_side() {
        let mut acc = DatasetAccumulator::new(vec![0.5], StratificationFilter::none());
        let bbox = BoundingBox::new(10.0, 10.0, 60.0, 60.0);
        acc.record_image(&[gt(0, 1, bbox)], &[det(0, 1, bbox, 0.9)]);

        assert_eq!(acc.stats().len(), 1);
        assert_eq!(acc.stats()[0].correct, vec![true]);
        assert_eq!(acc.target_classes(), &[1]);
        assert_eq!(acc.match_records().len(), 1);
        assert_eq!(acc.match_records()[0].kind(), MatchKind::TruePositive);
    }

    #[test]
    fn test_false_negative_and_false_positive_rows() {
        let mut acc = DatasetAccumulator::new(vec![0.5], StratificationFilter::none());
        acc.record_image(
            &[gt(0, 1, BoundingBox::new(0.0, 0.0, 10.0, 10.0))],
            &[det(0, 2, BoundingBox::new(50.0, 50.0, 60.0, 60.0), 0.8)],
        );

        // One detection row (all-false) and one counted ground truth
        assert_eq!(acc.stats().len(), 1);
        assert_eq!(acc.stats()[0].correct, vec![false]);
        assert_eq!(acc.target_classes(), &[1]);

        let (y_true, y_pred) = acc.confusion_labels();
        assert_eq!(y_true, &[Some(1), None]);
        assert_eq!(y_pred, &[None, Some(2)]);
    }

    #[test]
    fn test_multi_threshold_correct_flags() {
        let mut acc = DatasetAccumulator::new(vec![0.5, 0.95], StratificationFilter::none());
        // IoU between these boxes: 50x100 ∩ 60x100 overlap 40x100 = 4000,
        // union 5000 + 6000 - 4000 = 7000, IoU ≈ 0.571
        acc.record_image(
            &[gt(0, 0, BoundingBox::new(0.0, 0.0, 50.0, 100.0))],
            &[det(0, 0, BoundingBox::new(10.0, 0.0, 70.0, 100.0), 0.9)],
        );

        assert_eq!(acc.stats().len(), 1);
        assert_eq!(acc.stats()[0].correct, vec![true, false]);
    }

    #[test]
    fn test_exactly_once_across_images() {
        let mut acc = DatasetAccumulator::new(vec![0.5], StratificationFilter::none());
        let bbox = BoundingBox::new(10.0, 10.0, 60.0, 60.0);

        acc.record_image(&[gt(0, 0, bbox), gt(0, 1, bbox)], &[det(0, 0, bbox, 0.9)]);
        acc.record_image(&[], &[det(1, 3, bbox, 0.4)]);
        acc.record_image(&[gt(2, 0, bbox)], &[]);

        assert_eq!(acc.counters().images_seen, 3);
        // 2 kept detections, 3 ground truths, each exactly once
        assert_eq!(acc.stats().len(), 2);
        assert_eq!(acc.target_classes().len(), 3);
        acc.assert_consistent();
    }

    #[test]
    fn test_stratification_excludes_ground_truth_from_support() {
        let mut occluded = gt(0, 0, BoundingBox::new(0.0, 0.0, 10.0, 10.0));
        occluded.visibility = Some("occluded".to_string());

        let filter = StratificationFilter {
            visibility: Some("visible".to_string()),
            orientation: None,
        };
        let mut acc = DatasetAccumulator::new(vec![0.5], filter);
        acc.record_image(&[occluded], &[]);

        assert!(acc.target_classes().is_empty());
        assert!(acc.match_records().is_empty());
        assert_eq!(acc.counters().ground_truths, 0);
    }

    #[test]
    fn test_degenerate_boxes_counted_not_fatal() {
        let mut acc = DatasetAccumulator::new(vec![0.5], StratificationFilter::none());
        acc.record_image(
            &[gt(0, 0, BoundingBox::new(10.0, 10.0, 10.0, 20.0))],
            &[det(0, 0, BoundingBox::new(10.0, 10.0, 10.0, 20.0), 0.9)],
        );

        assert_eq!(acc.counters().degenerate_boxes, 2);
        // Zero-area boxes never match; both sides are unmatched
        assert_eq!(acc.stats()[0].correct, vec![false]);
        assert_eq!(acc.target_classes(), &[0]);
    }
}

//! Per-image matching of ground truths to detections by IoU.

use crate::metrics::iou::calculate_iou_matrix;
use crate::types::{BoundingBox, Detection, GroundTruth};

/// A matched (ground truth, detection) pair with its IoU.
///
/// The IoU is carried so correctness can be re-evaluated at every metric
/// threshold without recomputing geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedPair {
    pub gt_index: usize,
    pub detection_index: usize,
    pub iou: f64,
}

/// Partition of one (image, class) pair into matched and unmatched sides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchOutcome {
    pub matched: Vec<MatchedPair>,
    pub unmatched_ground_truths: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

/// Optional visibility/orientation filter for stratified evaluation.
///
/// When an attribute is set, ground truths whose attribute differs are
/// skipped entirely: they are counted neither as matched nor as unmatched.
/// They still take part in the assignment, so a detection claimed by a
/// filtered ground truth does not turn into a false positive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StratificationFilter {
    pub visibility: Option<String>,
    pub orientation: Option<String>,
}

impl StratificationFilter {
    /// Filter that admits every ground truth.
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether a ground truth passes the active attribute constraints.
    pub fn admits(&self, gt: &GroundTruth) -> bool {
        if let Some(visibility) = &self.visibility {
            if gt.visibility.as_ref() != Some(visibility) {
                return false;
            }
        }
        if let Some(orientation) = &self.orientation {
            if gt.orientation.as_ref() != Some(orientation) {
                return false;
            }
        }
        true
    }
}

/// Match ground truths to detections for a single image and class.
///
/// Greedy assignment in ascending ground-truth index order: each ground
/// truth claims its best-IoU detection among those not already claimed,
/// provided the IoU exceeds `iou_threshold` (the lowest evaluated
/// threshold). Equal-IoU ties keep the lowest detection index; a detection
/// matches at most one ground truth and vice versa. The loop exits early
/// once every detection is claimed.
///
/// Empty inputs are valid: with no ground truths every detection is
/// unmatched, with no detections every admitted ground truth is unmatched.
pub fn match_image_class(
    ground_truths: &[GroundTruth],
    detections: &[Detection],
    iou_threshold: f64,
    filter: &StratificationFilter,
) -> MatchOutcome {
    let mut outcome = MatchOutcome::default();
    if ground_truths.is_empty() && detections.is_empty() {
        return outcome;
    }

    if ground_truths.is_empty() {
        outcome.unmatched_detections = (0..detections.len()).collect();
        return outcome;
    }

    if detections.is_empty() {
        outcome.unmatched_ground_truths = (0..ground_truths.len())
            .filter(|&i| filter.admits(&ground_truths[i]))
            .collect();
        return outcome;
    }

    let gt_boxes: Vec<BoundingBox> = ground_truths.iter().map(|gt| gt.bbox).collect();
    let det_boxes: Vec<BoundingBox> = detections.iter().map(|d| d.bbox).collect();
    let iou_matrix = calculate_iou_matrix(&gt_boxes, &det_boxes);

    // Pass 1: greedy assignment over the full ground-truth list
    let mut claimed = vec![false; detections.len()];
    let mut assignments: Vec<Option<(usize, f64)>> = vec![None; ground_truths.len()];
    let mut claimed_count = 0usize;

    for (gt_index, ious) in iou_matrix.iter().enumerate() {
        if claimed_count == detections.len() {
            break;
        }

        let mut best: Option<(usize, f64)> = None;
        for (det_index, &iou) in ious.iter().enumerate() {
            if claimed[det_index] || iou <= iou_threshold {
                continue;
            }
            if best.map_or(true, |(_, best_iou)| iou > best_iou) {
                best = Some((det_index, iou));
            }
        }

        if let Some((det_index, iou)) = best {
            claimed[det_index] = true;
            claimed_count += 1;
            assignments[gt_index] = Some((det_index, iou));
        }
    }

    // Pass 2: partition, applying the stratification filter to the
    // ground-truth side only
    for (gt_index, assignment) in assignments.iter().enumerate() {
        if !filter.admits(&ground_truths[gt_index]) {
            continue;
        }
        match assignment {
            Some((det_index, iou)) => outcome.matched.push(MatchedPair {
                gt_index,
                detection_index: *det_index,
                iou: *iou,
            }),
            None => outcome.unmatched_ground_truths.push(gt_index),
        }
    }

    outcome.unmatched_detections = (0..detections.len()).filter(|&i| !claimed[i]).collect();

    outcome
}

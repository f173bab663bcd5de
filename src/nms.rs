//! Non-maximum suppression over raw model output rows.
//!
//! Turns one image's candidate rows (box + objectness + per-class scores)
//! into a filtered list of [`Detection`]s: confidence filtering, optional
//! multi-label expansion, then class-aware greedy suppression.

use tracing::debug;

use crate::error::{EvalError, Result};
use crate::metrics::iou::calculate_iou;
use crate::types::{BoundingBox, Detection, RawPrediction};

/// A candidate row surviving the confidence filter.
#[derive(Debug, Clone)]
struct Candidate {
    bbox: BoundingBox,
    score: f64,
    class_id: u64,
    /// Original index in the input, used for deterministic tie-breaking
    index: usize,
}

/// Apply confidence filtering and class-aware non-max suppression to one
/// image's raw predictions.
///
/// The confidence of a candidate row is objectness × class score. In
/// multi-label mode each row is expanded into one candidate per class whose
/// confidence clears `conf_thres`; otherwise only the best class survives.
/// Suppression is greedy per class: the highest-confidence candidate is
/// kept and every remaining candidate of the same class with IoU ≥
/// `iou_thres` against it is dropped.
///
/// Deterministic given identical inputs: score ties are broken by ascending
/// input row index, then ascending class id. An empty result is a valid
/// outcome, not an error. The returned detections are in selection order
/// (descending confidence).
///
/// # Errors
///
/// Returns an error if either threshold is outside [0, 1], or if a row's
/// class-score vector does not have `num_classes` entries.
pub fn non_max_suppression(
    image_id: u64,
    predictions: &[RawPrediction],
    num_classes: usize,
    conf_thres: f64,
    iou_thres: f64,
    multi_label: bool,
) -> Result<Vec<Detection>> {
    if !(0.0..=1.0).contains(&conf_thres) {
        return Err(EvalError::InvalidThreshold(format!(
            "confidence threshold must be between 0 and 1, got {conf_thres}"
        )));
    }
    if !(0.0..=1.0).contains(&iou_thres) {
        return Err(EvalError::InvalidThreshold(format!(
            "IoU threshold must be between 0 and 1, got {iou_thres}"
        )));
    }

    let mut candidates: Vec<Candidate> = Vec::new();
    for (index, pred) in predictions.iter().enumerate() {
        if pred.class_scores.len() != num_classes {
            return Err(EvalError::MalformedPrediction(format!(
                "row {index} has {} class scores, expected {num_classes}",
                pred.class_scores.len()
            )));
        }

        let bbox = BoundingBox::from_xywh(pred.bbox);
        if multi_label {
            for (class_id, &class_score) in pred.class_scores.iter().enumerate() {
                let score = pred.objectness * class_score;
                if score >= conf_thres {
                    candidates.push(Candidate {
                        bbox,
                        score,
                        class_id: class_id as u64,
                        index,
                    });
                }
            }
        } else {
            // Best class only; ties keep the lowest class id
            let mut best_class = 0usize;
            let mut best_score = f64::NEG_INFINITY;
            for (class_id, &class_score) in pred.class_scores.iter().enumerate() {
                if class_score > best_score {
                    best_score = class_score;
                    best_class = class_id;
                }
            }

            let score = pred.objectness * best_score;
            if score >= conf_thres {
                candidates.push(Candidate {
                    bbox,
                    score,
                    class_id: best_class as u64,
                    index,
                });
            }
        }
    }

    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    // Sort by descending score; ties by input row, then class id
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.index.cmp(&b.index))
            .then(a.class_id.cmp(&b.class_id))
    });

    let mut keep_mask = vec![true; candidates.len()];
    let mut detections = Vec::new();

    for i in 0..candidates.len() {
        if !keep_mask[i] {
            continue;
        }
        let kept = &candidates[i];
        detections.push(Detection {
            image_id,
            class_id: kept.class_id,
            bbox: kept.bbox,
            score: kept.score,
        });

        for j in (i + 1)..candidates.len() {
            if !keep_mask[j] || candidates[j].class_id != kept.class_id {
                continue;
            }
            if calculate_iou(&kept.bbox, &candidates[j].bbox) >= iou_thres {
                keep_mask[j] = false;
            }
        }
    }

    debug!(
        image_id,
        candidates = predictions.len(),
        kept = detections.len(),
        "non-max suppression"
    );

    Ok(detections)
}

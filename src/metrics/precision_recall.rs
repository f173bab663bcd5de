//! Precision and recall curves over ranked detections.

/// Calculate precision from true-positive and false-positive counts.
///
/// Precision = TP / (TP + FP), 0.0 when there are no positives.
#[must_use]
pub fn calculate_precision(tp: usize, fp: usize) -> f64 {
    let denominator = tp + fp;
    if denominator == 0 {
        return 0.0;
    }
    tp as f64 / denominator as f64
}

/// Calculate recall from true-positive and false-negative counts.
///
/// Recall = TP / (TP + FN), 0.0 when there are no ground truths.
#[must_use]
pub fn calculate_recall(tp: usize, fn_: usize) -> f64 {
    let denominator = tp + fn_;
    if denominator == 0 {
        return 0.0;
    }
    tp as f64 / denominator as f64
}

/// Build cumulative precision and recall curves from correctness flags
/// ordered by descending confidence.
///
/// Returns one (precision, recall) pair per rank. Recall is 0.0 at every
/// rank when `total_ground_truths` is zero.
#[must_use]
pub fn cumulative_curves(correct: &[bool], total_ground_truths: usize) -> (Vec<f64>, Vec<f64>) {
    let mut precisions = Vec::with_capacity(correct.len());
    let mut recalls = Vec::with_capacity(correct.len());

    let mut tp = 0usize;
    let mut fp = 0usize;
    for &is_tp in correct {
        if is_tp {
            tp += 1;
        } else {
            fp += 1;
        }

        precisions.push(calculate_precision(tp, fp));
        recalls.push(if total_ground_truths > 0 {
            tp as f64 / total_ground_truths as f64
        } else {
            0.0
        });
    }

    (precisions, recalls)
}

/// Linear interpolation of `ys` over ascending `xs` at position `x`.
///
/// Clamps to the first/last value outside the sampled range, matching
/// `numpy.interp`. Returns 0.0 for empty inputs.
#[must_use]
pub fn interpolate_at(x: f64, xs: &[f64], ys: &[f64]) -> f64 {
    debug_assert_eq!(xs.len(), ys.len());
    if xs.is_empty() {
        return 0.0;
    }
    if x <= xs[0] {
        return ys[0];
    }
    if x >= xs[xs.len() - 1] {
        return ys[ys.len() - 1];
    }

    for i in 1..xs.len() {
        if x <= xs[i] {
            let span = xs[i] - xs[i - 1];
            if span <= 0.0 {
                return ys[i];
            }
            let t = (x - xs[i - 1]) / span;
            return ys[i - 1] + t * (ys[i] - ys[i - 1]);
        }
    }
    ys[ys.len() - 1]
}

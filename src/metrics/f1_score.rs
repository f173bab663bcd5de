//! F1 score calculation.

/// Calculate F1 score from precision and recall.
///
/// F1 is the harmonic mean: 2 × (P × R) / (P + R), 0.0 when both are 0.
///
/// # Example
///
/// ```
/// use det_eval::metrics::f1_score::calculate_f1;
///
/// let f1 = calculate_f1(0.8, 0.6);
/// assert!((f1 - 0.6857).abs() < 0.001);
/// ```
#[must_use]
pub fn calculate_f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        return 0.0;
    }

    2.0 * (precision * recall) / (precision + recall)
}

/// Calculate the F1 value at each point of a precision-recall curve.
#[must_use]
pub fn f1_curve(precisions: &[f64], recalls: &[f64]) -> Vec<f64> {
    precisions
        .iter()
        .zip(recalls.iter())
        .map(|(&p, &r)| calculate_f1(p, r))
        .collect()
}

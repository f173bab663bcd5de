//! Metrics calculation modules for detection evaluation.

pub mod ap;
pub mod f1_score;
pub mod iou;
pub mod precision_recall;

pub use ap::{ap_per_class, compute_ap, mean_over_supported, MeanMetrics};
pub use f1_score::{calculate_f1, f1_curve};
pub use iou::{calculate_iou, calculate_iou_matrix};
pub use precision_recall::{calculate_precision, calculate_recall, cumulative_curves};

//! Intersection over Union (IoU) calculation.

use crate::types::BoundingBox;

/// Calculate the Intersection over Union (IoU) between two bounding boxes.
///
/// IoU is defined as the area of intersection divided by the area of union.
/// Degenerate boxes (zero area or inverted coordinates) contribute nothing
/// and never divide by zero; the result is 0.0 for them.
///
/// # Example
///
/// ```
/// use det_eval::metrics::iou::calculate_iou;
/// use det_eval::types::BoundingBox;
///
/// let bbox1 = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
/// let bbox2 = BoundingBox::new(5.0, 5.0, 15.0, 15.0);
/// let iou = calculate_iou(&bbox1, &bbox2);
/// assert!(iou > 0.0 && iou < 1.0);
/// ```
#[must_use]
pub fn calculate_iou(bbox1: &BoundingBox, bbox2: &BoundingBox) -> f64 {
    // Intersection rectangle, clamped to zero extent when the boxes are
    // disjoint or either box is degenerate
    let x_left = bbox1.x1.max(bbox2.x1);
    let y_top = bbox1.y1.max(bbox2.y1);
    let x_right = bbox1.x2.min(bbox2.x2);
    let y_bottom = bbox1.y2.min(bbox2.y2);

    let intersection_width = (x_right - x_left).max(0.0);
    let intersection_height = (y_bottom - y_top).max(0.0);
    let intersection_area = intersection_width * intersection_height;

    let bbox1_area = if bbox1.is_valid() { bbox1.area() } else { 0.0 };
    let bbox2_area = if bbox2.is_valid() { bbox2.area() } else { 0.0 };
    let union_area = bbox1_area + bbox2_area - intersection_area;

    if union_area <= 0.0 {
        return 0.0;
    }

    intersection_area / union_area
}

/// Calculate the IoU matrix between two sets of bounding boxes.
///
/// Returns a 2D vector where `result[i][j]` is the IoU between `bboxes1[i]`
/// and `bboxes2[j]`.
#[must_use]
pub fn calculate_iou_matrix(bboxes1: &[BoundingBox], bboxes2: &[BoundingBox]) -> Vec<Vec<f64>> {
    bboxes1
        .iter()
        .map(|bbox1| {
            bboxes2
                .iter()
                .map(|bbox2| calculate_iou(bbox1, bbox2))
                .collect()
        })
        .collect()
}

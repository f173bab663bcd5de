//! Box geometry: format conversion, clipping, and letterbox rescaling.

use crate::types::BoundingBox;

/// Convert a box from center (x, y, width, height) to corner (x1, y1, x2, y2).
///
/// # Examples
///
/// ```
/// # use det_eval::boxes::xywh_to_xyxy;
/// let xyxy = xywh_to_xyxy([50.0, 50.0, 20.0, 10.0]);
/// assert_eq!(xyxy, [40.0, 45.0, 60.0, 55.0]);
/// ```
#[must_use]
pub fn xywh_to_xyxy(bbox: [f64; 4]) -> [f64; 4] {
    [
        bbox[0] - bbox[2] / 2.0, // x1 = x - w/2
        bbox[1] - bbox[3] / 2.0, // y1 = y - h/2
        bbox[0] + bbox[2] / 2.0, // x2 = x + w/2
        bbox[1] + bbox[3] / 2.0, // y2 = y + h/2
    ]
}

/// Convert a box from corner (x1, y1, x2, y2) to center (x, y, width, height).
///
/// # Examples
///
/// ```
/// # use det_eval::boxes::xyxy_to_xywh;
/// let xywh = xyxy_to_xywh([40.0, 45.0, 60.0, 55.0]);
/// assert_eq!(xywh, [50.0, 50.0, 20.0, 10.0]);
/// ```
#[must_use]
pub fn xyxy_to_xywh(bbox: [f64; 4]) -> [f64; 4] {
    [
        (bbox[0] + bbox[2]) / 2.0, // x center
        (bbox[1] + bbox[3]) / 2.0, // y center
        bbox[2] - bbox[0],         // width
        bbox[3] - bbox[1],         // height
    ]
}

/// Clamp every box into [0, width] x [0, height].
pub fn clip_boxes(boxes: &mut [BoundingBox], height: f64, width: f64) {
    for bbox in boxes {
        bbox.clip_to(height, width);
    }
}

/// Map boxes from a padded/letterboxed inference shape back to the original
/// image shape.
///
/// Shapes are (height, width). The scale factor is the minimum per-axis
/// ratio `from / to`; `pad` is the (x, y) letterbox offset, computed as half
/// the unused padding when not supplied. This exactly inverts the upstream
/// resize-and-pad, and clips the result to the target shape.
pub fn rescale_boxes(
    boxes: &mut [BoundingBox],
    from_shape: (f64, f64),
    to_shape: (f64, f64),
    pad: Option<(f64, f64)>,
) {
    let gain = (from_shape.0 / to_shape.0).min(from_shape.1 / to_shape.1);
    let (pad_x, pad_y) = pad.unwrap_or((
        (from_shape.1 - to_shape.1 * gain) / 2.0,
        (from_shape.0 - to_shape.0 * gain) / 2.0,
    ));

    for bbox in boxes.iter_mut() {
        bbox.x1 = (bbox.x1 - pad_x) / gain;
        bbox.x2 = (bbox.x2 - pad_x) / gain;
        bbox.y1 = (bbox.y1 - pad_y) / gain;
        bbox.y2 = (bbox.y2 - pad_y) / gain;
    }
    clip_boxes(boxes, to_shape.0, to_shape.1);
}

//! Core data types for detections, ground truth, and evaluation results.

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in corner (x1, y1, x2, y2) coordinates.
///
/// Coordinates are in pixels with the origin at the top-left corner:
/// - x1, y1: top-left corner
/// - x2, y2: bottom-right corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Create a bounding box from center (x, y, width, height) coordinates.
    pub fn from_xywh(xywh: [f64; 4]) -> Self {
        let [x, y, w, h] = xywh;
        Self {
            x1: x - w / 2.0,
            y1: y - h / 2.0,
            x2: x + w / 2.0,
            y2: y + h / 2.0,
        }
    }

    /// Convert to center (x, y, width, height) coordinates.
    pub fn to_xywh(&self) -> [f64; 4] {
        [
            (self.x1 + self.x2) / 2.0,
            (self.y1 + self.y2) / 2.0,
            self.x2 - self.x1,
            self.y2 - self.y1,
        ]
    }

    /// Convert to left-top (x, y, width, height) coordinates (the COCO bbox shape).
    pub fn to_ltwh(&self) -> [f64; 4] {
        [self.x1, self.y1, self.x2 - self.x1, self.y2 - self.y1]
    }

    /// Get the box width.
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    /// Get the box height.
    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// Get the area of the bounding box.
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Check if the bounding box is valid (positive dimensions).
    pub fn is_valid(&self) -> bool {
        self.width() > 0.0 && self.height() > 0.0
    }

    /// Clamp coordinates into [0, width] x [0, height].
    ///
    /// Only the box values change; callers keep confidence and class intact.
    pub fn clip_to(&mut self, height: f64, width: f64) {
        self.x1 = self.x1.clamp(0.0, width);
        self.y1 = self.y1.clamp(0.0, height);
        self.x2 = self.x2.clamp(0.0, width);
        self.y2 = self.y2.clamp(0.0, height);
    }
}

/// One raw model output row: box, objectness, and per-class scores.
///
/// The box is in center (x, y, width, height) coordinates at inference
/// resolution. Consumed only by suppression.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPrediction {
    /// Box in center (x, y, width, height) format
    pub bbox: [f64; 4],
    /// Objectness score in [0, 1]
    pub objectness: f64,
    /// One score per class
    pub class_scores: Vec<f64>,
}

/// A kept detection: box, confidence, class, and source image.
///
/// Created by suppression; never mutated downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub image_id: u64,
    pub class_id: u64,
    /// Box in corner (x1, y1, x2, y2) coordinates
    pub bbox: BoundingBox,
    /// Confidence score in [0, 1]
    pub score: f64,
}

/// A ground-truth annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundTruth {
    pub image_id: u64,
    pub class_id: u64,
    /// Box in corner (x1, y1, x2, y2) coordinates
    pub bbox: BoundingBox,
    /// Visibility attribute for stratified evaluation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    /// Orientation attribute for stratified evaluation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<String>,
}

impl GroundTruth {
    /// Create a ground truth with no stratification attributes.
    pub fn new(image_id: u64, class_id: u64, bbox: BoundingBox) -> Self {
        Self {
            image_id,
            class_id,
            bbox,
            visibility: None,
            orientation: None,
        }
    }

    /// Create a ground truth from a normalized center-xywh label row,
    /// scaled up to the given (height, width) shape.
    pub fn from_normalized_xywh(
        image_id: u64,
        class_id: u64,
        xywh: [f64; 4],
        shape: (f64, f64),
    ) -> Self {
        let (height, width) = shape;
        let scaled = [
            xywh[0] * width,
            xywh[1] * height,
            xywh[2] * width,
            xywh[3] * height,
        ];
        Self::new(image_id, class_id, BoundingBox::from_xywh(scaled))
    }
}

/// Classification of a match record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Ground truth paired with a detection
    TruePositive,
    /// Ground truth with no detection
    FalseNegative,
    /// Detection with no ground truth
    FalsePositive,
}

/// A (ground truth, detection) pairing where at most one side may be absent.
///
/// Both sides present denotes a true positive or confusion pair; a missing
/// detection is a false negative and a missing ground truth a false positive.
/// Records are immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    pub ground_truth: Option<GroundTruth>,
    pub detection: Option<Detection>,
}

impl MatchRecord {
    /// A matched (ground truth, detection) pair.
    pub fn matched(ground_truth: GroundTruth, detection: Detection) -> Self {
        Self {
            ground_truth: Some(ground_truth),
            detection: Some(detection),
        }
    }

    /// An unmatched ground truth (false negative).
    pub fn missed(ground_truth: GroundTruth) -> Self {
        Self {
            ground_truth: Some(ground_truth),
            detection: None,
        }
    }

    /// An unmatched detection (false positive).
    pub fn spurious(detection: Detection) -> Self {
        Self {
            ground_truth: None,
            detection: Some(detection),
        }
    }

    pub fn kind(&self) -> MatchKind {
        match (&self.ground_truth, &self.detection) {
            (Some(_), Some(_)) => MatchKind::TruePositive,
            (Some(_), None) => MatchKind::FalseNegative,
            (None, Some(_)) => MatchKind::FalsePositive,
            (None, None) => unreachable!("match record with both sides absent"),
        }
    }
}

/// Per-class evaluation metrics.
///
/// Curves are indexed by descending-confidence rank at the primary IoU
/// threshold; the scalar summaries are read off the curves at a reference
/// confidence (see `metrics::ap::ap_per_class`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub class_id: u64,
    /// Cumulative precision at each rank
    pub precision_curve: Vec<f64>,
    /// Cumulative recall at each rank
    pub recall_curve: Vec<f64>,
    /// F1 at each rank
    pub f1_curve: Vec<f64>,
    /// Summary precision
    pub precision: f64,
    /// Summary recall
    pub recall: f64,
    /// Summary F1
    pub f1: f64,
    /// AP at the primary (lowest) IoU threshold
    pub ap_primary: f64,
    /// AP averaged over all evaluated IoU thresholds
    pub ap_mean: f64,
    /// Number of ground truths for this class
    pub support: usize,
    /// Number of kept detections predicted as this class
    pub predictions: usize,
}

impl ClassMetrics {
    /// Whether the class has any ground truths and participates in means.
    pub fn has_support(&self) -> bool {
        self.support > 0
    }
}

/// Final evaluation report: per-class metrics plus dataset-wide means.
///
/// Means are unweighted over classes with at least one ground truth.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub classes: Vec<ClassMetrics>,
    pub mean_precision: f64,
    pub mean_recall: f64,
    pub mean_f1: f64,
    /// mAP at the primary IoU threshold (e.g. mAP@0.5)
    pub map_primary: f64,
    /// mAP averaged over all IoU thresholds (e.g. mAP@0.5:0.95)
    pub map_mean: f64,
    pub images_seen: usize,
    pub total_targets: usize,
    /// Class-id-indexed display names, when provided
    pub class_names: Vec<String>,
}

impl EvaluationReport {
    fn class_name(&self, class_id: u64) -> String {
        self.class_names
            .get(class_id as usize)
            .cloned()
            .unwrap_or_else(|| class_id.to_string())
    }
}

impl std::fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{:>20}{:>10}{:>10}{:>10}{:>10}{:>10}{:>10}",
            "Class", "Images", "Targets", "P", "R", "mAP@0.5", "F1"
        )?;
        writeln!(
            f,
            "{:>20}{:>10}{:>10}{:>10.3}{:>10.3}{:>10.3}{:>10.3}",
            "all",
            self.images_seen,
            self.total_targets,
            self.mean_precision,
            self.mean_recall,
            self.map_primary,
            self.mean_f1
        )?;
        if self.classes.len() > 1 {
            for class in &self.classes {
                writeln!(
                    f,
                    "{:>20}{:>10}{:>10}{:>10.3}{:>10.3}{:>10.3}{:>10.3}",
                    self.class_name(class.class_id),
                    self.images_seen,
                    class.support,
                    class.precision,
                    class.recall,
                    class.ap_primary,
                    class.f1
                )?;
            }
        }
        Ok(())
    }
}

/// One result record in the common detection-challenge JSON shape.
///
/// Boxes are in left-top (x, y, width, height) coordinates at the original
/// image resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CocoRecord {
    pub image_id: u64,
    pub category_id: u64,
    /// Bounding box in [x, y, width, height] format
    pub bbox: [f64; 4],
    pub score: f64,
}

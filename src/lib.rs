//! # det-eval
//!
//! A Rust library for evaluating object-detection model outputs against
//! ground truth.
//!
//! The pipeline turns raw per-image model output rows into a final metrics
//! report:
//!
//! 1. **Suppression**: confidence filtering and class-aware non-max
//!    suppression ([`nms`])
//! 2. **Matching**: per-image, per-class greedy IoU matching of ground
//!    truths to detections ([`matching`])
//! 3. **Accumulation**: a dataset-wide statistic log with an exactly-once
//!    row per ground truth and per kept detection ([`accumulator`])
//! 4. **Reduction**: precision/recall curves, interpolated-envelope AP,
//!    F1, and per-class/mean aggregation ([`metrics`])
//!
//! ## Quick Start
//!
//! ```rust
//! use det_eval::evaluator::{EvalConfig, Evaluator, ImageSample};
//! use det_eval::types::{BoundingBox, GroundTruth, RawPrediction};
//!
//! # fn main() -> det_eval::Result<()> {
//! let mut config = EvalConfig::new(1);
//! config.conf_threshold = 0.25;
//! let mut evaluator = Evaluator::new(config)?;
//!
//! let sample = ImageSample {
//!     image_id: 0,
//!     predictions: vec![RawPrediction {
//!         bbox: [100.0, 100.0, 40.0, 40.0],
//!         objectness: 0.9,
//!         class_scores: vec![1.0],
//!     }],
//!     ground_truths: vec![GroundTruth::new(
//!         0,
//!         0,
//!         BoundingBox::from_xywh([100.0, 100.0, 40.0, 40.0]),
//!     )],
//!     inference_shape: (416.0, 416.0),
//!     original_shape: (416.0, 416.0),
//! };
//!
//! let report = evaluator.run(vec![sample])?;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```
//!
//! Model inference and dataset loading are external collaborators: the
//! caller feeds [`evaluator::ImageSample`]s and the core never performs
//! I/O, except for the explicit helpers in [`loader`].

pub mod accumulator;
pub mod boxes;
pub mod error;
pub mod evaluator;
pub mod loader;
pub mod matching;
pub mod metrics;
pub mod nms;
pub mod types;

// Re-export commonly used types and functions
pub use accumulator::{DatasetAccumulator, PredictionStat, RunCounters};
pub use error::{EvalError, Result};
pub use evaluator::{coco_iou_thresholds, EvalConfig, Evaluator, ImageSample};
pub use loader::{coco80_to_coco91_class, load_classes};
pub use matching::{match_image_class, MatchOutcome, MatchedPair, StratificationFilter};
pub use nms::non_max_suppression;
pub use types::{
    BoundingBox, ClassMetrics, CocoRecord, Detection, EvaluationReport, GroundTruth, MatchKind,
    MatchRecord, RawPrediction,
};

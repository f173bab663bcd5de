//! Evaluation orchestrator: suppression, matching, accumulation, reduction.

use tracing::debug;

use crate::accumulator::{DatasetAccumulator, RunCounters};
use crate::boxes::rescale_boxes;
use crate::error::{EvalError, Result};
use crate::loader::coco80_to_coco91_class;
use crate::matching::StratificationFilter;
use crate::metrics::ap::{ap_per_class, mean_over_supported};
use crate::nms::non_max_suppression;
use crate::types::{
    BoundingBox, CocoRecord, Detection, EvaluationReport, GroundTruth, MatchRecord,
    RawPrediction,
};

/// The standard COCO IoU threshold vector 0.5:0.05:0.95.
pub fn coco_iou_thresholds() -> Vec<f64> {
    (0..10).map(|i| 0.5 + 0.05 * i as f64).collect()
}

/// Evaluation configuration, passed in explicitly; the core owns no CLI,
/// file, or environment configuration.
#[derive(Debug, Clone)]
pub struct EvalConfig {
    /// Number of classes in the raw model output
    pub num_classes: usize,
    /// Class-id-indexed display names for reporting (may be empty)
    pub class_names: Vec<String>,
    /// Confidence threshold for suppression
    pub conf_threshold: f64,
    /// IoU threshold for suppression
    pub nms_iou_threshold: f64,
    /// IoU thresholds for matching/metrics; the lowest is primary
    pub iou_thresholds: Vec<f64>,
    /// Expand candidates into one row per qualifying class
    pub multi_label: bool,
    /// Collapse every class id to 0 before matching
    pub single_class: bool,
    /// Stratified-evaluation filter on ground-truth attributes
    pub filter: StratificationFilter,
    /// Capture detection-challenge JSON records during the run
    pub capture_records: bool,
    /// Remap 80-class ids to the 91-class COCO numbering in captured
    /// records (serialization boundary only)
    pub remap_coco91: bool,
}

impl EvalConfig {
    /// Configuration with the conventional defaults: conf 0.001, NMS IoU
    /// 0.6, metrics at IoU 0.5, multi-label on.
    pub fn new(num_classes: usize) -> Self {
        Self {
            num_classes,
            class_names: Vec::new(),
            conf_threshold: 0.001,
            nms_iou_threshold: 0.6,
            iou_thresholds: vec![0.5],
            multi_label: true,
            single_class: false,
            filter: StratificationFilter::none(),
            capture_records: false,
            remap_coco91: false,
        }
    }
}

/// One image's worth of evaluator input.
///
/// Ground-truth boxes and raw predictions are both at the inference
/// resolution; `original_shape` is only used when rescaling captured
/// records back to source-image coordinates. Shapes are (height, width).
#[derive(Debug, Clone)]
pub struct ImageSample {
    pub image_id: u64,
    pub predictions: Vec<RawPrediction>,
    pub ground_truths: Vec<GroundTruth>,
    pub inference_shape: (f64, f64),
    pub original_shape: (f64, f64),
}

/// Drives the full evaluation pipeline over a stream of image samples.
///
/// Single-threaded and free of I/O; a caller may stop feeding images at any
/// point and still get a valid report for what was processed.
#[derive(Debug, Clone)]
pub struct Evaluator {
    config: EvalConfig,
    accumulator: DatasetAccumulator,
    records: Vec<CocoRecord>,
}

impl Evaluator {
    /// Create an evaluator for the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the metric IoU threshold list is empty or any
    /// threshold is outside [0, 1].
    pub fn new(config: EvalConfig) -> Result<Self> {
        if config.iou_thresholds.is_empty() {
            return Err(EvalError::InvalidThreshold(
                "at least one metric IoU threshold is required".to_string(),
            ));
        }
        for &threshold in &config.iou_thresholds {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(EvalError::InvalidThreshold(format!(
                    "metric IoU threshold must be between 0 and 1, got {threshold}"
                )));
            }
        }

        let accumulator =
            DatasetAccumulator::new(config.iou_thresholds.clone(), config.filter.clone());
        Ok(Self {
            config,
            accumulator,
            records: Vec::new(),
        })
    }

    /// Run suppression on one image and fold the result into the
    /// accumulated statistics.
    pub fn process_image(&mut self, sample: &ImageSample) -> Result<()> {
        let mut detections = non_max_suppression(
            sample.image_id,
            &sample.predictions,
            self.config.num_classes,
            self.config.conf_threshold,
            self.config.nms_iou_threshold,
            self.config.multi_label,
        )?;

        let (height, width) = sample.inference_shape;
        for detection in &mut detections {
            detection.bbox.clip_to(height, width);
            if self.config.single_class {
                detection.class_id = 0;
            }
        }

        if self.config.capture_records {
            self.capture_records(sample, &detections);
        }

        if self.config.single_class {
            let ground_truths: Vec<GroundTruth> = sample
                .ground_truths
                .iter()
                .cloned()
                .map(|mut gt| {
                    gt.class_id = 0;
                    gt
                })
                .collect();
            self.accumulator.record_image(&ground_truths, &detections);
        } else {
            self.accumulator
                .record_image(&sample.ground_truths, &detections);
        }

        Ok(())
    }

    /// Process every sample, then reduce to a report.
    pub fn run<I>(&mut self, samples: I) -> Result<EvaluationReport>
    where
        I: IntoIterator<Item = ImageSample>,
    {
        for sample in samples {
            self.process_image(&sample)?;
        }
        Ok(self.report())
    }

    /// Reduce the accumulated statistics into the final report.
    ///
    /// Safe to call between images; only the statistics accumulated so far
    /// are reported.
    pub fn report(&self) -> EvaluationReport {
        self.accumulator.assert_consistent();
        debug!(
            detections = self.accumulator.stats().len(),
            targets = self.accumulator.target_classes().len(),
            "reducing accumulated statistics"
        );

        let classes = ap_per_class(
            self.accumulator.stats(),
            self.accumulator.target_classes(),
            self.accumulator.iou_thresholds(),
        );
        let means = mean_over_supported(&classes);
        let counters = self.accumulator.counters();

        EvaluationReport {
            classes,
            mean_precision: means.precision,
            mean_recall: means.recall,
            mean_f1: means.f1,
            map_primary: means.ap_primary,
            map_mean: means.ap_mean,
            images_seen: counters.images_seen,
            total_targets: counters.ground_truths,
            class_names: self.config.class_names.clone(),
        }
    }

    /// Captured detection-challenge records, when enabled.
    pub fn records(&self) -> &[CocoRecord] {
        &self.records
    }

    /// The full ordered match log.
    pub fn match_records(&self) -> &[MatchRecord] {
        self.accumulator.match_records()
    }

    /// Parallel (true, predicted) confusion label sequences; `None` is the
    /// background label.
    pub fn confusion_labels(&self) -> (&[Option<u64>], &[Option<u64>]) {
        self.accumulator.confusion_labels()
    }

    pub fn counters(&self) -> &RunCounters {
        self.accumulator.counters()
    }

    fn capture_records(&mut self, sample: &ImageSample, detections: &[Detection]) {
        let coco91 = coco80_to_coco91_class();

        let mut boxes: Vec<BoundingBox> = detections.iter().map(|d| d.bbox).collect();
        rescale_boxes(
            &mut boxes,
            sample.inference_shape,
            sample.original_shape,
            None,
        );

        for (detection, bbox) in detections.iter().zip(boxes.iter()) {
            let category_id = if self.config.remap_coco91 {
                coco91
                    .get(detection.class_id as usize)
                    .copied()
                    .unwrap_or(detection.class_id)
            } else {
                detection.class_id
            };

            let ltwh = bbox.to_ltwh();
            self.records.push(CocoRecord {
                image_id: detection.image_id,
                category_id,
                bbox: [
                    round_to(ltwh[0], 3),
                    round_to(ltwh[1], 3),
                    round_to(ltwh[2], 3),
                    round_to(ltwh[3], 3),
                ],
                score: round_to(detection.score, 5),
            });
        }
    }
}

fn round_to(value: f64, digits: u32) -> f64 {
    let factor = 10f64.powi(digits as i32);
    (value * factor).round() / factor
}

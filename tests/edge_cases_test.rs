//! Edge case and boundary condition tests.

use det_eval::accumulator::DatasetAccumulator;
use det_eval::evaluator::{EvalConfig, Evaluator, ImageSample};
use det_eval::matching::{match_image_class, StratificationFilter};
use det_eval::metrics::iou::calculate_iou;
use det_eval::types::{BoundingBox, Detection, GroundTruth, RawPrediction};

fn det(class_id: u64, bbox: BoundingBox, score: f64) -> Detection {
    Detection {
        image_id: 0,
        class_id,
        bbox,
        score,
    }
}

#[test]
fn test_empty_dataset_run() {
    let mut evaluator = Evaluator::new(EvalConfig::new(1)).unwrap();
    let report = evaluator.run(Vec::<ImageSample>::new()).unwrap();

    assert_eq!(report.images_seen, 0);
    assert_eq!(report.total_targets, 0);
    assert!(report.classes.is_empty());
    assert_eq!(report.map_primary, 0.0);
}

#[test]
fn test_image_with_nothing_in_it() {
    let mut evaluator = Evaluator::new(EvalConfig::new(1)).unwrap();
    let report = evaluator
        .run(vec![ImageSample {
            image_id: 0,
            predictions: vec![],
            ground_truths: vec![],
            inference_shape: (416.0, 416.0),
            original_shape: (416.0, 416.0),
        }])
        .unwrap();

    assert_eq!(report.images_seen, 1);
    assert_eq!(report.total_targets, 0);
}

#[test]
fn test_zero_area_boxes_never_match() {
    let zero_gt = GroundTruth::new(0, 0, BoundingBox::new(10.0, 10.0, 10.0, 30.0));
    let zero_det = det(0, BoundingBox::new(10.0, 10.0, 10.0, 30.0), 0.9);

    let outcome = match_image_class(
        &[zero_gt],
        &[zero_det],
        0.5,
        &StratificationFilter::none(),
    );
    assert!(outcome.matched.is_empty());
    assert_eq!(outcome.unmatched_ground_truths, vec![0]);
    assert_eq!(outcome.unmatched_detections, vec![0]);
}

#[test]
fn test_inverted_boxes_treated_as_degenerate() {
    let inverted = BoundingBox::new(50.0, 50.0, 10.0, 10.0);
    let normal = BoundingBox::new(10.0, 10.0, 50.0, 50.0);

    assert_eq!(calculate_iou(&inverted, &normal), 0.0);
    assert_eq!(calculate_iou(&inverted, &inverted), 0.0);
}

#[test]
fn test_iou_exactly_at_threshold_is_not_a_match() {
    // Intersection 2, areas 3 and 3, union 4: IoU is exactly 0.5 in
    // floating point. Matching requires the IoU to exceed the threshold.
    let gt_box = BoundingBox::new(0.0, 0.0, 3.0, 1.0);
    let det_box = BoundingBox::new(1.0, 0.0, 4.0, 1.0);
    assert_eq!(calculate_iou(&gt_box, &det_box), 0.5);

    let outcome = match_image_class(
        &[GroundTruth::new(0, 0, gt_box)],
        &[det(0, det_box, 0.9)],
        0.5,
        &StratificationFilter::none(),
    );
    assert!(outcome.matched.is_empty());
    assert_eq!(outcome.unmatched_ground_truths, vec![0]);
    assert_eq!(outcome.unmatched_detections, vec![0]);
}

#[test]
fn test_many_detections_one_ground_truth() {
    let gt_box = BoundingBox::new(100.0, 100.0, 200.0, 200.0);
    let detections: Vec<Detection> = (0..5)
        .map(|i| {
            let offset = i as f64;
            det(
                0,
                BoundingBox::new(
                    100.0 + offset,
                    100.0 + offset,
                    200.0 + offset,
                    200.0 + offset,
                ),
                0.9 - offset * 0.1,
            )
        })
        .collect();

    let outcome = match_image_class(
        &[GroundTruth::new(0, 0, gt_box)],
        &detections,
        0.5,
        &StratificationFilter::none(),
    );

    // Exactly one detection claimed (the exact-overlap one), the rest are
    // false positives
    assert_eq!(outcome.matched.len(), 1);
    assert_eq!(outcome.matched[0].detection_index, 0);
    assert_eq!(outcome.unmatched_detections.len(), 4);
}

#[test]
fn test_accumulator_with_confidence_zero_detections() {
    let mut acc = DatasetAccumulator::new(vec![0.5], StratificationFilter::none());
    let bbox = BoundingBox::new(10.0, 10.0, 60.0, 60.0);
    acc.record_image(&[], &[det(0, bbox, 0.0)]);

    assert_eq!(acc.stats().len(), 1);
    assert_eq!(acc.stats()[0].confidence, 0.0);
}

#[test]
fn test_nms_empty_class_scores_dimension() {
    // A row with no class scores cannot satisfy a one-class configuration
    let predictions = vec![RawPrediction {
        bbox: [50.0, 50.0, 20.0, 20.0],
        objectness: 0.9,
        class_scores: vec![],
    }];
    let result = det_eval::nms::non_max_suppression(0, &predictions, 1, 0.3, 0.5, false);
    assert!(result.is_err());
}

#[test]
fn test_stratified_run_counts_only_admitted_targets() {
    let mut config = EvalConfig::new(1);
    config.conf_threshold = 0.25;
    config.filter = StratificationFilter {
        visibility: Some("visible".to_string()),
        orientation: None,
    };
    let mut evaluator = Evaluator::new(config).unwrap();

    let mut visible = GroundTruth::new(0, 0, BoundingBox::from_xywh([50.0, 50.0, 40.0, 40.0]));
    visible.visibility = Some("visible".to_string());
    let mut occluded =
        GroundTruth::new(0, 0, BoundingBox::from_xywh([200.0, 200.0, 40.0, 40.0]));
    occluded.visibility = Some("occluded".to_string());

    let report = evaluator
        .run(vec![ImageSample {
            image_id: 0,
            predictions: vec![],
            ground_truths: vec![visible, occluded],
            inference_shape: (416.0, 416.0),
            original_shape: (416.0, 416.0),
        }])
        .unwrap();

    // The occluded ground truth is skipped entirely
    assert_eq!(report.total_targets, 1);
}

#[test]
fn test_detections_clipped_to_inference_bounds() {
    let mut config = EvalConfig::new(1);
    config.conf_threshold = 0.25;
    let mut evaluator = Evaluator::new(config).unwrap();

    // Box sticking out past the right edge of a 416x416 inference canvas
    let gt_box = GroundTruth::new(0, 0, BoundingBox::new(396.0, 100.0, 416.0, 140.0));
    let report = evaluator
        .run(vec![ImageSample {
            image_id: 0,
            predictions: vec![RawPrediction {
                bbox: [416.0, 120.0, 40.0, 40.0],
                objectness: 0.9,
                class_scores: vec![1.0],
            }],
            ground_truths: vec![gt_box],
            inference_shape: (416.0, 416.0),
            original_shape: (416.0, 416.0),
        }])
        .unwrap();

    // After clipping, the detection is [396, 100, 416, 140] and matches
    assert!((report.map_primary - 1.0).abs() < 1e-9);
}

//! Basic evaluation example demonstrating core functionality.

use det_eval::evaluator::{EvalConfig, Evaluator, ImageSample};
use det_eval::loader::records_to_json;
use det_eval::metrics::iou::calculate_iou;
use det_eval::types::{BoundingBox, GroundTruth, RawPrediction};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Detection Evaluation Example ===\n");

    // Example 1: IoU calculation
    println!("1. IoU Calculation");
    let bbox1 = BoundingBox::new(10.0, 10.0, 60.0, 60.0);
    let bbox2 = BoundingBox::new(30.0, 30.0, 80.0, 80.0);
    let iou = calculate_iou(&bbox1, &bbox2);
    println!("   IoU between overlapping boxes: {iou:.4}");
    println!();

    // Example 2: full pipeline over two synthetic images
    println!("2. Evaluating two images");
    let mut config = EvalConfig::new(2);
    config.class_names = vec!["person".to_string(), "car".to_string()];
    config.conf_threshold = 0.25;
    config.multi_label = false;
    config.capture_records = true;
    let mut evaluator = Evaluator::new(config)?;

    let samples = vec![
        ImageSample {
            image_id: 0,
            predictions: vec![
                // A confident person detection right on its ground truth
                RawPrediction {
                    bbox: [100.0, 100.0, 60.0, 80.0],
                    objectness: 0.95,
                    class_scores: vec![0.9, 0.1],
                },
                // A duplicate that NMS should suppress
                RawPrediction {
                    bbox: [102.0, 101.0, 60.0, 80.0],
                    objectness: 0.80,
                    class_scores: vec![0.85, 0.15],
                },
            ],
            ground_truths: vec![GroundTruth::new(
                0,
                0,
                BoundingBox::from_xywh([100.0, 100.0, 60.0, 80.0]),
            )],
            inference_shape: (416.0, 416.0),
            original_shape: (480.0, 640.0),
        },
        ImageSample {
            image_id: 1,
            predictions: vec![
                // A spurious car detection with nothing underneath it
                RawPrediction {
                    bbox: [300.0, 300.0, 50.0, 50.0],
                    objectness: 0.6,
                    class_scores: vec![0.2, 0.7],
                },
            ],
            ground_truths: vec![GroundTruth::new(
                1,
                1,
                BoundingBox::from_xywh([150.0, 150.0, 50.0, 50.0]),
            )],
            inference_shape: (416.0, 416.0),
            original_shape: (480.0, 640.0),
        },
    ];

    let report = evaluator.run(samples)?;
    println!("{report}");

    println!("3. Run counters");
    println!("   {}", evaluator.counters().summary_string());
    println!();

    println!("4. Result records for external scoring");
    println!("   {}", records_to_json(evaluator.records())?);

    Ok(())
}

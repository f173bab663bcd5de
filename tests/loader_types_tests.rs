//! Tests for the loader and core type modules.

use std::io::Write;

use det_eval::loader::{
    coco80_to_coco91_class, load_classes, load_records_from_file, records_to_json,
    write_records_to_file,
};
use det_eval::types::{BoundingBox, CocoRecord, Detection, GroundTruth};

#[test]
fn test_load_classes_from_names_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "person").unwrap();
    writeln!(file, "bicycle").unwrap();
    writeln!(file).unwrap();
    writeln!(file, "  car  ").unwrap();
    file.flush().unwrap();

    let names = load_classes(file.path()).unwrap();
    assert_eq!(names, vec!["person", "bicycle", "car"]);
}

#[test]
fn test_load_classes_empty_file_is_error() {
    let file = tempfile::NamedTempFile::new().unwrap();
    assert!(load_classes(file.path()).is_err());
}

#[test]
fn test_records_json_roundtrip() {
    let records = vec![
        CocoRecord {
            image_id: 42,
            category_id: 18,
            bbox: [258.15, 41.29, 348.26, 243.78],
            score: 0.236,
        },
        CocoRecord {
            image_id: 43,
            category_id: 1,
            bbox: [0.0, 0.0, 10.0, 10.0],
            score: 0.9,
        },
    ];

    let file = tempfile::NamedTempFile::new().unwrap();
    write_records_to_file(&records, file.path()).unwrap();
    let loaded = load_records_from_file(file.path()).unwrap();
    assert_eq!(records, loaded);
}

#[test]
fn test_record_json_field_names() {
    let json = records_to_json(&[CocoRecord {
        image_id: 1,
        category_id: 2,
        bbox: [1.0, 2.0, 3.0, 4.0],
        score: 0.5,
    }])
    .unwrap();

    // The external-scorer contract fixes these field names
    for field in ["image_id", "category_id", "bbox", "score"] {
        assert!(json.contains(field), "missing field {field} in {json}");
    }
}

#[test]
fn test_coco_remap_table_known_entries() {
    let table = coco80_to_coco91_class();
    // person stays 1, the numbering gaps start after stop sign
    assert_eq!(table[0], 1);
    assert_eq!(table[10], 11);
    assert_eq!(table[11], 13);
    assert_eq!(table[60], 67);
    assert_eq!(table[79], 90);
}

#[test]
fn test_bounding_box_conversions() {
    let bbox = BoundingBox::from_xywh([100.0, 50.0, 40.0, 20.0]);
    assert_eq!(bbox, BoundingBox::new(80.0, 40.0, 120.0, 60.0));
    assert_eq!(bbox.to_ltwh(), [80.0, 40.0, 40.0, 20.0]);

    let back = bbox.to_xywh();
    assert_eq!(back, [100.0, 50.0, 40.0, 20.0]);
}

#[test]
fn test_detection_and_ground_truth_serde() {
    let detection = Detection {
        image_id: 3,
        class_id: 7,
        bbox: BoundingBox::new(0.0, 0.0, 10.0, 10.0),
        score: 0.75,
    };
    let json = serde_json::to_string(&detection).unwrap();
    let back: Detection = serde_json::from_str(&json).unwrap();
    assert_eq!(detection, back);

    let mut gt = GroundTruth::new(3, 7, BoundingBox::new(0.0, 0.0, 10.0, 10.0));
    gt.visibility = Some("visible".to_string());
    let json = serde_json::to_string(&gt).unwrap();
    // Unset attributes are omitted from the wire shape
    assert!(!json.contains("orientation"));
    let back: GroundTruth = serde_json::from_str(&json).unwrap();
    assert_eq!(gt, back);
}

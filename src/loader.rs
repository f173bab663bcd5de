//! Class-name loading and results JSON serialization.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read};
use std::path::Path;

use crate::error::{EvalError, Result};
use crate::types::CocoRecord;

/// Load class names from a file with one name per line.
///
/// Blank lines and surrounding whitespace are ignored. The line index is
/// the class id.
///
/// # Errors
///
/// Returns an error if the file cannot be read or contains no names.
pub fn load_classes<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut names = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let name = line.trim();
        if !name.is_empty() {
            names.push(name.to_string());
        }
    }

    if names.is_empty() {
        return Err(EvalError::EmptyDataset(
            "names file contains no class names".to_string(),
        ));
    }

    Ok(names)
}

/// The 80-class to 91-class COCO category id lookup table.
///
/// Index is the contiguous 80-class id; the value is the sparse paper-91
/// category id expected by external scoring tools.
#[must_use]
pub fn coco80_to_coco91_class() -> [u64; 80] {
    [
        1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25,
        27, 28, 31, 32, 33, 34, 35, 36, 37, 38, 39, 40, 41, 42, 43, 44, 46, 47, 48, 49, 50, 51,
        52, 53, 54, 55, 56, 57, 58, 59, 60, 61, 62, 63, 64, 65, 67, 70, 72, 73, 74, 75, 76, 77,
        78, 79, 80, 81, 82, 84, 85, 86, 87, 88, 89, 90,
    ]
}

/// Serialize result records to a JSON string in the detection-challenge
/// shape.
pub fn records_to_json(records: &[CocoRecord]) -> Result<String> {
    Ok(serde_json::to_string(records)?)
}

/// Write result records to a JSON file (the `results.json` convention).
pub fn write_records_to_file<P: AsRef<Path>>(records: &[CocoRecord], path: P) -> Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer(writer, records)?;
    Ok(())
}

/// Load result records from a JSON file.
pub fn load_records_from_file<P: AsRef<Path>>(path: P) -> Result<Vec<CocoRecord>> {
    let mut file = File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    Ok(serde_json::from_str(&contents)?)
}

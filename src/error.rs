//! Error types for the det-eval library.

use thiserror::Error;

/// Result type for det-eval operations.
pub type Result<T> = std::result::Result<T, EvalError>;

/// Error types that can occur during detection evaluation.
#[derive(Error, Debug)]
pub enum EvalError {
    /// Error during JSON parsing or serialization.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error during I/O operations.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid confidence or IoU threshold.
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),

    /// Raw prediction row does not match the configured class count.
    #[error("Malformed prediction: {0}")]
    MalformedPrediction(String),

    /// Empty dataset or class list provided.
    #[error("Empty dataset: {0}")]
    EmptyDataset(String),
}

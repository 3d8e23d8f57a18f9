//! Error types for kernel-herding operations.
//!
//! Defines error types for each subsystem:
//! - Herding selection (configuration, exhaustion, invariants)
//! - Kernel oracle build and evaluation
//! - Dataset loading and writing
//! - Configuration file loading

use thiserror::Error;

/// Errors that can occur while selecting a subset with kernel herding.
#[derive(Debug, Error)]
pub enum HerdingError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Cannot select from an empty collection")]
    EmptyCollection,

    #[error("Kernel error: {0}")]
    Kernel(#[from] KernelError),

    #[error("No unselected item left to fall back to: {selected} of {total} items already selected")]
    ExhaustedFallback { selected: usize, total: usize },

    #[error("Index {0} was selected twice")]
    DuplicateSelection(usize),

    #[error("Selected index {index} is out of range for {total} items")]
    InvalidSelection { index: usize, total: usize },
}

/// Errors raised by a kernel oracle.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum KernelError {
    #[error("Kernel evaluated before build")]
    NotBuilt,

    #[error("Cannot build a kernel over an empty collection")]
    EmptyCollection,

    #[error("Index {index} out of range for {len} items")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid kernel parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Invalid kernel specification '{spec}': {reason}")]
    InvalidSpec { spec: String, reason: String },
}

/// Errors that can occur while reading or writing datasets.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Dataset contains no rows")]
    Empty,

    #[error("Row {row} has {actual} values, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("{attributes} attribute names given for rows of width {width}")]
    AttributeMismatch { attributes: usize, width: usize },

    #[error("Line {line}: {reason}")]
    InvalidLine { line: usize, reason: String },

    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("Invalid parameter value: {0}")]
    InvalidParameter(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur while loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

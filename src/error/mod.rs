//! Error handling for the panel pipeline.

pub mod util;

use std::io;
use std::path::PathBuf;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;

/// Specialized error type for the panel pipeline
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Error opening or reading a file
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    /// IO error tied to a specific path
    #[error("IO error at {path}: {message}")]
    PathError {
        /// Path the operation was working on
        path: PathBuf,
        /// What went wrong
        message: String,
    },

    /// Error processing Arrow data (including CSV decoding)
    #[error("Arrow error: {0}")]
    ArrowError(#[from] ArrowError),

    /// Error reading or writing Parquet data
    #[error("Parquet error: {0}")]
    ParquetError(#[from] ParquetError),

    /// Error converting between typed rows and record batches
    #[error("Row conversion error: {0}")]
    SerdeArrowError(#[from] serde_arrow::Error),

    /// HTTP error talking to the price-index service
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Column missing from a batch
    #[error("Column '{column}' not found")]
    ColumnNotFound {
        /// Name of the missing column
        column: String,
    },

    /// Column present but with an unexpected type
    #[error("Column '{column}' is not of type {expected}")]
    InvalidDataType {
        /// Name of the column
        column: String,
        /// Human readable expected type
        expected: String,
    },

    /// Malformed field in the fixed-width geographic reference file
    #[error("Fixed-width record error at line {line}, field '{field}': {message}")]
    FixedWidth {
        /// 1-based line number
        line: usize,
        /// Field name from the layout
        field: &'static str,
        /// Details
        message: String,
    },

    /// Input data or configuration failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// A uniqueness or consistency invariant does not hold; the run must stop
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// A required lookup value was missing
    #[error("Lookup error: {0}")]
    Lookup(String),

    /// The price-index service returned an unusable response
    #[error("API error: {0}")]
    Api(String),
}

impl PipelineError {
    /// Create a path-bound IO error
    pub fn with_path(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::PathError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invariant violation
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation(message.into())
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

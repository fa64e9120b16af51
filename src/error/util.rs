//! Utility functions for error handling
//!
//! Path-aware wrappers around filesystem calls so that every IO failure
//! names the file it happened on.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{PipelineError, Result};

/// Open a file, reporting the purpose and path on failure
///
/// # Arguments
/// * `path` - The path to the file to open
/// * `purpose` - Why the file is being opened (for error context)
pub fn open_file(path: &Path, purpose: &str) -> Result<fs::File> {
    if !path.is_file() {
        return Err(PipelineError::with_path(
            path,
            format!("File not found (needed for: {purpose})"),
        ));
    }

    fs::File::open(path).map_err(|e| {
        let message = match e.kind() {
            io::ErrorKind::PermissionDenied => "Permission denied - check file permissions".to_string(),
            _ => format!("Failed to open file for {purpose}: {e}"),
        };
        PipelineError::with_path(path, message)
    })
}

/// Check that a directory exists and is readable
pub fn validate_directory(path: &Path, purpose: &str) -> Result<()> {
    if !path.is_dir() {
        return Err(PipelineError::with_path(
            path,
            format!("Directory not found (needed for: {purpose})"),
        ));
    }

    fs::read_dir(path)
        .map(|_| ())
        .map_err(|e| PipelineError::with_path(path, format!("Failed to read directory: {e}")))
}

/// Create a directory and its parents, reporting the path on failure
pub fn ensure_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .map_err(|e| PipelineError::with_path(path, format!("Failed to create directory: {e}")))
}

/// Create (truncate) a file for writing
pub fn create_file(path: &Path) -> Result<fs::File> {
    fs::File::create(path)
        .map_err(|e| PipelineError::with_path(path, format!("Failed to create file: {e}")))
}

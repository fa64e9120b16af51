//! Yearly file discovery
//!
//! Finance extracts ship as one file per fiscal year, named with the
//! four-digit year somewhere in the stem (`1995.csv`, `f33_1995.csv`).
//! Two-digit years such as `indfin_72.csv` are not recognised.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use itertools::Itertools;

use crate::error::{PipelineError, Result};
use crate::error::util::validate_directory;
use crate::utils::logging::{log_operation_complete, log_operation_start, log_warning};

/// Extract the last run of exactly four digits in a file stem as a year
#[must_use]
pub fn year_from_file_name(path: &Path) -> Option<i32> {
    let stem = path.file_stem()?.to_str()?;
    stem.split(|c: char| !c.is_ascii_digit())
        .filter(|run| run.len() == 4)
        .last()
        .and_then(|run| run.parse().ok())
}

/// Find all files with `extension` in `dir`, keyed by the year in their name
///
/// Two files claiming the same year is an error: which one wins would
/// depend on directory order.
pub fn find_year_files(dir: &Path, extension: &str) -> Result<BTreeMap<i32, PathBuf>> {
    log_operation_start("Searching for yearly files in", dir);
    validate_directory(dir, "yearly extracts")?;

    let paths = std::fs::read_dir(dir)
        .map_err(|e| PipelineError::with_path(dir, format!("Failed to read directory: {e}")))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == extension))
        .sorted()
        .collect_vec();

    let mut files = BTreeMap::new();
    for path in paths {
        let Some(year) = year_from_file_name(&path) else {
            log_warning("Skipping file without a year in its name", Some(&path));
            continue;
        };
        if let Some(previous) = files.insert(year, path.clone()) {
            return Err(PipelineError::Validation(format!(
                "two files for year {year}: {} and {}",
                previous.display(),
                path.display()
            )));
        }
    }

    if files.is_empty() {
        log_warning("No yearly files found in directory", Some(dir));
    } else {
        log_operation_complete("found", dir, files.len(), None);
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_from_file_name() {
        assert_eq!(year_from_file_name(Path::new("1995.csv")), Some(1995));
        assert_eq!(year_from_file_name(Path::new("dir/f33_1995.csv")), Some(1995));
        assert_eq!(year_from_file_name(Path::new("indfin_1972_v2.csv")), Some(1972));
        assert_eq!(year_from_file_name(Path::new("indfin_72.csv")), None);
    }
}

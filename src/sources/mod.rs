//! Source importers
//!
//! Each raw input is read into typed records:
//! - modern finance extracts (7-character district key), one CSV per year
//! - historical finance extracts (9-character government key), one CSV per year
//! - the fixed-width 1969 geographic reference file
//! - auxiliary lookups (state codes, reform years, income, population)

pub mod georef;
pub mod historical;
pub mod lookups;
pub mod modern;
pub mod schemas;

pub use georef::{load_georef, parse_georef};
pub use historical::{HistoricalFinance, load_historical_finance};
pub use modern::{ModernFinance, load_modern_finance};

use std::path::PathBuf;

use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use rayon::prelude::*;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::models::DistrictYear;
use crate::utils::io::{find_year_files, read_csv};
use crate::utils::logging::{create_main_progress_bar, finish_progress_bar};

/// A finance source delivered as one CSV file per fiscal year
pub trait FinanceSource: Send + Sync {
    /// Name used in logs
    fn source_name(&self) -> &'static str;

    /// Declared columns of the yearly files
    fn schema(&self) -> SchemaRef;

    /// Directory holding the yearly files
    fn directory(&self, config: &PipelineConfig) -> PathBuf;

    /// Convert one batch of a year's file into district records
    fn parse_batch(&self, batch: &RecordBatch, year: i32) -> Result<Vec<DistrictYear>>;

    /// Load every yearly file, in year order
    ///
    /// Files are read in parallel; the result is ordered by year and, within
    /// a year, by file row order.
    fn load(&self, config: &PipelineConfig) -> Result<Vec<DistrictYear>> {
        let dir = self.directory(config);
        let files: Vec<(i32, PathBuf)> = find_year_files(&dir, "csv")?.into_iter().collect();
        let schema = self.schema();

        let pb = create_main_progress_bar(files.len() as u64, Some(self.source_name()));
        let per_year: Vec<Result<Vec<DistrictYear>>> = files
            .par_iter()
            .map(|(year, path)| {
                let mut rows = Vec::new();
                for batch in read_csv(path)? {
                    schemas::validate_columns(&batch, &schema).map_err(|e| {
                        PipelineError::with_path(path, e.to_string())
                    })?;
                    rows.extend(self.parse_batch(&batch, *year)?);
                }
                pb.inc(1);
                Ok(rows)
            })
            .collect();
        finish_progress_bar(&pb, Some("done"));

        let mut records = Vec::new();
        for rows in per_year {
            records.extend(rows?);
        }

        log::info!(
            "Loaded {} {} records from {} yearly files",
            records.len(),
            self.source_name(),
            files.len()
        );
        Ok(records)
    }
}

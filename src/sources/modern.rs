//! Modern finance extracts (post-1992), keyed by the 7-character district code

use std::path::PathBuf;

use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::models::{DistrictLevel, DistrictYear, HistoricalKey, ModernKey};
use crate::sources::FinanceSource;
use crate::sources::schemas::modern_finance_schema;
use crate::utils::arrow::{extract_float64, extract_strings};

/// Loader for the modern finance extracts
#[derive(Debug, Default, Clone, Copy)]
pub struct ModernFinance;

impl FinanceSource for ModernFinance {
    fn source_name(&self) -> &'static str {
        "modern finance"
    }

    fn schema(&self) -> SchemaRef {
        modern_finance_schema()
    }

    fn directory(&self, config: &PipelineConfig) -> PathBuf {
        config.modern_path()
    }

    fn parse_batch(&self, batch: &RecordBatch, year: i32) -> Result<Vec<DistrictYear>> {
        let leaids = extract_strings(batch, "leaid", true)?;
        let govids = extract_strings(batch, "govid", false)?;
        let states = extract_strings(batch, "fipst", false)?;
        let levels = extract_strings(batch, "schlev", false)?;
        let expenditures = extract_float64(batch, "totalexp", true)?;
        let enrollments = extract_float64(batch, "enroll", true)?;

        let mut rows = Vec::with_capacity(batch.num_rows());
        let mut unkeyed = 0usize;
        for row in 0..batch.num_rows() {
            let Some(modern_key) = leaids[row].as_deref().and_then(ModernKey::parse) else {
                unkeyed += 1;
                continue;
            };
            let state = states[row]
                .as_deref()
                .map(|s| format!("{s:0>2}"))
                .unwrap_or_else(|| modern_key.state_fips().to_string());

            rows.push(DistrictYear::new(
                Some(modern_key),
                govids[row].as_deref().and_then(HistoricalKey::parse),
                year,
                state,
                levels[row].as_deref().and_then(DistrictLevel::from_code),
                expenditures[row],
                enrollments[row],
            ));
        }

        if unkeyed > 0 {
            log::warn!("{year}: dropped {unkeyed} modern finance rows without a usable district key");
        }
        Ok(rows)
    }
}

/// Load every yearly modern finance file under the configured directory
pub fn load_modern_finance(config: &PipelineConfig) -> Result<Vec<DistrictYear>> {
    ModernFinance.load(config)
}

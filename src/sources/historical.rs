//! Historical finance extracts (pre-1992), keyed by the 9-character government code

use std::path::PathBuf;

use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::models::{DistrictLevel, DistrictYear, HistoricalKey};
use crate::sources::FinanceSource;
use crate::sources::schemas::historical_finance_schema;
use crate::utils::arrow::{extract_float64, extract_strings};

/// Loader for the historical finance extracts
#[derive(Debug, Default, Clone, Copy)]
pub struct HistoricalFinance;

impl FinanceSource for HistoricalFinance {
    fn source_name(&self) -> &'static str {
        "historical finance"
    }

    fn schema(&self) -> SchemaRef {
        historical_finance_schema()
    }

    fn directory(&self, config: &PipelineConfig) -> PathBuf {
        config.historical_path()
    }

    fn parse_batch(&self, batch: &RecordBatch, year: i32) -> Result<Vec<DistrictYear>> {
        let govids = extract_strings(batch, "govid", true)?;
        let states = extract_strings(batch, "fipst", false)?;
        let levels = extract_strings(batch, "schlev", false)?;
        let expenditures = extract_float64(batch, "totalexp", true)?;
        let enrollments = extract_float64(batch, "enroll", true)?;

        let rows: Vec<DistrictYear> = (0..batch.num_rows())
            .filter_map(|row| {
                let historical_key = govids[row].as_deref().and_then(HistoricalKey::parse)?;
                let state = states[row]
                    .as_deref()
                    .map(|s| format!("{s:0>2}"))
                    .unwrap_or_else(|| historical_key.state_fips().to_string());
                Some(DistrictYear::new(
                    None,
                    Some(historical_key),
                    year,
                    state,
                    levels[row].as_deref().and_then(DistrictLevel::from_code),
                    expenditures[row],
                    enrollments[row],
                ))
            })
            .collect();

        let unkeyed = batch.num_rows() - rows.len();
        if unkeyed > 0 {
            log::warn!("{year}: dropped {unkeyed} historical finance rows without a usable government key");
        }
        Ok(rows)
    }
}

/// Load every yearly historical finance file under the configured directory
pub fn load_historical_finance(config: &PipelineConfig) -> Result<Vec<DistrictYear>> {
    HistoricalFinance.load(config)
}

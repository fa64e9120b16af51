//! Schema definitions for the tabular inputs
//!
//! Non-nullable fields are required columns; nullable fields may be absent
//! from a file and read as missing.

pub mod finance;
pub mod lookups;

pub use finance::{historical_finance_schema, modern_finance_schema};
pub use lookups::{
    county_income_schema, county_population_schema, cpi_schema, reform_years_schema,
    state_fips_schema, tract_population_schema,
};

use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;

use crate::error::{PipelineError, Result};

/// Check that every required column of `schema` is present in `batch`
pub fn validate_columns(batch: &RecordBatch, schema: &Schema) -> Result<()> {
    let batch_schema = batch.schema();
    let missing: Vec<&str> = schema
        .fields()
        .iter()
        .filter(|field| !field.is_nullable())
        .filter(|field| batch_schema.field_with_name(field.name()).is_err())
        .map(|field| field.name().as_str())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::Validation(format!(
            "missing required columns: {}",
            missing.join(", ")
        )))
    }
}

//! Auxiliary CSV lookups
//!
//! Small keyed tables joined onto the panels. All of them are optional: a
//! missing file leaves the dependent columns empty and is logged.

use std::collections::BTreeMap;
use std::path::Path;

use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::models::TractId;
use crate::sources::schemas::{
    county_income_schema, county_population_schema, reform_years_schema, state_fips_schema,
    tract_population_schema, validate_columns,
};
use crate::utils::arrow::{extract_float64, extract_int32, extract_strings};
use crate::utils::io::read_csv;
use crate::utils::logging::log_warning;

/// File name of the state FIPS table
pub const STATE_FIPS_FILE: &str = "state_fips.csv";
/// File name of the reform-year table
pub const REFORM_YEARS_FILE: &str = "reform_years.csv";
/// File name of the county income table
pub const COUNTY_INCOME_FILE: &str = "county_income.csv";
/// File name of the tract school-age population table
pub const TRACT_POPULATION_FILE: &str = "tract_population.csv";
/// File name of the county school-age population table
pub const COUNTY_POPULATION_FILE: &str = "county_population.csv";

/// State abbreviation and name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateInfo {
    /// Postal abbreviation
    pub abbrev: String,
    /// Full name
    pub name: Option<String>,
}

/// Values keyed by (county FIPS, year)
pub type CountyYearValues = BTreeMap<(String, i32), f64>;
/// Values keyed by (tract, year)
pub type TractYearValues = BTreeMap<(TractId, i32), f64>;

fn read_lookup(path: &Path, schema: &Schema) -> Result<Vec<RecordBatch>> {
    let batches = read_csv(path)?;
    for batch in &batches {
        validate_columns(batch, schema).map_err(|e| PipelineError::with_path(path, e.to_string()))?;
    }
    Ok(batches)
}

fn read_optional(path: &Path, schema: &Schema) -> Result<Option<Vec<RecordBatch>>> {
    if !path.is_file() {
        log_warning("Optional lookup not found, dependent columns stay empty", Some(path));
        return Ok(None);
    }
    read_lookup(path, schema).map(Some)
}

fn pad_fips(raw: &str, width: usize) -> String {
    format!("{:0>width$}", raw.trim())
}

/// Load the state FIPS table
pub fn load_state_fips(config: &PipelineConfig) -> Result<BTreeMap<String, StateInfo>> {
    let path = config.lookup_path(STATE_FIPS_FILE);
    let Some(batches) = read_optional(&path, &state_fips_schema())? else {
        return Ok(BTreeMap::new());
    };

    let mut states = BTreeMap::new();
    for batch in batches {
        let fips = extract_strings(&batch, "fips", true)?;
        let abbrevs = extract_strings(&batch, "abbrev", true)?;
        let names = extract_strings(&batch, "name", false)?;
        for row in 0..batch.num_rows() {
            if let (Some(fips), Some(abbrev)) = (&fips[row], &abbrevs[row]) {
                states.insert(
                    pad_fips(fips, 2),
                    StateInfo {
                        abbrev: abbrev.to_uppercase(),
                        name: names[row].clone(),
                    },
                );
            }
        }
    }
    Ok(states)
}

/// Load reform years by state; the earliest listed reform of a state wins
pub fn load_reform_years(config: &PipelineConfig) -> Result<BTreeMap<String, i32>> {
    let path = config.lookup_path(REFORM_YEARS_FILE);
    let Some(batches) = read_optional(&path, &reform_years_schema())? else {
        return Ok(BTreeMap::new());
    };

    let mut reforms: BTreeMap<String, i32> = BTreeMap::new();
    for batch in batches {
        let states = extract_strings(&batch, "fipst", true)?;
        let years = extract_int32(&batch, "reform_year", true)?;
        for (state, year) in states.into_iter().zip(years) {
            if let (Some(state), Some(year)) = (state, year) {
                reforms
                    .entry(pad_fips(&state, 2))
                    .and_modify(|existing| *existing = (*existing).min(year))
                    .or_insert(year);
            }
        }
    }
    Ok(reforms)
}

fn load_county_values(path: &Path, schema: &Schema, value_column: &str) -> Result<CountyYearValues> {
    let Some(batches) = read_optional(path, schema)? else {
        return Ok(BTreeMap::new());
    };

    let mut values = BTreeMap::new();
    for batch in batches {
        let counties = extract_strings(&batch, "county_fips", true)?;
        let years = extract_int32(&batch, "year", true)?;
        let amounts = extract_float64(&batch, value_column, true)?;
        for row in 0..batch.num_rows() {
            if let (Some(county), Some(year), Some(amount)) = (&counties[row], years[row], amounts[row]) {
                values.insert((pad_fips(county, 5), year), amount);
            }
        }
    }
    Ok(values)
}

/// Load median income by county-year
pub fn load_county_income(config: &PipelineConfig) -> Result<CountyYearValues> {
    load_county_values(
        &config.lookup_path(COUNTY_INCOME_FILE),
        &county_income_schema(),
        "median_income",
    )
}

/// Load school-age population by county-year
pub fn load_county_population(config: &PipelineConfig) -> Result<CountyYearValues> {
    load_county_values(
        &config.lookup_path(COUNTY_POPULATION_FILE),
        &county_population_schema(),
        "population",
    )
}

/// Load school-age population by tract-year
pub fn load_tract_population(config: &PipelineConfig) -> Result<TractYearValues> {
    let path = config.lookup_path(TRACT_POPULATION_FILE);
    let Some(batches) = read_optional(&path, &tract_population_schema())? else {
        return Ok(BTreeMap::new());
    };

    let mut values = BTreeMap::new();
    let mut unparsed = 0usize;
    for batch in batches {
        let tracts = extract_strings(&batch, "tract", true)?;
        let years = extract_int32(&batch, "year", true)?;
        let populations = extract_float64(&batch, "population", true)?;
        for row in 0..batch.num_rows() {
            let tract = tracts[row].as_deref().and_then(TractId::parse);
            match (tract, years[row], populations[row]) {
                (Some(tract), Some(year), Some(population)) => {
                    values.insert((tract, year), population);
                }
                _ => unparsed += 1,
            }
        }
    }
    if unparsed > 0 {
        log::warn!("Skipped {unparsed} tract population rows with a malformed tract, year or value");
    }
    Ok(values)
}

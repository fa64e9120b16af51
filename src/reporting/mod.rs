//! Columns consumed by the downstream regression layer
//!
//! Reform timing, baseline quartiles, county income and deflated spending
//! are joined onto the county panel here; the estimation itself happens
//! outside this crate.

pub mod event_time;
pub mod inflation;

pub use event_time::{EventWindow, baseline_quartiles};
pub use inflation::CpiSeries;

use std::collections::BTreeMap;

use crate::config::VariantConfig;
use crate::error::Result;
use crate::models::{CountyYear, DistrictPanelRow};
use crate::sources::lookups::CountyYearValues;

/// State-level and county-level inputs for annotating the county panel
#[derive(Debug, Clone, Default)]
pub struct ReportingInputs {
    /// First reform year by state FIPS
    pub reform_years: BTreeMap<String, i32>,
    /// Median income by (county, year)
    pub county_income: CountyYearValues,
    /// CPI series, required when the variant deflates
    pub cpi: Option<CpiSeries>,
}

/// Fill reform timing, quartile, income and real spending on county rows
pub fn annotate_counties(
    counties: &mut [CountyYear],
    inputs: &ReportingInputs,
    variant: &VariantConfig,
) -> Result<()> {
    let set_index = variant.primary_set_index();
    let baseline_years = variant
        .baseline_sets
        .get(set_index)
        .map(|set| set.years.clone())
        .unwrap_or_default();
    let quartiles = baseline_quartiles(counties, set_index, &baseline_years);

    let mut never_reformed = 0usize;
    for county in counties.iter_mut() {
        county.reform_year = inputs.reform_years.get(county.state_fips()).copied();
        if county.reform_year.is_none() {
            never_reformed += 1;
        }
        county.event_time = variant.event_window.relative_year(county.year, county.reform_year);
        county.baseline_quartile = quartiles.get(&county.county_fips).copied();
        county.median_income = inputs
            .county_income
            .get(&(county.county_fips.clone(), county.year))
            .copied();
        county.real_per_pupil = deflate(county.per_pupil, county.year, inputs, variant)?;
    }

    log::info!(
        "Annotated {} county-years ({} in states without a reform, {} ranked counties)",
        counties.len(),
        never_reformed,
        quartiles.len()
    );
    Ok(())
}

/// Fill real spending on district panel rows
pub fn annotate_districts(
    rows: &mut [DistrictPanelRow],
    inputs: &ReportingInputs,
    variant: &VariantConfig,
) -> Result<()> {
    for row in rows.iter_mut() {
        row.real_per_pupil = deflate(row.per_pupil, row.year, inputs, variant)?;
    }
    Ok(())
}

fn deflate(
    value: Option<f64>,
    year: i32,
    inputs: &ReportingInputs,
    variant: &VariantConfig,
) -> Result<Option<f64>> {
    match (value, variant.deflate_to, &inputs.cpi) {
        (Some(value), Some(base), Some(cpi)) => cpi.deflate(value, year, base).map(Some),
        _ => Ok(None),
    }
}

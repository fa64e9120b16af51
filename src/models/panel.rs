//! Panel rows emitted at the district, tract and county level
//!
//! Quality flags are stored positionally, one entry per baseline set of the
//! variant that produced the row.

use std::fmt;

use crate::models::types::{DistrictLevel, HistoricalKey, ModernKey, TractId};

/// Provenance of a panel value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    /// Reported in a finance extract
    Observed,
    /// Filled by gap-limited interpolation
    Interpolated,
    /// Trailing moving average of observed and interpolated values
    Smoothed,
    /// Not available
    Missing,
}

impl ValueSource {
    /// Label written to output tables
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Observed => "observed",
            Self::Interpolated => "interpolated",
            Self::Smoothed => "smoothed",
            Self::Missing => "missing",
        }
    }
}

/// District-year row of the dense district panel
#[derive(Debug, Clone, PartialEq)]
pub struct DistrictPanelRow {
    /// District (modern key)
    pub district: ModernKey,
    /// Historical key, mode-filled across the district's rows
    pub historical_key: Option<HistoricalKey>,
    /// 2-digit state FIPS
    pub state_fips: String,
    /// Grade span, mode-filled
    pub level: Option<DistrictLevel>,
    /// Fiscal year
    pub year: i32,
    /// Per-pupil expenditure (nominal, possibly smoothed)
    pub per_pupil: Option<f64>,
    /// Where `per_pupil` came from
    pub source: ValueSource,
    /// Baseline quality flags
    pub flags: Vec<bool>,
    /// Per-pupil expenditure in base-year dollars
    pub real_per_pupil: Option<f64>,
}

/// Tract-year row
#[derive(Debug, Clone, PartialEq)]
pub struct TractYear {
    /// Tract identifier
    pub tract: TractId,
    /// Fiscal year
    pub year: i32,
    /// Weight used when collapsing into counties
    pub population: Option<f64>,
    /// Allocated-population-weighted mean of district spending
    pub per_pupil: Option<f64>,
    /// Number of serving districts with spending in this year
    pub district_count: usize,
    /// District with the largest allocated population
    pub dominant_district: Option<ModernKey>,
    /// Baseline quality flags (AND over serving districts)
    pub flags: Vec<bool>,
}

/// How much of a county-year is covered by real Census tracts
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CountyCoverage {
    /// Only real tracts
    FullyTracted,
    /// One untracted area and nothing else
    FullyUntracted,
    /// One untracted remainder plus real tracts
    Mixed,
    /// Two or more untracted remainders
    MultiplyUntracted,
    /// Nothing usable; excluded from the panel
    Invalid,
}

impl CountyCoverage {
    /// Classify from the number of tracted and untracted areas
    #[must_use]
    pub fn classify(tracted: usize, untracted: usize) -> Self {
        match (tracted, untracted) {
            (0, 0) => Self::Invalid,
            (_, 0) => Self::FullyTracted,
            (0, 1) => Self::FullyUntracted,
            (_, 1) => Self::Mixed,
            _ => Self::MultiplyUntracted,
        }
    }

    /// Label written to output tables
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FullyTracted => "fully_tracted",
            Self::FullyUntracted => "fully_untracted",
            Self::Mixed => "mixed",
            Self::MultiplyUntracted => "multiply_untracted",
            Self::Invalid => "invalid",
        }
    }
}

impl fmt::Display for CountyCoverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// County-year row of the final panel
#[derive(Debug, Clone, PartialEq)]
pub struct CountyYear {
    /// 5-digit county FIPS
    pub county_fips: String,
    /// Fiscal year
    pub year: i32,
    /// Tract coverage class
    pub coverage: CountyCoverage,
    /// Number of real tracts
    pub tracted_areas: usize,
    /// Number of untracted rows before collapse
    pub untracted_areas: usize,
    /// Sum of weights used in the mean
    pub population: f64,
    /// Weighted mean per-pupil expenditure
    pub per_pupil: Option<f64>,
    /// Untracted residual population came out negative
    pub negative_residual: bool,
    /// Baseline quality flags (AND over tracts)
    pub flags: Vec<bool>,
    /// First reform year of the county's state
    pub reform_year: Option<i32>,
    /// Binned years relative to reform
    pub event_time: Option<i32>,
    /// Quartile (1-4) of baseline spending
    pub baseline_quartile: Option<u8>,
    /// County median income
    pub median_income: Option<f64>,
    /// Per-pupil expenditure in base-year dollars
    pub real_per_pupil: Option<f64>,
}

impl CountyYear {
    /// State FIPS prefix of the county
    #[must_use]
    pub fn state_fips(&self) -> &str {
        &self.county_fips[..2.min(self.county_fips.len())]
    }
}

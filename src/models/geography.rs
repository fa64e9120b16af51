//! Geographic reference records and tract-to-district allocations

use serde::{Deserialize, Serialize};

use crate::models::types::{DistrictLevel, ModernKey, TractId};

/// One line of the 1969 geographic reference file: a (tract, district) link
#[derive(Debug, Clone, PartialEq)]
pub struct GeoRefRecord {
    /// 1-based line number in the source file
    pub line: usize,
    /// Serving district
    pub district: Option<ModernKey>,
    /// District grade span
    pub level: Option<DistrictLevel>,
    /// District name as printed in the file
    pub district_name: String,
    /// Census tract (or untracted county remainder)
    pub tract: TractId,
    /// Total tract population
    pub population: Option<f64>,
    /// Share of the tract served by the district, in percent
    pub percent_of_tract: Option<f64>,
}

/// Population of one tract attributed to one serving district
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    /// Tract identifier
    pub tract: TractId,
    /// Serving district
    pub district: ModernKey,
    /// District level code (0 when unknown)
    pub level_code: i8,
    /// Tract population × percent served ÷ 100
    pub allocated_population: f64,
}

impl Allocation {
    /// Level code for an optional level
    #[must_use]
    pub fn level_code_of(level: Option<DistrictLevel>) -> i8 {
        level.map_or(0, DistrictLevel::code)
    }
}

//! District finance records

use crate::models::types::{DistrictLevel, HistoricalKey, ModernKey};

/// One district in one fiscal year, from either finance source
#[derive(Debug, Clone, PartialEq)]
pub struct DistrictYear {
    /// Modern 7-character key (absent for historical rows until crosswalked)
    pub modern_key: Option<ModernKey>,
    /// Historical 9-character key
    pub historical_key: Option<HistoricalKey>,
    /// Fiscal year
    pub year: i32,
    /// 2-digit state FIPS code
    pub state_fips: String,
    /// Grade span
    pub level: Option<DistrictLevel>,
    /// Total expenditure in nominal dollars
    pub total_expenditure: Option<f64>,
    /// Fall enrollment
    pub enrollment: Option<f64>,
    /// Expenditure divided by enrollment
    pub per_pupil: Option<f64>,
    /// Set when per-pupil spending is undefined because enrollment is zero
    /// or negative, or expenditure is negative
    pub invalid_per_pupil: bool,
}

impl DistrictYear {
    /// Create a record and derive its per-pupil expenditure
    #[must_use]
    pub fn new(
        modern_key: Option<ModernKey>,
        historical_key: Option<HistoricalKey>,
        year: i32,
        state_fips: String,
        level: Option<DistrictLevel>,
        total_expenditure: Option<f64>,
        enrollment: Option<f64>,
    ) -> Self {
        let (per_pupil, invalid_per_pupil) = derive_per_pupil(total_expenditure, enrollment);
        Self {
            modern_key,
            historical_key,
            year,
            state_fips,
            level,
            total_expenditure,
            enrollment,
            per_pupil,
            invalid_per_pupil,
        }
    }

    /// State code, falling back to the key prefixes when the column was blank
    #[must_use]
    pub fn state(&self) -> &str {
        if !self.state_fips.is_empty() {
            return &self.state_fips;
        }
        self.modern_key
            .as_ref()
            .map(ModernKey::state_fips)
            .or_else(|| self.historical_key.as_ref().map(HistoricalKey::state_fips))
            .unwrap_or("")
    }
}

/// Per-pupil expenditure and whether the row must be flagged as invalid
///
/// Missing inputs give a missing value without the flag; a zero or negative
/// enrollment, or a negative expenditure, give a missing value with the flag.
#[must_use]
pub fn derive_per_pupil(expenditure: Option<f64>, enrollment: Option<f64>) -> (Option<f64>, bool) {
    let expenditure = expenditure.filter(|v| v.is_finite());
    let enrollment = enrollment.filter(|v| v.is_finite());

    let invalid = expenditure.is_some_and(|e| e < 0.0) || enrollment.is_some_and(|n| n <= 0.0);
    if invalid {
        return (None, true);
    }

    match (expenditure, enrollment) {
        (Some(e), Some(n)) => (Some(e / n), false),
        _ => (None, false),
    }
}

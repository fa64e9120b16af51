//! Identifier and code types shared by all stages.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Length of a modern (post-1992) district key
pub const MODERN_KEY_LEN: usize = 7;
/// Length of a historical (pre-1992) government unit key
pub const HISTORICAL_KEY_LEN: usize = 9;

/// Values used as placeholders for "no key" in the raw extracts
fn is_placeholder(raw: &str) -> bool {
    raw.is_empty()
        || matches!(raw, "." | "N" | "M" | "NA")
        || raw.chars().all(|c| c == '0')
        || raw.chars().all(|c| c == '9')
}

/// Normalise a raw key: trim, upper-case, left-pad all-digit keys that lost
/// their leading zeros, reject placeholders and wrong lengths.
fn normalize_key(raw: &str, len: usize) -> Option<String> {
    let trimmed = raw.trim();
    if is_placeholder(trimmed) || !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }

    let key = if trimmed.len() < len && trimmed.chars().all(|c| c.is_ascii_digit()) {
        format!("{trimmed:0>len$}")
    } else {
        trimmed.to_ascii_uppercase()
    };

    (key.len() == len).then_some(key)
}

/// 7-character district identifier of the modern finance source
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModernKey(String);

impl ModernKey {
    /// Parse a raw value, returning `None` for missing or placeholder keys
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        normalize_key(raw, MODERN_KEY_LEN).map(Self)
    }

    /// Key built from a 2-digit state code and a 5-digit district code
    #[must_use]
    pub fn from_parts(state_fips: &str, district_code: &str) -> Option<Self> {
        let state = state_fips.trim();
        let district = district_code.trim();
        if state.is_empty() || district.is_empty() {
            return None;
        }
        Self::parse(&format!("{state:0>2}{district:0>5}"))
    }

    /// The key as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// State FIPS prefix
    #[must_use]
    pub fn state_fips(&self) -> &str {
        &self.0[..2]
    }
}

impl fmt::Display for ModernKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 9-character government unit identifier of the historical finance source
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoricalKey(String);

impl HistoricalKey {
    /// Parse a raw value, returning `None` for missing or placeholder keys
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        normalize_key(raw, HISTORICAL_KEY_LEN).map(Self)
    }

    /// The key as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// State FIPS prefix
    #[must_use]
    pub fn state_fips(&self) -> &str {
        &self.0[..2]
    }
}

impl fmt::Display for HistoricalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Grade span served by a district
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DistrictLevel {
    /// Elementary-only district
    Elementary,
    /// Secondary-only district
    Secondary,
    /// Unified K-12 district
    Unified,
    /// Any other agency type
    Other,
}

impl DistrictLevel {
    /// Parse a level code (`1`/`01` elementary, `2` secondary, `3` unified)
    #[must_use]
    pub fn from_code(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(match trimmed.trim_start_matches('0') {
            "1" => Self::Elementary,
            "2" => Self::Secondary,
            "3" => Self::Unified,
            _ => Self::Other,
        })
    }

    /// Numeric code written to output tables
    #[must_use]
    pub fn code(self) -> i8 {
        match self {
            Self::Elementary => 1,
            Self::Secondary => 2,
            Self::Unified => 3,
            Self::Other => 9,
        }
    }
}

/// 11-digit Census tract identifier: state(2) county(3) base(4) suffix(2)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TractId(String);

impl TractId {
    /// Build from the four components; blank base or suffix become zeros
    #[must_use]
    pub fn from_parts(state: &str, county: &str, base: &str, suffix: &str) -> Option<Self> {
        let pad = |value: &str, width: usize| -> Option<String> {
            let value = value.trim();
            if !value.chars().all(|c| c.is_ascii_digit()) || value.len() > width {
                return None;
            }
            Some(format!("{value:0>width$}"))
        };
        let state = state.trim();
        let county = county.trim();
        if state.is_empty() || county.is_empty() {
            return None;
        }
        Some(Self(format!(
            "{}{}{}{}",
            pad(state, 2)?,
            pad(county, 3)?,
            pad(base, 4)?,
            pad(suffix, 2)?
        )))
    }

    /// Parse an 11-digit composite
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (trimmed.len() == 11 && trimmed.chars().all(|c| c.is_ascii_digit()))
            .then(|| Self(trimmed.to_string()))
    }

    /// The identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// State FIPS code
    #[must_use]
    pub fn state_fips(&self) -> &str {
        &self.0[..2]
    }

    /// 5-digit county FIPS code (state + county)
    #[must_use]
    pub fn county_fips(&self) -> &str {
        &self.0[..5]
    }

    /// Numeric tract base code
    #[must_use]
    pub fn base_code(&self) -> u16 {
        self.0[5..9].parse().unwrap_or(0)
    }

    /// Untracted areas carry no base code
    #[must_use]
    pub fn is_untracted(&self) -> bool {
        &self.0[5..9] == "0000"
    }
}

impl fmt::Display for TractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

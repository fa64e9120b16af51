//! Event time relative to a state's reform and baseline spending quartiles

use std::collections::{BTreeMap, BTreeSet};

use crate::models::CountyYear;

/// Window of event times; years outside it are binned into its ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventWindow {
    /// Earliest lead, negative
    pub min_lead: i32,
    /// Latest lag
    pub max_lag: i32,
}

impl Default for EventWindow {
    fn default() -> Self {
        Self {
            min_lead: -5,
            max_lag: 15,
        }
    }
}

impl EventWindow {
    /// Years since reform, binned at the window ends; `None` when never reformed
    #[must_use]
    pub fn relative_year(&self, year: i32, reform_year: Option<i32>) -> Option<i32> {
        reform_year.map(|reform| (year - reform).clamp(self.min_lead, self.max_lag))
    }
}

/// Quartile (1-4) of mean baseline spending per county
///
/// Only counties good for the set at `set_index` are ranked. Counties are
/// ordered by their mean spending over `baseline_years`, ties by FIPS code.
#[must_use]
pub fn baseline_quartiles(
    county_panel: &[CountyYear],
    set_index: usize,
    baseline_years: &BTreeSet<i32>,
) -> BTreeMap<String, u8> {
    let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for row in county_panel {
        if !baseline_years.contains(&row.year) || !row.flags.get(set_index).copied().unwrap_or(false) {
            continue;
        }
        if let Some(value) = row.per_pupil {
            let entry = sums.entry(&row.county_fips).or_default();
            entry.0 += value;
            entry.1 += 1;
        }
    }

    let mut means: Vec<(&str, f64)> = sums
        .into_iter()
        .map(|(county, (sum, n))| (county, sum / n as f64))
        .collect();
    means.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)));

    let n = means.len();
    means
        .into_iter()
        .enumerate()
        .map(|(rank, (county, _))| {
            let quartile = u8::try_from(rank * 4 / n + 1).unwrap_or(4);
            (county.to_string(), quartile)
        })
        .collect()
}

//! Tract-year spending from dominant district assignments

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::algorithm::aggregation::weighted_mean;
use crate::algorithm::quality::FlagTable;
use crate::models::{Allocation, DistrictPanelRow, ModernKey, TractId, TractYear};

/// Build the dense tract-year panel
///
/// `assignments` are the dominant (tract, level) allocations. Every tract
/// with an assignment gets one row per year of `years`; spending is the mean
/// of the assigned districts that have a value that year, weighted by
/// allocated population. `weights` supplies the tract population used later
/// when collapsing into counties.
#[must_use]
pub fn aggregate_tracts(
    assignments: &[Allocation],
    district_panel: &[DistrictPanelRow],
    tract_flags: &FlagTable<TractId>,
    weights: &BTreeMap<TractId, f64>,
    years: RangeInclusive<i32>,
) -> Vec<TractYear> {
    let spending: FxHashMap<(&ModernKey, i32), f64> = district_panel
        .iter()
        .filter_map(|row| Some(((&row.district, row.year), row.per_pupil?)))
        .collect();

    let mut by_tract: BTreeMap<&TractId, SmallVec<[&Allocation; 4]>> = BTreeMap::new();
    for assignment in assignments {
        by_tract.entry(&assignment.tract).or_default().push(assignment);
    }

    let mut rows = Vec::with_capacity(by_tract.len() * years.clone().count());
    for (tract, mut districts) in by_tract {
        districts.sort_by(|a, b| {
            b.allocated_population
                .total_cmp(&a.allocated_population)
                .then_with(|| a.district.cmp(&b.district))
        });
        let dominant_district = districts.first().map(|a| a.district.clone());
        let flags = tract_flags.flags_or_default(tract);
        let population = weights.get(tract).copied();

        for year in years.clone() {
            let contributions: SmallVec<[(f64, f64); 4]> = districts
                .iter()
                .filter_map(|a| {
                    let value = spending.get(&(&a.district, year))?;
                    Some((*value, a.allocated_population))
                })
                .collect();

            rows.push(TractYear {
                tract: tract.clone(),
                year,
                population,
                per_pupil: weighted_mean(&contributions),
                district_count: contributions.len(),
                dominant_district: dominant_district.clone(),
                flags: flags.clone(),
            });
        }
    }

    rows
}

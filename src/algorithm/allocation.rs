//! Tract-to-district population allocation
//!
//! Splits each tract's 1970 population among its serving districts using the
//! percent-of-tract figure, then picks one dominant district per tract and
//! district level.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use smallvec::SmallVec;

use crate::error::{PipelineError, Result};
use crate::models::{Allocation, GeoRefRecord, ModernKey, TractId};

/// Class of a geographic area by its tract base code
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TractClass {
    /// A real Census tract
    Regular,
    /// County remainder without tract subdivision (base code blank or 0000)
    Untracted,
    /// Tribal land, 9400-9499
    Tribal,
    /// Non-residential or administrative area, 9800-9899
    NonResidential,
    /// Water body, 9900-9989
    Water,
    /// Tract-revision sliver, 9990-9999
    Sliver,
}

impl TractClass {
    /// Classify a tract by its base code
    #[must_use]
    pub fn classify(tract: &TractId) -> Self {
        if tract.is_untracted() {
            return Self::Untracted;
        }
        match tract.base_code() {
            9400..=9499 => Self::Tribal,
            9800..=9899 => Self::NonResidential,
            9900..=9989 => Self::Water,
            9990..=9999 => Self::Sliver,
            _ => Self::Regular,
        }
    }

    /// Special areas are dropped before allocation
    #[must_use]
    pub fn is_excluded(self) -> bool {
        matches!(
            self,
            Self::Tribal | Self::NonResidential | Self::Water | Self::Sliver
        )
    }
}

impl fmt::Display for TractClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Regular => "regular",
            Self::Untracted => "untracted",
            Self::Tribal => "tribal",
            Self::NonResidential => "non-residential",
            Self::Water => "water",
            Self::Sliver => "sliver",
        };
        f.write_str(label)
    }
}

/// Absent population or percentage figures count as zero
///
/// Applied wherever such figures are summed, so a missing figure lowers the
/// sum instead of removing the row from it.
#[must_use]
pub fn absent_as_zero(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Allocate each tract's population to its serving districts
///
/// Special areas and lines without a district are skipped. Repeated lines for
/// the same (tract, district, level) are summed. Output is ordered by tract,
/// then district, then level.
#[must_use]
pub fn allocate(records: &[GeoRefRecord]) -> Vec<Allocation> {
    let mut excluded: BTreeMap<TractClass, usize> = BTreeMap::new();
    let mut without_district = 0usize;
    let mut totals: BTreeMap<(TractId, ModernKey, i8), f64> = BTreeMap::new();

    for record in records {
        let class = TractClass::classify(&record.tract);
        if class.is_excluded() {
            *excluded.entry(class).or_default() += 1;
            continue;
        }
        let Some(district) = &record.district else {
            without_district += 1;
            continue;
        };
        let allocated =
            absent_as_zero(record.population) * absent_as_zero(record.percent_of_tract) / 100.0;
        *totals
            .entry((
                record.tract.clone(),
                district.clone(),
                Allocation::level_code_of(record.level),
            ))
            .or_default() += allocated;
    }

    for (class, count) in &excluded {
        log::info!("Excluded {count} {class} reference lines before allocation");
    }
    if without_district > 0 {
        log::warn!("Skipped {without_district} reference lines without a usable district code");
    }

    totals
        .into_iter()
        .map(|((tract, district, level_code), allocated_population)| Allocation {
            tract,
            district,
            level_code,
            allocated_population,
        })
        .collect()
}

/// Keep one district per (tract, level): the largest allocation, ties going
/// to the lexicographically smallest district key
///
/// Fails if (tract, level) is still not unique afterwards.
pub fn select_dominant(allocations: &[Allocation]) -> Result<Vec<Allocation>> {
    let mut candidates: BTreeMap<(&TractId, i8), SmallVec<[&Allocation; 4]>> = BTreeMap::new();
    for allocation in allocations {
        candidates
            .entry((&allocation.tract, allocation.level_code))
            .or_default()
            .push(allocation);
    }

    let mut selected = Vec::with_capacity(candidates.len());
    for (_, mut group) in candidates {
        group.sort_by(|a, b| {
            b.allocated_population
                .total_cmp(&a.allocated_population)
                .then_with(|| a.district.cmp(&b.district))
        });
        if let Some(first) = group.first() {
            selected.push((*first).clone());
        }
    }

    let mut seen = BTreeSet::new();
    for allocation in &selected {
        if !seen.insert((&allocation.tract, allocation.level_code)) {
            return Err(PipelineError::invariant(format!(
                "dominant selection left duplicate (tract {}, level {})",
                allocation.tract, allocation.level_code
            )));
        }
    }

    log::info!(
        "Selected {} dominant assignments from {} allocations",
        selected.len(),
        allocations.len()
    );
    Ok(selected)
}

/// Total population of each tract as reported in the reference file
///
/// A tract spans several lines; the largest reported figure is used.
#[must_use]
pub fn tract_populations(records: &[GeoRefRecord]) -> BTreeMap<TractId, f64> {
    let mut populations: BTreeMap<TractId, f64> = BTreeMap::new();
    for record in records {
        if TractClass::classify(&record.tract).is_excluded() {
            continue;
        }
        let population = absent_as_zero(record.population);
        populations
            .entry(record.tract.clone())
            .and_modify(|p| *p = p.max(population))
            .or_insert(population);
    }
    populations
}

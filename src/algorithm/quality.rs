//! Baseline quality flags
//!
//! A unit is "good" for a baseline set when it has a non-missing spending
//! observation in every year of the set. Flags are tagged at the district
//! level and rolled up to tracts and counties with a logical AND, so a single
//! bad constituent marks the parent as bad.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use itertools::Itertools;
use rustc_hash::FxHashMap;

/// A named set of baseline years
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaselineSet {
    /// Name, used as the `good_<name>` output column suffix
    pub name: String,
    /// Years that must all be observed
    pub years: BTreeSet<i32>,
}

impl BaselineSet {
    /// Create a set from a name and its years
    pub fn new(name: impl Into<String>, years: impl IntoIterator<Item = i32>) -> Self {
        Self {
            name: name.into(),
            years: years.into_iter().collect(),
        }
    }

    /// The three standard windows; 1968 and 1969 were never collected
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("67_72", [1967, 1970, 1971, 1972]),
            Self::new("67_71", [1967, 1970, 1971]),
            Self::new("70_72", [1970, 1971, 1972]),
        ]
    }

    /// Output column name of this set's flag
    #[must_use]
    pub fn column_name(&self) -> String {
        format!("good_{}", self.name)
    }

    /// Whether the observed years cover the whole set
    #[must_use]
    pub fn is_covered_by(&self, observed: &BTreeSet<i32>) -> bool {
        self.years.iter().filter(|year| observed.contains(year)).count() == self.years.len()
    }
}

impl fmt::Display for BaselineSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {{{}}}", self.name, self.years.iter().join(", "))
    }
}

/// Flags per unit, one entry per baseline set, in set order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagTable<K: Ord> {
    set_names: Vec<String>,
    flags: BTreeMap<K, Vec<bool>>,
}

impl<K: Ord + Clone + std::hash::Hash> FlagTable<K> {
    /// Tag every master unit against each baseline set
    ///
    /// `observations` are (unit, year, value) triples; a year counts as
    /// present only when its value is finite. Units in `master_units` without
    /// any observation get `false` for every set.
    pub fn tag<I, M>(observations: I, master_units: M, sets: &[BaselineSet]) -> Self
    where
        I: IntoIterator<Item = (K, i32, Option<f64>)>,
        M: IntoIterator<Item = K>,
    {
        let baseline_years: BTreeSet<i32> = sets.iter().flat_map(|s| s.years.iter().copied()).collect();

        let mut present: FxHashMap<K, BTreeSet<i32>> = FxHashMap::default();
        for (unit, year, value) in observations {
            if baseline_years.contains(&year) && value.is_some_and(f64::is_finite) {
                present.entry(unit).or_default().insert(year);
            }
        }

        let empty = BTreeSet::new();
        let flags = master_units
            .into_iter()
            .map(|unit| {
                let observed = present.get(&unit).unwrap_or(&empty);
                let unit_flags = sets.iter().map(|set| set.is_covered_by(observed)).collect();
                (unit, unit_flags)
            })
            .collect();

        Self {
            set_names: sets.iter().map(|s| s.name.clone()).collect(),
            flags,
        }
    }

    /// Roll flags up to parent units
    ///
    /// `links` are (child, parent) pairs. A parent is good for a set only if
    /// every linked child is; children missing from this table count as bad.
    pub fn propagate<P, I>(&self, links: I) -> FlagTable<P>
    where
        P: Ord + Clone + std::hash::Hash,
        I: IntoIterator<Item = (K, P)>,
    {
        let mut flags: BTreeMap<P, Vec<bool>> = BTreeMap::new();
        for (child, parent) in links {
            let child_flags = self.flags_or_default(&child);
            flags
                .entry(parent)
                .and_modify(|acc| {
                    for (a, c) in acc.iter_mut().zip(&child_flags) {
                        *a &= *c;
                    }
                })
                .or_insert(child_flags);
        }
        FlagTable {
            set_names: self.set_names.clone(),
            flags,
        }
    }

    /// Flags of a unit, if it was tagged
    #[must_use]
    pub fn get(&self, unit: &K) -> Option<&[bool]> {
        self.flags.get(unit).map(Vec::as_slice)
    }

    /// Flags of a unit, all `false` when the unit is unknown
    #[must_use]
    pub fn flags_or_default(&self, unit: &K) -> Vec<bool> {
        self.get(unit)
            .map_or_else(|| vec![false; self.set_names.len()], <[bool]>::to_vec)
    }

    /// Names of the baseline sets, in flag order
    #[must_use]
    pub fn set_names(&self) -> &[String] {
        &self.set_names
    }

    /// Number of units
    #[must_use]
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// Whether no unit was tagged
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Number of good units per set
    #[must_use]
    pub fn good_counts(&self) -> Vec<usize> {
        (0..self.set_names.len())
            .map(|i| self.flags.values().filter(|f| f[i]).count())
            .collect()
    }

    /// Units and their flags, in unit order
    pub fn iter(&self) -> impl Iterator<Item = (&K, &[bool])> {
        self.flags.iter().map(|(k, v)| (k, v.as_slice()))
    }
}

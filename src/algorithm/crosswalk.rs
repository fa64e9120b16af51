//! Identifier crosswalk between modern and historical district keys
//!
//! The modern extracts report both keys, but across all years the observed
//! pairs form a many-to-many relation. Only pairs where each key has exactly
//! one partner are kept; ambiguous pairs are dropped rather than reconciled.
//! This sacrifices coverage (typically around half of the raw pairs) for a
//! mapping that is a function in both directions.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use arrow::datatypes::FieldRef;
use arrow::record_batch::RecordBatch;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_arrow::schema::{SchemaLike, TracingOptions};

use crate::error::{PipelineError, Result};
use crate::models::{DistrictYear, HistoricalKey, ModernKey};

/// Cardinality class of an observed key pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Cardinality {
    /// Each key has exactly one partner
    OneToOne,
    /// The modern key has several historical partners
    OneToMany,
    /// The historical key has several modern partners
    ManyToOne,
    /// Both keys have several partners
    ManyToMany,
}

impl Cardinality {
    /// Classify from the number of distinct partners on each side
    #[must_use]
    pub fn from_counts(historical_per_modern: usize, modern_per_historical: usize) -> Self {
        match (historical_per_modern > 1, modern_per_historical > 1) {
            (false, false) => Self::OneToOne,
            (true, false) => Self::OneToMany,
            (false, true) => Self::ManyToOne,
            (true, true) => Self::ManyToMany,
        }
    }
}

/// A distinct observed pair with its class
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CrosswalkEntry {
    /// Modern key
    pub modern: ModernKey,
    /// Historical key
    pub historical: HistoricalKey,
    /// Cardinality class
    pub cardinality: Cardinality,
}

/// Counts of what the classification kept and dropped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrosswalkSummary {
    /// Pairs seen before any filtering
    pub raw_pairs: usize,
    /// Pairs dropped for a missing or placeholder key
    pub excluded_pairs: usize,
    /// Distinct valid pairs
    pub distinct_pairs: usize,
    /// Pairs per class
    pub by_cardinality: BTreeMap<Cardinality, usize>,
}

impl CrosswalkSummary {
    /// Number of pairs kept in the canonical crosswalk
    #[must_use]
    pub fn kept(&self) -> usize {
        self.by_cardinality.get(&Cardinality::OneToOne).copied().unwrap_or(0)
    }
}

impl fmt::Display for CrosswalkSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Crosswalk Summary:")?;
        writeln!(f, "  Raw Pairs: {}", self.raw_pairs)?;
        writeln!(f, "  Excluded (missing/placeholder key): {}", self.excluded_pairs)?;
        writeln!(f, "  Distinct Pairs: {}", self.distinct_pairs)?;
        for (class, count) in &self.by_cardinality {
            writeln!(f, "  {class:?}: {count}")?;
        }
        let share = if self.distinct_pairs > 0 {
            self.kept() as f64 / self.distinct_pairs as f64 * 100.0
        } else {
            0.0
        };
        writeln!(f, "  Kept: {} ({share:.1}%)", self.kept())
    }
}

/// Classify every distinct valid pair
///
/// Pairs with a missing key on either side are excluded before counting.
pub fn classify_pairs<I>(pairs: I) -> (Vec<CrosswalkEntry>, CrosswalkSummary)
where
    I: IntoIterator<Item = (Option<ModernKey>, Option<HistoricalKey>)>,
{
    let mut summary = CrosswalkSummary::default();
    let mut distinct: BTreeSet<(ModernKey, HistoricalKey)> = BTreeSet::new();

    for (modern, historical) in pairs {
        summary.raw_pairs += 1;
        match (modern, historical) {
            (Some(modern), Some(historical)) => {
                distinct.insert((modern, historical));
            }
            _ => summary.excluded_pairs += 1,
        }
    }
    summary.distinct_pairs = distinct.len();

    let mut historical_per_modern: FxHashMap<&ModernKey, usize> = FxHashMap::default();
    let mut modern_per_historical: FxHashMap<&HistoricalKey, usize> = FxHashMap::default();
    for (modern, historical) in &distinct {
        *historical_per_modern.entry(modern).or_default() += 1;
        *modern_per_historical.entry(historical).or_default() += 1;
    }

    let entries: Vec<CrosswalkEntry> = distinct
        .iter()
        .map(|(modern, historical)| CrosswalkEntry {
            modern: modern.clone(),
            historical: historical.clone(),
            cardinality: Cardinality::from_counts(
                historical_per_modern[modern],
                modern_per_historical[historical],
            ),
        })
        .collect();

    for entry in &entries {
        *summary.by_cardinality.entry(entry.cardinality).or_default() += 1;
    }

    (entries, summary)
}

/// Row shape of the persisted crosswalk table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CrosswalkRow {
    modern_key: String,
    historical_key: String,
}

/// Canonical one-to-one crosswalk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Crosswalk {
    by_modern: BTreeMap<ModernKey, HistoricalKey>,
    by_historical: BTreeMap<HistoricalKey, ModernKey>,
}

impl Crosswalk {
    /// Build from classified entries, keeping only one-to-one pairs
    ///
    /// Fails if either key column is not unique after filtering.
    pub fn from_entries(entries: &[CrosswalkEntry]) -> Result<Self> {
        let mut crosswalk = Self::default();
        for entry in entries.iter().filter(|e| e.cardinality == Cardinality::OneToOne) {
            crosswalk.insert(entry.modern.clone(), entry.historical.clone())?;
        }
        crosswalk.assert_injective()?;
        Ok(crosswalk)
    }

    /// Classify raw pairs and build the canonical crosswalk
    pub fn build<I>(pairs: I) -> Result<(Self, CrosswalkSummary)>
    where
        I: IntoIterator<Item = (Option<ModernKey>, Option<HistoricalKey>)>,
    {
        let (entries, summary) = classify_pairs(pairs);
        let crosswalk = Self::from_entries(&entries)?;
        Ok((crosswalk, summary))
    }

    fn insert(&mut self, modern: ModernKey, historical: HistoricalKey) -> Result<()> {
        if let Some(existing) = self.by_modern.get(&modern) {
            return Err(PipelineError::invariant(format!(
                "crosswalk: modern key {modern} maps to both {existing} and {historical}"
            )));
        }
        if let Some(existing) = self.by_historical.get(&historical) {
            return Err(PipelineError::invariant(format!(
                "crosswalk: historical key {historical} maps to both {existing} and {modern}"
            )));
        }
        self.by_modern.insert(modern.clone(), historical.clone());
        self.by_historical.insert(historical, modern);
        Ok(())
    }

    /// Check both key columns are unique and the two directions agree
    pub fn assert_injective(&self) -> Result<()> {
        if self.by_modern.len() != self.by_historical.len() {
            return Err(PipelineError::invariant(format!(
                "crosswalk: {} modern keys but {} historical keys",
                self.by_modern.len(),
                self.by_historical.len()
            )));
        }
        for (modern, historical) in &self.by_modern {
            if self.by_historical.get(historical) != Some(modern) {
                return Err(PipelineError::invariant(format!(
                    "crosswalk: {modern} -> {historical} has no matching reverse entry"
                )));
            }
        }
        Ok(())
    }

    /// Modern key of a historical key
    #[must_use]
    pub fn to_modern(&self, historical: &HistoricalKey) -> Option<&ModernKey> {
        self.by_historical.get(historical)
    }

    /// Historical key of a modern key
    #[must_use]
    pub fn to_historical(&self, modern: &ModernKey) -> Option<&HistoricalKey> {
        self.by_modern.get(modern)
    }

    /// Number of pairs
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_modern.len()
    }

    /// Whether the crosswalk is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_modern.is_empty()
    }

    /// Pairs in modern-key order
    pub fn iter(&self) -> impl Iterator<Item = (&ModernKey, &HistoricalKey)> {
        self.by_modern.iter()
    }

    /// Convert to a record batch (`modern_key`, `historical_key`)
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let rows: Vec<CrosswalkRow> = self
            .iter()
            .map(|(modern, historical)| CrosswalkRow {
                modern_key: modern.to_string(),
                historical_key: historical.to_string(),
            })
            .collect();
        let fields = Vec::<FieldRef>::from_type::<CrosswalkRow>(TracingOptions::default())?;
        Ok(serde_arrow::to_record_batch(&fields, &rows)?)
    }

    /// Rebuild from a persisted crosswalk batch, re-checking every invariant
    pub fn from_record_batch(batch: &RecordBatch) -> Result<Self> {
        let rows: Vec<CrosswalkRow> = serde_arrow::from_record_batch(batch)?;
        let mut crosswalk = Self::default();
        for row in rows {
            let modern = ModernKey::parse(&row.modern_key).ok_or_else(|| {
                PipelineError::Validation(format!("invalid modern key '{}'", row.modern_key))
            })?;
            let historical = HistoricalKey::parse(&row.historical_key).ok_or_else(|| {
                PipelineError::Validation(format!("invalid historical key '{}'", row.historical_key))
            })?;
            crosswalk.insert(modern, historical)?;
        }
        crosswalk.assert_injective()?;
        Ok(crosswalk)
    }
}

/// Give historical rows their modern key through the crosswalk
///
/// Rows whose historical key is not in the crosswalk are dropped; the number
/// dropped is returned alongside the kept rows.
pub fn attach_modern_keys(rows: Vec<DistrictYear>, crosswalk: &Crosswalk) -> (Vec<DistrictYear>, usize) {
    let total = rows.len();
    let kept: Vec<DistrictYear> = rows
        .into_iter()
        .filter_map(|mut row| {
            let modern = crosswalk.to_modern(row.historical_key.as_ref()?)?;
            row.modern_key = Some(modern.clone());
            Some(row)
        })
        .collect();
    let dropped = total - kept.len();
    (kept, dropped)
}

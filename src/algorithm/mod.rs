//! Core panel-building algorithms
//!
//! Each stage is a pure function over fully materialised rows:
//! - `crosswalk`: one-to-one modern/historical key mapping
//! - `quality`: baseline completeness flags and their AND roll-up
//! - `allocation`: tract population split among serving districts
//! - `interpolation`: gap-limited filling of yearly series
//! - `aggregation`: district → tract → county weighted means

pub mod aggregation;
pub mod allocation;
pub mod crosswalk;
pub mod interpolation;
pub mod quality;

pub use aggregation::{aggregate_counties, aggregate_tracts};
pub use allocation::{TractClass, absent_as_zero, allocate, select_dominant, tract_populations};
pub use crosswalk::{
    Cardinality, Crosswalk, CrosswalkEntry, CrosswalkSummary, attach_modern_keys, classify_pairs,
};
pub use interpolation::{InterpolatedPoint, densify, interpolate, mode, smooth};
pub use quality::{BaselineSet, FlagTable};

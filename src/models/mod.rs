//! Domain models for the panel pipeline
//!
//! Every entity is an immutable row produced by one stage and consumed by the
//! next.

pub mod district;
pub mod geography;
pub mod panel;
pub mod types;

pub use district::DistrictYear;
pub use geography::{Allocation, GeoRefRecord};
pub use panel::{CountyCoverage, CountyYear, DistrictPanelRow, TractYear, ValueSource};
pub use types::{DistrictLevel, HistoricalKey, ModernKey, TractId};

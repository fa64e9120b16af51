//! School-finance reform panel builder
//!
//! Reads district finance extracts from two eras, a 1969 fixed-width
//! geographic reference file and auxiliary lookups; reconciles the two
//! district identifier systems; interpolates and aggregates per-pupil
//! spending onto district, tract and county panels written as Parquet.

pub mod algorithm;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod reporting;
pub mod sources;
pub mod utils;

// Core types
pub use config::{CpiSource, PipelineConfig, VariantConfig, Weighting};
pub use error::{PipelineError, Result};
pub use pipeline::{PanelOutputs, Pipeline, SourceData, StageCounts, run_variants};

// Algorithm entry points
pub use algorithm::{BaselineSet, Crosswalk, CrosswalkSummary, FlagTable};
pub use reporting::{CpiSeries, EventWindow};

// Domain models
pub use models::{
    Allocation, CountyCoverage, CountyYear, DistrictLevel, DistrictPanelRow, DistrictYear,
    GeoRefRecord, HistoricalKey, ModernKey, TractId, TractYear, ValueSource,
};

// Arrow types
pub use arrow::record_batch::RecordBatch;

//! Parameterised panel build
//!
//! One function runs every stage for one analysis variant. Each stage fully
//! materialises its output before the next starts, and each stage boundary
//! is written to `<output_dir>/<variant>/`.

pub mod diagnostics;
pub mod output;

pub use diagnostics::{Attrition, StageCounts};

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::time::Instant;

use arrow::record_batch::RecordBatch;

use crate::algorithm::aggregation::{aggregate_counties, aggregate_tracts};
use crate::algorithm::allocation::{allocate, select_dominant, tract_populations};
use crate::algorithm::crosswalk::{Crosswalk, CrosswalkSummary, attach_modern_keys};
use crate::algorithm::interpolation::{densify, interpolate, mode, smooth};
use crate::algorithm::quality::FlagTable;
use crate::config::{PipelineConfig, VariantConfig, Weighting};
use crate::error::{PipelineError, Result};
use crate::models::{
    Allocation, CountyYear, DistrictPanelRow, DistrictYear, GeoRefRecord, ModernKey, TractId,
    TractYear, ValueSource,
};
use crate::reporting::{CpiSeries, ReportingInputs, annotate_counties, annotate_districts};
use crate::sources::lookups::{
    CountyYearValues, StateInfo, TractYearValues, load_county_income, load_county_population,
    load_reform_years, load_state_fips, load_tract_population,
};
use crate::sources::{load_georef, load_historical_finance, load_modern_finance};
use crate::utils::io::write_parquet;
use crate::utils::logging::{
    create_main_progress_bar, finish_progress_bar, log_operation_complete, log_operation_start,
    log_stage,
};

/// Census year of the geographic reference file's population figures
const GEOREF_CENSUS_YEAR: i32 = 1970;

/// Every raw input, loaded once and shared by all variants
#[derive(Debug, Clone, Default)]
pub struct SourceData {
    /// Modern finance rows
    pub modern: Vec<DistrictYear>,
    /// Historical finance rows, without modern keys
    pub historical: Vec<DistrictYear>,
    /// Geographic reference lines
    pub georef: Vec<GeoRefRecord>,
    /// State abbreviations and names
    pub states: BTreeMap<String, StateInfo>,
    /// First reform year by state
    pub reform_years: BTreeMap<String, i32>,
    /// Median income by county-year
    pub county_income: CountyYearValues,
    /// School-age population by county-year
    pub county_population: CountyYearValues,
    /// School-age population by tract-year
    pub tract_population: TractYearValues,
}

impl SourceData {
    /// Load every input under the configured data root
    pub fn load(config: &PipelineConfig) -> Result<Self> {
        let start = Instant::now();
        log_operation_start("Loading sources from", config.root());

        let sources = Self {
            modern: load_modern_finance(config)?,
            historical: load_historical_finance(config)?,
            georef: load_georef(config)?,
            states: load_state_fips(config)?,
            reform_years: load_reform_years(config)?,
            county_income: load_county_income(config)?,
            county_population: load_county_population(config)?,
            tract_population: load_tract_population(config)?,
        };

        log_operation_complete(
            "loaded",
            config.root(),
            sources.modern.len() + sources.historical.len() + sources.georef.len(),
            Some(start.elapsed()),
        );
        Ok(sources)
    }
}

/// Everything one variant run produced
#[derive(Debug, Clone)]
pub struct PanelOutputs {
    /// Variant name
    pub variant: String,
    /// Directory the tables were written to
    pub output_dir: PathBuf,
    /// Canonical one-to-one crosswalk
    pub crosswalk: Crosswalk,
    /// What the crosswalk kept and dropped
    pub crosswalk_summary: CrosswalkSummary,
    /// District baseline flags
    pub district_flags: FlagTable<ModernKey>,
    /// Dominant (tract, level) assignments
    pub assignments: Vec<Allocation>,
    /// Dense district-year panel
    pub district_panel: Vec<DistrictPanelRow>,
    /// Dense tract-year panel
    pub tract_panel: Vec<TractYear>,
    /// County-year panel
    pub county_panel: Vec<CountyYear>,
    /// Rows per state per stage
    pub diagnostics: StageCounts,
}

/// One configured run of the panel build
#[derive(Debug, Clone)]
pub struct Pipeline<'a> {
    config: &'a PipelineConfig,
    variant: VariantConfig,
    cpi: Option<CpiSeries>,
}

impl<'a> Pipeline<'a> {
    /// Pipeline for one variant
    #[must_use]
    pub fn new(config: &'a PipelineConfig, variant: VariantConfig) -> Self {
        Self {
            config,
            variant,
            cpi: None,
        }
    }

    /// Use `cpi` for deflation
    #[must_use]
    pub fn with_cpi(mut self, cpi: Option<CpiSeries>) -> Self {
        self.cpi = cpi;
        self
    }

    /// Variant this pipeline runs
    #[must_use]
    pub fn variant(&self) -> &VariantConfig {
        &self.variant
    }

    /// Load the sources and run every stage
    pub fn run(&self) -> Result<PanelOutputs> {
        let sources = SourceData::load(self.config)?;
        self.run_with(&sources)
    }

    /// Run every stage on already-loaded sources
    pub fn run_with(&self, sources: &SourceData) -> Result<PanelOutputs> {
        let variant = &self.variant;
        variant.validate()?;
        if variant.deflate_to.is_some() && self.cpi.is_none() {
            return Err(PipelineError::Validation(format!(
                "variant '{}' deflates spending but no CPI series was provided",
                variant.name
            )));
        }

        let start = Instant::now();
        log::info!("Running variant\n{variant}");
        let output_dir = self.config.variant_output_dir(&variant.name);
        let mut diagnostics = StageCounts::new();
        diagnostics.record(
            "loaded",
            sources
                .modern
                .iter()
                .chain(&sources.historical)
                .map(DistrictYear::state),
        );

        // Stage 1: crosswalk
        let (crosswalk, crosswalk_summary) = Crosswalk::build(
            sources
                .modern
                .iter()
                .map(|row| (row.modern_key.clone(), row.historical_key.clone())),
        )?;
        log::info!("{crosswalk_summary}");
        self.write(&output_dir, output::CROSSWALK_FILE, crosswalk.to_record_batch()?)?;

        let (matched, unmatched) = attach_modern_keys(sources.historical.clone(), &crosswalk);
        log_stage("Historical rows matched to modern keys", matched.len() + unmatched, matched.len());

        let records = merge_eras(&sources.modern, matched);
        diagnostics.record("merged", records.iter().map(DistrictYear::state));

        // Stage 2: baseline quality flags
        let master_units: BTreeSet<ModernKey> = records
            .iter()
            .filter_map(|row| row.modern_key.clone())
            .chain(sources.georef.iter().filter_map(|line| line.district.clone()))
            .collect();
        let district_flags = FlagTable::tag(
            records
                .iter()
                .filter_map(|row| Some((row.modern_key.clone()?, row.year, row.per_pupil))),
            master_units,
            &variant.baseline_sets,
        );
        for (set, good) in variant.baseline_sets.iter().zip(district_flags.good_counts()) {
            log::info!("Districts good for {}: {good} of {}", set.name, district_flags.len());
        }

        // Stage 3: dense, interpolated district panel
        let mut district_panel = build_district_panel(&records, &district_flags, variant);
        log_stage("District panel", records.len(), district_panel.len());
        diagnostics.record(
            "district_panel",
            district_panel
                .iter()
                .filter(|row| row.per_pupil.is_some())
                .map(|row| row.state_fips.as_str()),
        );

        // Stage 4: tract allocation and tract panel
        let allocations = allocate(&sources.georef);
        let assignments = select_dominant(&allocations)?;
        log_stage("Dominant assignments", allocations.len(), assignments.len());
        self.write(&output_dir, output::ALLOCATIONS_FILE, output::allocations_batch(&assignments)?)?;

        let tract_flags: FlagTable<TractId> = district_flags.propagate(
            assignments
                .iter()
                .map(|a| (a.district.clone(), a.tract.clone())),
        );
        let weights = tract_weights(variant.weighting, sources);
        let tract_panel = aggregate_tracts(
            &assignments,
            &district_panel,
            &tract_flags,
            &weights,
            variant.years.clone(),
        );
        diagnostics.record(
            "tract_panel",
            tract_panel
                .iter()
                .filter(|row| row.per_pupil.is_some())
                .map(|row| row.tract.state_fips()),
        );

        // Stage 5: county panel
        let totals = county_totals(variant.weighting, sources);
        let mut county_panel = aggregate_counties(&tract_panel, &totals);
        log_stage("County panel", tract_panel.len(), county_panel.len());
        diagnostics.record("county_panel", county_panel.iter().map(CountyYear::state_fips));

        // Stage 6: reporting columns
        let inputs = ReportingInputs {
            reform_years: sources.reform_years.clone(),
            county_income: sources.county_income.clone(),
            cpi: self.cpi.clone(),
        };
        annotate_districts(&mut district_panel, &inputs, variant)?;
        annotate_counties(&mut county_panel, &inputs, variant)?;

        let sets = &variant.baseline_sets;
        self.write(
            &output_dir,
            output::DISTRICT_PANEL_FILE,
            output::district_panel_batch(&district_panel, sets)?,
        )?;
        self.write(
            &output_dir,
            output::TRACT_PANEL_FILE,
            output::tract_panel_batch(&tract_panel, sets)?,
        )?;
        self.write(
            &output_dir,
            output::COUNTY_PANEL_FILE,
            output::county_panel_batch(&county_panel, sets)?,
        )?;

        log::debug!("{diagnostics}");
        diagnostics.log_attrition(&sources.states);
        log::info!(
            "Variant '{}' finished in {:?}: {} county-years",
            variant.name,
            start.elapsed(),
            county_panel.len()
        );

        Ok(PanelOutputs {
            variant: variant.name.clone(),
            output_dir,
            crosswalk,
            crosswalk_summary,
            district_flags,
            assignments,
            district_panel,
            tract_panel,
            county_panel,
            diagnostics,
        })
    }

    fn write(&self, dir: &std::path::Path, file_name: &str, batch: RecordBatch) -> Result<()> {
        write_parquet(&dir.join(file_name), batch.schema(), &[batch])
    }
}

/// Run several variants on one load of the sources
pub fn run_variants(
    config: &PipelineConfig,
    variants: &[VariantConfig],
    cpi: Option<&CpiSeries>,
) -> Result<Vec<PanelOutputs>> {
    let sources = SourceData::load(config)?;

    let pb = create_main_progress_bar(variants.len() as u64, Some("variants"));
    let mut outputs = Vec::with_capacity(variants.len());
    for variant in variants {
        pb.set_message(variant.name.clone());
        let pipeline = Pipeline::new(config, variant.clone()).with_cpi(cpi.cloned());
        outputs.push(pipeline.run_with(&sources)?);
        pb.inc(1);
    }
    finish_progress_bar(&pb, Some("all variants complete"));
    Ok(outputs)
}

/// Modern rows plus crosswalked historical rows, one per (district, year)
///
/// The modern row wins when both eras report the same district-year.
fn merge_eras(modern: &[DistrictYear], historical: Vec<DistrictYear>) -> Vec<DistrictYear> {
    let mut merged: BTreeMap<(ModernKey, i32), DistrictYear> = BTreeMap::new();
    let mut duplicates = 0usize;
    let mut overlaps = 0usize;

    for row in modern.iter().cloned() {
        let Some(key) = row.modern_key.clone() else {
            continue;
        };
        if merged.contains_key(&(key.clone(), row.year)) {
            duplicates += 1;
            continue;
        }
        merged.insert((key, row.year), row);
    }
    for row in historical {
        let Some(key) = row.modern_key.clone() else {
            continue;
        };
        if merged.contains_key(&(key.clone(), row.year)) {
            overlaps += 1;
            continue;
        }
        merged.insert((key, row.year), row);
    }

    if duplicates > 0 {
        log::warn!("Dropped {duplicates} repeated modern district-years; first row kept");
    }
    if overlaps > 0 {
        log::info!("{overlaps} district-years reported in both eras; modern row kept");
    }
    merged.into_values().collect()
}

/// Dense district panel with interpolation, smoothing and flags
fn build_district_panel(
    records: &[DistrictYear],
    flags: &FlagTable<ModernKey>,
    variant: &VariantConfig,
) -> Vec<DistrictPanelRow> {
    let mut by_district: BTreeMap<&ModernKey, Vec<&DistrictYear>> = BTreeMap::new();
    for row in records {
        if let Some(key) = &row.modern_key {
            by_district.entry(key).or_default().push(row);
        }
    }

    let mut panel = Vec::new();
    let mut filled = 0usize;
    for (district, rows) in by_district {
        let historical_key = mode(rows.iter().map(|r| r.historical_key.clone()));
        let level = mode(rows.iter().map(|r| r.level));
        let state_fips = mode(rows.iter().map(|r| Some(r.state().to_string())))
            .unwrap_or_else(|| district.state_fips().to_string());
        let unit_flags = flags.flags_or_default(district);

        let observations: Vec<(i32, Option<f64>)> = rows.iter().map(|r| (r.year, r.per_pupil)).collect();
        let dense = densify(&observations, variant.years.clone());
        let interpolated = interpolate(&dense, variant.max_gap);
        filled += interpolated
            .iter()
            .filter(|p| p.source == ValueSource::Interpolated)
            .count();

        for point in smooth(&interpolated, variant.smoothing_window) {
            panel.push(DistrictPanelRow {
                district: district.clone(),
                historical_key: historical_key.clone(),
                state_fips: state_fips.clone(),
                level,
                year: point.year,
                per_pupil: point.value,
                source: point.source,
                flags: unit_flags.clone(),
                real_per_pupil: None,
            });
        }
    }

    log::info!("Interpolated {filled} district-years (max gap {})", variant.max_gap);
    panel
}

/// Tract population weights for the variant's weighting scheme
fn tract_weights(weighting: Weighting, sources: &SourceData) -> BTreeMap<TractId, f64> {
    match weighting {
        Weighting::Georef1970 => tract_populations(&sources.georef),
        Weighting::SchoolAge { year } => sources
            .tract_population
            .iter()
            .filter(|((_, y), _)| *y == year)
            .map(|((tract, _), population)| (tract.clone(), *population))
            .collect(),
    }
}

/// Independent county totals for the untracted residual
fn county_totals(weighting: Weighting, sources: &SourceData) -> BTreeMap<String, f64> {
    let year = match weighting {
        Weighting::Georef1970 => GEOREF_CENSUS_YEAR,
        Weighting::SchoolAge { year } => year,
    };
    sources
        .county_population
        .iter()
        .filter(|((_, y), _)| *y == year)
        .map(|((county, _), population)| (county.clone(), *population))
        .collect()
}

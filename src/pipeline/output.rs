//! Arrow tables written at each stage boundary
//!
//! Panel tables carry one `good_<set>` column per baseline set of the
//! variant, so their schema is built at run time with array builders.

use std::sync::Arc;

use arrow::array::{
    ArrayRef, BooleanBuilder, Float64Builder, Int8Builder, Int32Builder, StringBuilder,
    UInt8Builder, UInt32Builder,
};
use arrow::datatypes::{DataType, Field, FieldRef, Schema};
use arrow::record_batch::RecordBatch;
use serde_arrow::schema::{SchemaLike, TracingOptions};

use crate::algorithm::quality::BaselineSet;
use crate::error::Result;
use crate::models::{Allocation, CountyYear, DistrictPanelRow, TractYear};

/// Crosswalk output file name
pub const CROSSWALK_FILE: &str = "crosswalk.parquet";
/// Dominant tract assignments output file name
pub const ALLOCATIONS_FILE: &str = "allocations.parquet";
/// District panel output file name
pub const DISTRICT_PANEL_FILE: &str = "district_panel.parquet";
/// Tract panel output file name
pub const TRACT_PANEL_FILE: &str = "tract_panel.parquet";
/// County panel output file name
pub const COUNTY_PANEL_FILE: &str = "county_panel.parquet";

/// Positional flag columns
struct FlagColumns {
    names: Vec<String>,
    builders: Vec<BooleanBuilder>,
}

impl FlagColumns {
    fn new(sets: &[BaselineSet]) -> Self {
        Self {
            names: sets.iter().map(BaselineSet::column_name).collect(),
            builders: sets.iter().map(|_| BooleanBuilder::new()).collect(),
        }
    }

    /// Missing positions are written as `false`
    fn append(&mut self, flags: &[bool]) {
        for (i, builder) in self.builders.iter_mut().enumerate() {
            builder.append_value(flags.get(i).copied().unwrap_or(false));
        }
    }

    fn finish_into(mut self, fields: &mut Vec<Field>, columns: &mut Vec<ArrayRef>) {
        for (name, builder) in self.names.into_iter().zip(self.builders.iter_mut()) {
            fields.push(Field::new(name, DataType::Boolean, false));
            columns.push(Arc::new(builder.finish()));
        }
    }
}

fn to_batch(fields: Vec<Field>, columns: Vec<ArrayRef>) -> Result<RecordBatch> {
    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

/// Dominant assignments as a record batch
pub fn allocations_batch(allocations: &[Allocation]) -> Result<RecordBatch> {
    let fields = Vec::<FieldRef>::from_type::<Allocation>(TracingOptions::default())?;
    Ok(serde_arrow::to_record_batch(&fields, &allocations)?)
}

/// District panel as a record batch
pub fn district_panel_batch(rows: &[DistrictPanelRow], sets: &[BaselineSet]) -> Result<RecordBatch> {
    let mut leaid = StringBuilder::new();
    let mut govid = StringBuilder::new();
    let mut fipst = StringBuilder::new();
    let mut schlev = Int8Builder::new();
    let mut year = Int32Builder::new();
    let mut per_pupil = Float64Builder::new();
    let mut source = StringBuilder::new();
    let mut real_per_pupil = Float64Builder::new();
    let mut flags = FlagColumns::new(sets);

    for row in rows {
        leaid.append_value(row.district.as_str());
        govid.append_option(row.historical_key.as_ref().map(|k| k.as_str()));
        fipst.append_value(&row.state_fips);
        schlev.append_option(row.level.map(|l| l.code()));
        year.append_value(row.year);
        per_pupil.append_option(row.per_pupil);
        source.append_value(row.source.as_str());
        real_per_pupil.append_option(row.real_per_pupil);
        flags.append(&row.flags);
    }

    let mut fields = vec![
        Field::new("leaid", DataType::Utf8, false),
        Field::new("govid", DataType::Utf8, true),
        Field::new("fipst", DataType::Utf8, false),
        Field::new("schlev", DataType::Int8, true),
        Field::new("year", DataType::Int32, false),
        Field::new("per_pupil", DataType::Float64, true),
        Field::new("source", DataType::Utf8, false),
        Field::new("real_per_pupil", DataType::Float64, true),
    ];
    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(leaid.finish()),
        Arc::new(govid.finish()),
        Arc::new(fipst.finish()),
        Arc::new(schlev.finish()),
        Arc::new(year.finish()),
        Arc::new(per_pupil.finish()),
        Arc::new(source.finish()),
        Arc::new(real_per_pupil.finish()),
    ];
    flags.finish_into(&mut fields, &mut columns);
    to_batch(fields, columns)
}

/// Tract panel as a record batch
pub fn tract_panel_batch(rows: &[TractYear], sets: &[BaselineSet]) -> Result<RecordBatch> {
    let mut tract = StringBuilder::new();
    let mut county = StringBuilder::new();
    let mut year = Int32Builder::new();
    let mut population = Float64Builder::new();
    let mut per_pupil = Float64Builder::new();
    let mut district_count = UInt32Builder::new();
    let mut dominant = StringBuilder::new();
    let mut flags = FlagColumns::new(sets);

    for row in rows {
        tract.append_value(row.tract.as_str());
        county.append_value(row.tract.county_fips());
        year.append_value(row.year);
        population.append_option(row.population);
        per_pupil.append_option(row.per_pupil);
        district_count.append_value(u32::try_from(row.district_count).unwrap_or(u32::MAX));
        dominant.append_option(row.dominant_district.as_ref().map(|d| d.as_str()));
        flags.append(&row.flags);
    }

    let mut fields = vec![
        Field::new("tract", DataType::Utf8, false),
        Field::new("county_fips", DataType::Utf8, false),
        Field::new("year", DataType::Int32, false),
        Field::new("population", DataType::Float64, true),
        Field::new("per_pupil", DataType::Float64, true),
        Field::new("district_count", DataType::UInt32, false),
        Field::new("dominant_leaid", DataType::Utf8, true),
    ];
    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(tract.finish()),
        Arc::new(county.finish()),
        Arc::new(year.finish()),
        Arc::new(population.finish()),
        Arc::new(per_pupil.finish()),
        Arc::new(district_count.finish()),
        Arc::new(dominant.finish()),
    ];
    flags.finish_into(&mut fields, &mut columns);
    to_batch(fields, columns)
}

/// County panel as a record batch
pub fn county_panel_batch(rows: &[CountyYear], sets: &[BaselineSet]) -> Result<RecordBatch> {
    let mut county = StringBuilder::new();
    let mut state = StringBuilder::new();
    let mut year = Int32Builder::new();
    let mut coverage = StringBuilder::new();
    let mut tracted = UInt32Builder::new();
    let mut untracted = UInt32Builder::new();
    let mut population = Float64Builder::new();
    let mut per_pupil = Float64Builder::new();
    let mut negative_residual = BooleanBuilder::new();
    let mut reform_year = Int32Builder::new();
    let mut event_time = Int32Builder::new();
    let mut quartile = UInt8Builder::new();
    let mut median_income = Float64Builder::new();
    let mut real_per_pupil = Float64Builder::new();
    let mut flags = FlagColumns::new(sets);

    for row in rows {
        county.append_value(&row.county_fips);
        state.append_value(row.state_fips());
        year.append_value(row.year);
        coverage.append_value(row.coverage.as_str());
        tracted.append_value(u32::try_from(row.tracted_areas).unwrap_or(u32::MAX));
        untracted.append_value(u32::try_from(row.untracted_areas).unwrap_or(u32::MAX));
        population.append_value(row.population);
        per_pupil.append_option(row.per_pupil);
        negative_residual.append_value(row.negative_residual);
        reform_year.append_option(row.reform_year);
        event_time.append_option(row.event_time);
        quartile.append_option(row.baseline_quartile);
        median_income.append_option(row.median_income);
        real_per_pupil.append_option(row.real_per_pupil);
        flags.append(&row.flags);
    }

    let mut fields = vec![
        Field::new("county_fips", DataType::Utf8, false),
        Field::new("fipst", DataType::Utf8, false),
        Field::new("year", DataType::Int32, false),
        Field::new("coverage", DataType::Utf8, false),
        Field::new("tracted_areas", DataType::UInt32, false),
        Field::new("untracted_areas", DataType::UInt32, false),
        Field::new("population", DataType::Float64, false),
        Field::new("per_pupil", DataType::Float64, true),
        Field::new("negative_residual", DataType::Boolean, false),
        Field::new("reform_year", DataType::Int32, true),
        Field::new("event_time", DataType::Int32, true),
        Field::new("baseline_quartile", DataType::UInt8, true),
        Field::new("median_income", DataType::Float64, true),
        Field::new("real_per_pupil", DataType::Float64, true),
    ];
    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(county.finish()),
        Arc::new(state.finish()),
        Arc::new(year.finish()),
        Arc::new(coverage.finish()),
        Arc::new(tracted.finish()),
        Arc::new(untracted.finish()),
        Arc::new(population.finish()),
        Arc::new(per_pupil.finish()),
        Arc::new(negative_residual.finish()),
        Arc::new(reform_year.finish()),
        Arc::new(event_time.finish()),
        Arc::new(quartile.finish()),
        Arc::new(median_income.finish()),
        Arc::new(real_per_pupil.finish()),
    ];
    flags.finish_into(&mut fields, &mut columns);
    to_batch(fields, columns)
}

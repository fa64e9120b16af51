//! Auxiliary lookup schema definitions

use arrow::datatypes::{DataType, Field, Schema};
use std::sync::Arc;

/// State FIPS codes, abbreviations and names
pub fn state_fips_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("fips", DataType::Utf8, false),
        Field::new("abbrev", DataType::Utf8, false),
        Field::new("name", DataType::Utf8, true),
    ]))
}

/// Hand-digitized court-ordered reform years by state
pub fn reform_years_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("fipst", DataType::Utf8, false),
        Field::new("reform_year", DataType::Int32, false),
    ]))
}

/// Median household income by county and year
pub fn county_income_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("county_fips", DataType::Utf8, false),
        Field::new("year", DataType::Int32, false),
        Field::new("median_income", DataType::Float64, false),
    ]))
}

/// School-age population by tract and census year
pub fn tract_population_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("tract", DataType::Utf8, false),
        Field::new("year", DataType::Int32, false),
        Field::new("population", DataType::Float64, false),
    ]))
}

/// School-age population by county and census year
pub fn county_population_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("county_fips", DataType::Utf8, false),
        Field::new("year", DataType::Int32, false),
        Field::new("population", DataType::Float64, false),
    ]))
}

/// Annual consumer price index
pub fn cpi_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("year", DataType::Int32, false),
        Field::new("cpi", DataType::Float64, false),
    ]))
}

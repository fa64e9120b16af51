//! Finance extract schema definitions

use arrow::datatypes::{DataType, Field, Schema};
use std::sync::Arc;

/// Get the Arrow schema for the modern finance extracts
///
/// One file per fiscal year, keyed by the 7-character district code. The
/// 9-character government code is carried alongside and feeds the crosswalk.
pub fn modern_finance_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("leaid", DataType::Utf8, false),
        Field::new("govid", DataType::Utf8, true),
        Field::new("fipst", DataType::Utf8, true),
        Field::new("schlev", DataType::Utf8, true),
        Field::new("totalexp", DataType::Float64, false),
        Field::new("enroll", DataType::Float64, false),
    ]))
}

/// Get the Arrow schema for the historical finance extracts
///
/// One file per fiscal year, keyed by the 9-character government code only.
pub fn historical_finance_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("govid", DataType::Utf8, false),
        Field::new("fipst", DataType::Utf8, true),
        Field::new("schlev", DataType::Utf8, true),
        Field::new("totalexp", DataType::Float64, false),
        Field::new("enroll", DataType::Float64, false),
    ]))
}

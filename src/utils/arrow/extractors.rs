//! Column extraction utilities for Arrow record batches
//!
//! Each extractor returns one `Option` per row so callers can zip columns
//! into typed records.

use arrow::array::{Array, Float64Array, Int32Array, StringArray};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;

use crate::error::Result;
use crate::utils::arrow::array_utils::{downcast_array, get_column};

/// Extract a string column; empty strings read as `None`
///
/// A missing optional column yields a column of `None`.
pub fn extract_strings(
    batch: &RecordBatch,
    column_name: &str,
    required: bool,
) -> Result<Vec<Option<String>>> {
    let Some(array) = get_column(batch, column_name, &DataType::Utf8, required)? else {
        return Ok(vec![None; batch.num_rows()]);
    };
    let strings = downcast_array::<StringArray>(&array, column_name, "String")?;

    Ok((0..strings.len())
        .map(|row| {
            if strings.is_null(row) {
                return None;
            }
            let value = strings.value(row).trim();
            (!value.is_empty()).then(|| value.to_string())
        })
        .collect())
}

/// Extract a numeric column as `f64`; non-finite values read as `None`
pub fn extract_float64(
    batch: &RecordBatch,
    column_name: &str,
    required: bool,
) -> Result<Vec<Option<f64>>> {
    let Some(array) = get_column(batch, column_name, &DataType::Float64, required)? else {
        return Ok(vec![None; batch.num_rows()]);
    };
    let floats = downcast_array::<Float64Array>(&array, column_name, "Float64")?;

    Ok((0..floats.len())
        .map(|row| {
            (!floats.is_null(row))
                .then(|| floats.value(row))
                .filter(|v| v.is_finite())
        })
        .collect())
}

/// Extract an integer column as `i32`
pub fn extract_int32(
    batch: &RecordBatch,
    column_name: &str,
    required: bool,
) -> Result<Vec<Option<i32>>> {
    let Some(array) = get_column(batch, column_name, &DataType::Int32, required)? else {
        return Ok(vec![None; batch.num_rows()]);
    };
    let ints = downcast_array::<Int32Array>(&array, column_name, "Int32")?;

    Ok((0..ints.len())
        .map(|row| (!ints.is_null(row)).then(|| ints.value(row)))
        .collect())
}

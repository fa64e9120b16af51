//! Column lookup by name with on-demand casting
//!
//! Source CSVs arrive as text columns; callers ask for the type they need
//! and the column is cast once here.

use arrow::array::{Array, ArrayRef};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;

use crate::error::{PipelineError, Result};

/// Column `name` as `data_type`
///
/// A missing optional column is `Ok(None)`; a missing required column is
/// `ColumnNotFound`. Values that do not cast become nulls, so malformed
/// numbers surface as missing values rather than errors.
pub fn get_column(
    batch: &RecordBatch,
    name: &str,
    data_type: &DataType,
    required: bool,
) -> Result<Option<ArrayRef>> {
    let Some(column) = batch.column_by_name(name) else {
        return if required {
            Err(PipelineError::ColumnNotFound {
                column: name.to_string(),
            })
        } else {
            Ok(None)
        };
    };

    if column.data_type() == data_type {
        Ok(Some(column.clone()))
    } else {
        Ok(Some(cast(column, data_type)?))
    }
}

/// Concrete array behind `array`, or `InvalidDataType` naming the column
pub fn downcast_array<'a, A: Array + 'static>(
    array: &'a ArrayRef,
    name: &str,
    type_name: &str,
) -> Result<&'a A> {
    array.as_any().downcast_ref::<A>().ok_or_else(|| PipelineError::InvalidDataType {
        column: name.to_string(),
        expected: type_name.to_string(),
    })
}

//! CSV reading into Arrow record batches
//!
//! Every column is read as text under its lower-cased header name; typed
//! access happens through the extractors, which cast on demand. This keeps
//! identifier columns intact (leading zeros) and makes column order in the
//! file irrelevant.

use std::io::Seek;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use arrow::csv::ReaderBuilder;
use arrow::csv::reader::Format;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;

use crate::error::Result;
use crate::error::util::open_file;
use crate::utils::io::DEFAULT_BATCH_SIZE;
use crate::utils::logging::{log_operation_complete, log_operation_start};

/// Read a headed CSV file into record batches of text columns
pub fn read_csv(path: &Path) -> Result<Vec<RecordBatch>> {
    let start = Instant::now();
    log_operation_start("Reading CSV file", path);

    let mut file = open_file(path, "CSV input")?;
    let (header, _) = Format::default()
        .with_header(true)
        .infer_schema(&mut file, Some(0))?;
    file.rewind()?;

    let schema = Arc::new(Schema::new(
        header
            .fields()
            .iter()
            .map(|field| Field::new(field.name().trim().to_lowercase(), DataType::Utf8, true))
            .collect::<Vec<_>>(),
    ));

    let reader = ReaderBuilder::new(schema)
        .with_header(true)
        .with_batch_size(DEFAULT_BATCH_SIZE)
        .build(file)?;
    let batches = reader.collect::<std::result::Result<Vec<_>, ArrowError>>()?;

    let rows = batches.iter().map(RecordBatch::num_rows).sum();
    log_operation_complete("read", path, rows, Some(start.elapsed()));
    Ok(batches)
}

//! Parquet persistence of stage outputs

use std::path::Path;
use std::time::Instant;

use arrow::datatypes::SchemaRef;
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::error::Result;
use crate::error::util::{create_file, ensure_directory, open_file};
use crate::utils::io::DEFAULT_BATCH_SIZE;
use crate::utils::logging::{log_operation_complete, log_operation_start};

/// Write record batches sharing `schema` to a Parquet file
///
/// Parent directories are created. An empty batch list still produces a
/// valid file with the schema and no rows.
pub fn write_parquet(path: &Path, schema: SchemaRef, batches: &[RecordBatch]) -> Result<()> {
    let start = Instant::now();
    log_operation_start("Writing parquet file", path);

    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }

    let file = create_file(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    for batch in batches {
        writer.write(batch)?;
    }
    writer.close()?;

    let rows = batches.iter().map(RecordBatch::num_rows).sum();
    log_operation_complete("wrote", path, rows, Some(start.elapsed()));
    Ok(())
}

/// Read a Parquet file into record batches
pub fn read_parquet(path: &Path) -> Result<Vec<RecordBatch>> {
    let start = Instant::now();
    log_operation_start("Reading parquet file", path);

    let file = open_file(path, "parquet input")?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?
        .with_batch_size(DEFAULT_BATCH_SIZE)
        .build()?;
    let batches = reader.collect::<std::result::Result<Vec<_>, ArrowError>>()?;

    log_operation_complete("read", path, batches.len(), Some(start.elapsed()));
    Ok(batches)
}

//! Shared utilities: Arrow access, file IO, logging

pub mod arrow;
pub mod io;
pub mod logging;

pub use self::io::{DEFAULT_BATCH_SIZE, read_csv, read_parquet, write_parquet};

//! File input and output

pub mod csv;
pub mod parquet;
pub mod paths;

pub use self::csv::read_csv;
pub use self::parquet::{read_parquet, write_parquet};
pub use self::paths::{find_year_files, year_from_file_name};

/// Default batch size for CSV and Parquet reading
pub const DEFAULT_BATCH_SIZE: usize = 16384;

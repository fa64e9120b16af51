//! Arrow helpers: column lookup and typed extraction

pub mod array_utils;
pub mod extractors;

pub use self::array_utils::{downcast_array, get_column};
pub use self::extractors::{extract_float64, extract_int32, extract_strings};

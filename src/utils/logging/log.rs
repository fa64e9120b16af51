//! One-line log messages for file operations and stage boundaries

use std::path::Path;
use std::time::Duration;

/// `"<operation> <path>"` at info level
pub fn log_operation_start(operation: &str, path: &Path) {
    log::info!("{operation} {}", path.display());
}

/// Item count for a finished file operation, with timing when measured
///
/// `operation` is a past-tense verb ("read", "wrote", "parsed").
pub fn log_operation_complete(operation: &str, path: &Path, items: usize, elapsed: Option<Duration>) {
    match elapsed {
        Some(elapsed) => log::info!("{operation} {items} items: {} ({elapsed:.2?})", path.display()),
        None => log::info!("{operation} {items} items: {}", path.display()),
    }
}

/// Rows entering and leaving a stage; the drop count is logged only when nonzero
pub fn log_stage(stage: &str, rows_in: usize, rows_out: usize) {
    let dropped = rows_in.saturating_sub(rows_out);
    if dropped == 0 {
        log::info!("{stage}: {rows_out} rows");
    } else {
        log::info!("{stage}: {rows_in} rows in, {rows_out} rows out ({dropped} dropped)");
    }
}

/// Warn, naming the file involved when there is one
pub fn log_warning(message: &str, path: Option<&Path>) {
    match path {
        Some(path) => log::warn!("{message}: {}", path.display()),
        None => log::warn!("{message}"),
    }
}

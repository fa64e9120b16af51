//! Fixed-width 1969 geographic reference file
//!
//! Each line links one Census tract (or untracted county remainder) to one
//! serving school district. Fields occupy fixed, 1-based, inclusive byte
//! ranges. The file is a historical artifact; the layout below must not be
//! changed.

use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

use crate::config::PipelineConfig;
use crate::error::util::open_file;
use crate::error::{PipelineError, Result};
use crate::models::{DistrictLevel, GeoRefRecord, ModernKey, TractId};
use crate::utils::logging::{log_operation_complete, log_operation_start};

/// A field of the fixed-width layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name used in errors
    pub name: &'static str,
    /// First byte, 1-based
    pub start: usize,
    /// Last byte, 1-based inclusive
    pub end: usize,
}

impl FieldSpec {
    const fn new(name: &'static str, start: usize, end: usize) -> Self {
        Self { name, start, end }
    }

    /// Slice this field out of a line; bytes past the end of the line read as blank
    #[must_use]
    pub fn slice<'a>(&self, line: &'a [u8]) -> &'a [u8] {
        let start = (self.start - 1).min(line.len());
        let end = self.end.min(line.len());
        &line[start..end]
    }

    /// Trimmed text of this field
    #[must_use]
    pub fn text(&self, line: &[u8]) -> String {
        String::from_utf8_lossy(self.slice(line)).trim().to_string()
    }
}

/// State FIPS code
pub const STATE: FieldSpec = FieldSpec::new("state", 1, 2);
/// County FIPS code
pub const COUNTY: FieldSpec = FieldSpec::new("county", 5, 7);
/// District code within the state
pub const DISTRICT: FieldSpec = FieldSpec::new("district", 8, 12);
/// District level code
pub const LEVEL: FieldSpec = FieldSpec::new("level", 13, 13);
/// District name
pub const DISTRICT_NAME: FieldSpec = FieldSpec::new("district_name", 14, 76);
/// Tract base code
pub const TRACT_BASE: FieldSpec = FieldSpec::new("tract_base", 77, 80);
/// Tract suffix code
pub const TRACT_SUFFIX: FieldSpec = FieldSpec::new("tract_suffix", 81, 82);
/// Total tract population
pub const POPULATION: FieldSpec = FieldSpec::new("population", 101, 108);
/// Percent of the tract served by the district
pub const PERCENT_OF_TRACT: FieldSpec = FieldSpec::new("percent_of_tract", 109, 114);

/// Full layout, in byte order
pub const LAYOUT: [FieldSpec; 9] = [
    STATE,
    COUNTY,
    DISTRICT,
    LEVEL,
    DISTRICT_NAME,
    TRACT_BASE,
    TRACT_SUFFIX,
    POPULATION,
    PERCENT_OF_TRACT,
];

fn parse_number(field: FieldSpec, line: &[u8], line_number: usize) -> Result<Option<f64>> {
    let text = field.text(line);
    if text.is_empty() {
        return Ok(None);
    }
    text.parse::<f64>()
        .map(Some)
        .map_err(|_| PipelineError::FixedWidth {
            line: line_number,
            field: field.name,
            message: format!("'{text}' is not a number"),
        })
}

/// Parse one line of the reference file
pub fn parse_line(line: &[u8], line_number: usize) -> Result<GeoRefRecord> {
    let state = STATE.text(line);
    let county = COUNTY.text(line);
    let tract = TractId::from_parts(
        &state,
        &county,
        &TRACT_BASE.text(line),
        &TRACT_SUFFIX.text(line),
    )
    .ok_or_else(|| PipelineError::FixedWidth {
        line: line_number,
        field: TRACT_BASE.name,
        message: format!(
            "cannot build tract id from state '{state}', county '{county}', base '{}', suffix '{}'",
            TRACT_BASE.text(line),
            TRACT_SUFFIX.text(line)
        ),
    })?;

    Ok(GeoRefRecord {
        line: line_number,
        district: ModernKey::from_parts(&state, &DISTRICT.text(line)),
        level: DistrictLevel::from_code(&LEVEL.text(line)),
        district_name: DISTRICT_NAME.text(line),
        tract,
        population: parse_number(POPULATION, line, line_number)?,
        percent_of_tract: parse_number(PERCENT_OF_TRACT, line, line_number)?,
    })
}

/// Parse every non-blank line of a reference file
pub fn parse_georef<R: BufRead>(reader: R) -> Result<Vec<GeoRefRecord>> {
    let mut records = Vec::new();
    for (index, line) in reader.split(b'\n').enumerate() {
        let mut line = line?;
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        records.push(parse_line(&line, index + 1)?);
    }
    Ok(records)
}

/// Load the reference file named in the configuration
pub fn load_georef(config: &PipelineConfig) -> Result<Vec<GeoRefRecord>> {
    load_georef_file(&config.georef_path())
}

/// Load a reference file from a path
pub fn load_georef_file(path: &Path) -> Result<Vec<GeoRefRecord>> {
    let start = Instant::now();
    log_operation_start("Reading geographic reference file", path);
    let file = open_file(path, "geographic reference")?;
    let records = parse_georef(BufReader::new(file))?;
    log_operation_complete("parsed", path, records.len(), Some(start.elapsed()));
    Ok(records)
}

use std::fs;
use std::path::{Path, PathBuf};

use sfr_panel::PipelineConfig;
use sfr_panel::sources::georef::{
    COUNTY, DISTRICT, DISTRICT_NAME, FieldSpec, LEVEL, PERCENT_OF_TRACT, POPULATION, STATE,
    TRACT_BASE, TRACT_SUFFIX,
};
use tempfile::TempDir;

/// Header of the modern finance extracts
pub const MODERN_HEADER: &str = "leaid,govid,fipst,schlev,totalexp,enroll";
/// Header of the historical finance extracts
pub const HISTORICAL_HEADER: &str = "govid,fipst,schlev,totalexp,enroll";

/// A scratch data root laid out the way `PipelineConfig` expects
pub struct TestDataRoot {
    dir: TempDir,
}

impl TestDataRoot {
    /// Create an empty data root with the finance and lookup directories
    #[must_use]
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let root = Self { dir };
        let config = root.config();
        fs::create_dir_all(config.modern_path()).expect("failed to create modern dir");
        fs::create_dir_all(config.historical_path()).expect("failed to create historical dir");
        fs::create_dir_all(config.data_root.join(&config.lookup_dir)).expect("failed to create lookup dir");
        root
    }

    /// Path of the data root
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Configuration pointing at this data root
    #[must_use]
    pub fn config(&self) -> PipelineConfig {
        PipelineConfig::with_data_root(self.dir.path())
    }

    fn write(&self, path: PathBuf, contents: &str) -> PathBuf {
        fs::write(&path, contents).expect("failed to write fixture");
        path
    }

    /// Write one modern finance file; rows without the header
    pub fn modern_year(&self, year: i32, rows: &[&str]) -> PathBuf {
        let body = std::iter::once(MODERN_HEADER).chain(rows.iter().copied()).collect::<Vec<_>>().join("\n");
        self.write(self.config().modern_path().join(format!("sdf_{year}.csv")), &body)
    }

    /// Write one historical finance file; rows without the header
    pub fn historical_year(&self, year: i32, rows: &[&str]) -> PathBuf {
        let body = std::iter::once(HISTORICAL_HEADER)
            .chain(rows.iter().copied())
            .collect::<Vec<_>>()
            .join("\n");
        self.write(self.config().historical_path().join(format!("indfin_{year}.csv")), &body)
    }

    /// Write a lookup CSV under the lookup directory
    pub fn lookup(&self, file_name: &str, contents: &str) -> PathBuf {
        self.write(self.config().lookup_path(file_name), contents)
    }

    /// Write the fixed-width reference file from rendered lines
    pub fn georef(&self, lines: &[String]) -> PathBuf {
        self.write(self.config().georef_path(), &lines.join("\n"))
    }
}

/// One reference file line, before rendering
#[derive(Debug, Clone)]
pub struct GeoRefLine<'a> {
    pub state: &'a str,
    pub county: &'a str,
    pub district: &'a str,
    pub level: &'a str,
    pub name: &'a str,
    pub tract_base: &'a str,
    pub tract_suffix: &'a str,
    pub population: &'a str,
    pub percent: &'a str,
}

impl GeoRefLine<'_> {
    /// Render at the fixed byte positions; numbers are right-aligned
    #[must_use]
    pub fn render(&self) -> String {
        let mut line = vec![b' '; 114];
        let mut put = |field: FieldSpec, value: &str, right_align: bool| {
            let bytes = value.as_bytes();
            let width = field.end - field.start + 1;
            assert!(bytes.len() <= width, "{} too wide for {}", value, field.name);
            let offset = field.start - 1 + if right_align { width - bytes.len() } else { 0 };
            line[offset..offset + bytes.len()].copy_from_slice(bytes);
        };
        put(STATE, self.state, true);
        put(COUNTY, self.county, true);
        put(DISTRICT, self.district, true);
        put(LEVEL, self.level, true);
        put(DISTRICT_NAME, self.name, false);
        put(TRACT_BASE, self.tract_base, true);
        put(TRACT_SUFFIX, self.tract_suffix, true);
        put(POPULATION, self.population, true);
        put(PERCENT_OF_TRACT, self.percent, true);
        String::from_utf8(line).expect("fixture line is ASCII")
    }
}

/// Convenience constructor for a fully served reference line
#[must_use]
pub fn georef_line(county: &str, district: &str, tract_base: &str, population: &str, percent: &str) -> String {
    GeoRefLine {
        state: "06",
        county,
        district,
        level: "3",
        name: "TEST UNIFIED",
        tract_base,
        tract_suffix: "",
        population,
        percent,
    }
    .render()
}

/// Assert two floats agree to 1e-9
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

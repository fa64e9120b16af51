//! Configuration for the panel pipeline.
//!
//! Every stage receives a [`PipelineConfig`] explicitly; nothing reads the
//! current directory or process-wide state after start-up.

pub mod variant;

pub use variant::{VariantConfig, Weighting};

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};

/// Environment variable naming the data root
pub const DATA_ROOT_ENV: &str = "SFR_DATA_ROOT";
/// Environment variable overriding the output directory
pub const OUTPUT_DIR_ENV: &str = "SFR_OUTPUT_DIR";
/// Environment variable pointing at a local CPI table
pub const CPI_FILE_ENV: &str = "SFR_CPI_FILE";
/// Environment variable holding a BLS registration key
pub const BLS_API_KEY_ENV: &str = "SFR_BLS_API_KEY";
/// Environment variable selecting the CPI source: `none`, `file` or `bls`
pub const CPI_SOURCE_ENV: &str = "SFR_CPI_SOURCE";

/// Where consumer price index values come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CpiSource {
    /// No deflation source configured
    None,
    /// Annual CPI table on disk (`year,cpi`)
    File(PathBuf),
    /// BLS public API, optionally with a registration key
    Bls {
        /// Registration key (enables annual averages and longer ranges)
        api_key: Option<String>,
    },
}

/// Configuration for a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root directory holding all raw inputs
    pub data_root: PathBuf,
    /// Directory stage outputs are written to
    pub output_dir: PathBuf,
    /// Sub-directory of yearly modern finance extracts
    pub modern_dir: String,
    /// Sub-directory of yearly historical finance extracts
    pub historical_dir: String,
    /// File name of the fixed-width 1969 geographic reference extract
    pub georef_file: String,
    /// Sub-directory of auxiliary lookups
    pub lookup_dir: String,
    /// CPI source used when a variant asks for deflation
    pub cpi_source: CpiSource,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("data"),
            output_dir: PathBuf::from("output"),
            modern_dir: "modern".to_string(),
            historical_dir: "historical".to_string(),
            georef_file: "georef_1969.txt".to_string(),
            lookup_dir: "lookups".to_string(),
            cpi_source: CpiSource::None,
        }
    }
}

impl PipelineConfig {
    /// Configuration rooted at `data_root`, with outputs under `data_root/output`
    #[must_use]
    pub fn with_data_root(data_root: impl Into<PathBuf>) -> Self {
        let data_root = data_root.into();
        Self {
            output_dir: data_root.join("output"),
            data_root,
            ..Default::default()
        }
    }

    /// Build a configuration from the process environment
    ///
    /// `SFR_DATA_ROOT` is required; the rest are optional.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Build a configuration from named variables supplied by `var`
    ///
    /// Without `SFR_CPI_SOURCE` the source is inferred: a CPI file wins, then
    /// a BLS key; the anonymous BLS API must be selected explicitly.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let data_root = var(DATA_ROOT_ENV).ok_or_else(|| {
            PipelineError::Validation(format!("{DATA_ROOT_ENV} must point at the data root"))
        })?;
        let mut config = Self::with_data_root(data_root);

        if let Some(output_dir) = var(OUTPUT_DIR_ENV) {
            config.output_dir = PathBuf::from(output_dir);
        }
        config.cpi_source = cpi_source_from_vars(&var)?;

        Ok(config)
    }

    /// Directory of yearly modern finance files
    #[must_use]
    pub fn modern_path(&self) -> PathBuf {
        self.data_root.join(&self.modern_dir)
    }

    /// Directory of yearly historical finance files
    #[must_use]
    pub fn historical_path(&self) -> PathBuf {
        self.data_root.join(&self.historical_dir)
    }

    /// Path of the fixed-width geographic reference file
    #[must_use]
    pub fn georef_path(&self) -> PathBuf {
        self.data_root.join(&self.georef_file)
    }

    /// Path of a named lookup file
    #[must_use]
    pub fn lookup_path(&self, file_name: &str) -> PathBuf {
        self.data_root.join(&self.lookup_dir).join(file_name)
    }

    /// Output directory of one variant
    #[must_use]
    pub fn variant_output_dir(&self, variant: &str) -> PathBuf {
        self.output_dir.join(variant)
    }

    /// Data root as a path
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.data_root
    }
}

fn cpi_source_from_vars(var: &impl Fn(&str) -> Option<String>) -> Result<CpiSource> {
    let file = var(CPI_FILE_ENV).map(PathBuf::from);
    let api_key = var(BLS_API_KEY_ENV);

    match var(CPI_SOURCE_ENV).map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        Some("none") => Ok(CpiSource::None),
        Some("file") => file.map(CpiSource::File).ok_or_else(|| {
            PipelineError::Validation(format!("{CPI_SOURCE_ENV}=file requires {CPI_FILE_ENV}"))
        }),
        Some("bls") => Ok(CpiSource::Bls { api_key }),
        Some(other) => Err(PipelineError::Validation(format!(
            "{CPI_SOURCE_ENV} must be none, file or bls, got '{other}'"
        ))),
        None => Ok(match (file, api_key) {
            (Some(path), _) => CpiSource::File(path),
            (None, Some(key)) => CpiSource::Bls { api_key: Some(key) },
            (None, None) => CpiSource::None,
        }),
    }
}

impl fmt::Display for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pipeline Configuration:")?;
        writeln!(f, "  Data Root: {}", self.data_root.display())?;
        writeln!(f, "  Output Directory: {}", self.output_dir.display())?;
        writeln!(f, "  Modern Finance: {}", self.modern_path().display())?;
        writeln!(f, "  Historical Finance: {}", self.historical_path().display())?;
        writeln!(f, "  Geographic Reference: {}", self.georef_path().display())?;
        match &self.cpi_source {
            CpiSource::None => writeln!(f, "  CPI Source: none")?,
            CpiSource::File(path) => writeln!(f, "  CPI Source: {}", path.display())?,
            CpiSource::Bls { api_key } => writeln!(
                f,
                "  CPI Source: BLS API ({})",
                if api_key.is_some() { "registered" } else { "anonymous" }
            )?,
        }
        Ok(())
    }
}

//! Analysis variant configuration
//!
//! A variant is one parameterisation of the panel build: which baseline
//! windows gate the sample, how tracts are weighted into counties, how far
//! interpolation may reach and whether spending is smoothed or deflated.

use std::fmt;
use std::ops::RangeInclusive;

use crate::algorithm::quality::BaselineSet;
use crate::error::{PipelineError, Result};
use crate::reporting::event_time::EventWindow;

/// Default maximum distance (years) between observations that may be bridged
pub const DEFAULT_MAX_GAP: i32 = 3;

/// Population weights used when collapsing tracts into counties
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weighting {
    /// Total tract population from the 1969 geographic reference file
    Georef1970,
    /// School-age population extract for the given year
    SchoolAge {
        /// Census year of the extract
        year: i32,
    },
}

impl fmt::Display for Weighting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Georef1970 => write!(f, "1970 reference population"),
            Self::SchoolAge { year } => write!(f, "{year} school-age population"),
        }
    }
}

/// Configuration for one analysis variant
#[derive(Debug, Clone)]
pub struct VariantConfig {
    /// Name, also used as the output sub-directory
    pub name: String,
    /// Baseline year sets to compute quality flags for
    pub baseline_sets: Vec<BaselineSet>,
    /// Name of the set gating baseline quartiles
    pub primary_set: String,
    /// Tract-to-county weighting scheme
    pub weighting: Weighting,
    /// Largest distance between observations bridged by interpolation
    pub max_gap: i32,
    /// Trailing smoothing window in years (1 disables smoothing)
    pub smoothing_window: usize,
    /// First and last year of the dense panel grid
    pub years: RangeInclusive<i32>,
    /// Deflate spending to dollars of this year
    pub deflate_to: Option<i32>,
    /// Event-time binning window
    pub event_window: EventWindow,
}

impl Default for VariantConfig {
    fn default() -> Self {
        let baseline_sets = BaselineSet::defaults();
        Self {
            name: "main".to_string(),
            primary_set: baseline_sets[0].name.clone(),
            baseline_sets,
            weighting: Weighting::Georef1970,
            max_gap: DEFAULT_MAX_GAP,
            smoothing_window: 1,
            years: 1967..=2010,
            deflate_to: None,
            event_window: EventWindow::default(),
        }
    }
}

impl VariantConfig {
    /// The main variant plus the standard robustness variants
    #[must_use]
    pub fn standard_variants() -> Vec<Self> {
        let main = Self::default();
        vec![
            Self {
                name: "weight_1990".to_string(),
                weighting: Weighting::SchoolAge { year: 1990 },
                ..main.clone()
            },
            Self {
                name: "smoothed_3yr".to_string(),
                smoothing_window: 3,
                ..main.clone()
            },
            Self {
                name: "baseline_70_72".to_string(),
                primary_set: "70_72".to_string(),
                ..main.clone()
            },
            main,
        ]
    }

    /// Check the variant is internally consistent
    pub fn validate(&self) -> Result<()> {
        if self.baseline_sets.is_empty() {
            return Err(PipelineError::Validation(format!(
                "variant '{}' has no baseline sets",
                self.name
            )));
        }
        if !self.baseline_sets.iter().any(|set| set.name == self.primary_set) {
            return Err(PipelineError::Validation(format!(
                "variant '{}': primary set '{}' is not among its baseline sets",
                self.name, self.primary_set
            )));
        }
        if self.years.is_empty() {
            return Err(PipelineError::Validation(format!(
                "variant '{}' has an empty year range",
                self.name
            )));
        }
        if self.max_gap < 1 || self.smoothing_window == 0 {
            return Err(PipelineError::Validation(format!(
                "variant '{}': max_gap and smoothing_window must be positive",
                self.name
            )));
        }
        Ok(())
    }

    /// Index of the primary baseline set
    #[must_use]
    pub fn primary_set_index(&self) -> usize {
        self.baseline_sets
            .iter()
            .position(|set| set.name == self.primary_set)
            .unwrap_or(0)
    }
}

impl fmt::Display for VariantConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Variant '{}':", self.name)?;
        for set in &self.baseline_sets {
            writeln!(f, "  Baseline Set {set}")?;
        }
        writeln!(f, "  Primary Set: {}", self.primary_set)?;
        writeln!(f, "  Weighting: {}", self.weighting)?;
        writeln!(f, "  Max Gap: {}", self.max_gap)?;
        writeln!(f, "  Smoothing Window: {}", self.smoothing_window)?;
        writeln!(f, "  Years: {}-{}", self.years.start(), self.years.end())?;
        if let Some(base) = self.deflate_to {
            writeln!(f, "  Deflated To: {base} dollars")?;
        }
        Ok(())
    }
}

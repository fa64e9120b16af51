//! Row counts per state across pipeline stages
//!
//! Investigative only: a state whose rows vanish between two stages is
//! reported, never repaired.

use std::collections::BTreeMap;
use std::fmt;

use crate::sources::lookups::StateInfo;

/// A state present at one stage and absent at a later one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attrition {
    /// 2-digit state FIPS
    pub state: String,
    /// Last stage with rows
    pub last_present: String,
    /// First later stage without rows
    pub lost_at: String,
}

/// Rows per state, per recorded stage
#[derive(Debug, Clone, Default)]
pub struct StageCounts {
    stages: Vec<String>,
    counts: BTreeMap<String, Vec<usize>>,
}

impl StageCounts {
    /// Empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a stage from the state code of each of its rows
    pub fn record<'a, I>(&mut self, stage: &str, states: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let index = self.stages.len();
        self.stages.push(stage.to_string());
        for state in states {
            let counts = self.counts.entry(state.to_string()).or_default();
            counts.resize(index + 1, 0);
            counts[index] += 1;
        }
        for counts in self.counts.values_mut() {
            counts.resize(index + 1, 0);
        }

        let total: usize = self.counts.values().map(|c| c[index]).sum();
        log::debug!("Stage '{stage}': {total} rows");
    }

    /// Rows of a state at a stage
    #[must_use]
    pub fn count(&self, state: &str, stage: &str) -> usize {
        let Some(index) = self.stages.iter().position(|s| s == stage) else {
            return 0;
        };
        self.counts.get(state).and_then(|c| c.get(index)).copied().unwrap_or(0)
    }

    /// Recorded stage names, in order
    #[must_use]
    pub fn stages(&self) -> &[String] {
        &self.stages
    }

    /// States that drop to zero rows after having rows, first drop only
    #[must_use]
    pub fn attrition(&self) -> Vec<Attrition> {
        self.counts
            .iter()
            .filter_map(|(state, counts)| {
                let first_present = counts.iter().position(|&c| c > 0)?;
                let lost = first_present + counts[first_present..].iter().position(|&c| c == 0)?;
                Some(Attrition {
                    state: state.clone(),
                    last_present: self.stages[lost - 1].clone(),
                    lost_at: self.stages[lost].clone(),
                })
            })
            .collect()
    }

    /// Warn about every attrited state, named by its abbreviation when known
    pub fn log_attrition(&self, states: &BTreeMap<String, StateInfo>) {
        for a in self.attrition() {
            let label = states
                .get(&a.state)
                .map_or_else(|| a.state.clone(), |info| format!("{} ({})", a.state, info.abbrev));
            log::warn!(
                "State {label} has rows at stage '{}' but none at '{}'",
                a.last_present,
                a.lost_at
            );
        }
    }
}

impl fmt::Display for StageCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Stage Counts:")?;
        write!(f, "  {:<6}", "state")?;
        for stage in &self.stages {
            write!(f, " {stage:>16}")?;
        }
        writeln!(f)?;
        for (state, counts) in &self.counts {
            write!(f, "  {state:<6}")?;
            for count in counts {
                write!(f, " {count:>16}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

//! End-of-run summary.

use std::fmt;
use std::path::PathBuf;

use crate::assertion::FailedAssertion;
use crate::config::Mode;

/// What a session did, for logging at `quit` or on failure.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionReport {
    /// Session mode.
    pub mode: Mode,
    /// Trace path from the configuration.
    pub trace_path: Option<PathBuf>,
    /// Ticks run since `init` or the last `reset`.
    pub ticks: u64,
    /// Assertions evaluated.
    pub assertions_evaluated: u64,
    /// Distinct assertion call sites seen.
    pub unique_sites: usize,
    /// Failed assertions (bounded).
    pub failures: Vec<FailedAssertion>,
    /// Failed assertions including those past the storage bound.
    pub fire_count: u32,
    /// Whether the run was explicitly failed.
    pub failed: bool,
}

impl SessionReport {
    /// `true` if the run neither failed nor recorded a failed assertion.
    pub fn passed(&self) -> bool {
        !self.failed && self.fire_count == 0
    }
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "========== Rewind Report ==========")?;
        writeln!(f, "  Mode       : {}", self.mode.as_str().to_ascii_uppercase())?;
        if let Some(path) = &self.trace_path {
            writeln!(f, "  Trace file : {}", path.display())?;
        }
        writeln!(f, "  Ticks run  : {}", self.ticks)?;
        writeln!(
            f,
            "  Assertions : {} evaluated at {} sites",
            self.assertions_evaluated, self.unique_sites
        )?;
        writeln!(f, "  Failures   : {}", self.fire_count)?;
        if !self.failures.is_empty() {
            writeln!(f)?;
            writeln!(f, "  Failed assertions:")?;
            for (i, failure) in self.failures.iter().enumerate() {
                writeln!(f, "    [{}] {}  ({})", i + 1, failure.message, failure.site)?;
            }
        }
        writeln!(f)?;
        writeln!(
            f,
            "  Result : {}",
            if self.passed() { "PASS" } else { "FAIL" }
        )?;
        write!(f, "===================================")
    }
}

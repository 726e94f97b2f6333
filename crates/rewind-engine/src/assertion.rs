//! Assertion accumulation.
//!
//! Assertions never panic. A failed assertion is logged, stored (up to
//! [`MAX_FAILED_ASSERTIONS`]), reported to the trigger callback, and counted
//! towards the session's fail threshold.

use std::fmt;

use indexmap::IndexSet;
use rewind_core::CallSite;

use crate::session::Session;
use crate::value::{DOUBLE_EPSILON, FLOAT_EPSILON};

/// Failed assertions stored per run. Later failures are still counted.
pub const MAX_FAILED_ASSERTIONS: usize = 1024;

/// Distinct call sites tracked per run. Further sites are not counted.
pub const MAX_UNIQUE_ASSERTION_SITES: usize = 4096;

/// One failed assertion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailedAssertion {
    /// What went wrong.
    pub message: String,
    /// Where the assertion was made.
    pub site: CallSite,
}

impl fmt::Display for FailedAssertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.site)
    }
}

/// Outcome of [`AssertionLog::evaluate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// The condition held.
    Passed,
    /// The condition failed.
    Failed {
        /// The failure, as stored.
        failure: FailedAssertion,
        /// Whether the fire count has reached the threshold.
        threshold_reached: bool,
    },
}

/// Per-run assertion statistics.
#[derive(Debug)]
pub struct AssertionLog {
    failed: Vec<FailedAssertion>,
    fire_count: u32,
    total: u64,
    sites: IndexSet<u32>,
    threshold: u32,
}

impl AssertionLog {
    /// Create an empty log that reports `threshold_reached` once `threshold`
    /// failures have fired. A threshold of zero behaves like one.
    pub fn new(threshold: u32) -> Self {
        Self {
            failed: Vec::new(),
            fire_count: 0,
            total: 0,
            sites: IndexSet::with_capacity(MAX_UNIQUE_ASSERTION_SITES),
            threshold: threshold.max(1),
        }
    }

    /// Count an evaluation at `site` and record it if `passed` is false.
    pub fn evaluate(&mut self, passed: bool, message: &str, site: CallSite) -> Verdict {
        self.total += 1;
        if self.sites.len() < MAX_UNIQUE_ASSERTION_SITES {
            self.sites.insert(site.hash());
        }
        if passed {
            return Verdict::Passed;
        }

        self.fire_count = self.fire_count.saturating_add(1);
        let failure = FailedAssertion {
            message: message.to_string(),
            site,
        };
        if self.failed.len() < MAX_FAILED_ASSERTIONS {
            self.failed.push(failure.clone());
        }
        Verdict::Failed {
            failure,
            threshold_reached: self.fire_count >= self.threshold,
        }
    }

    /// Stored failures, oldest first.
    pub fn failed(&self) -> &[FailedAssertion] {
        &self.failed
    }

    /// Failures fired, including those past the storage bound.
    pub fn fire_count(&self) -> u32 {
        self.fire_count
    }

    /// Assertions evaluated.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Distinct call sites seen.
    pub fn unique_sites(&self) -> usize {
        self.sites.len()
    }

    /// Forget stored failures and the fire count. Totals are kept.
    pub fn reset_failures(&mut self) {
        self.failed.clear();
        self.fire_count = 0;
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.reset_failures();
        self.total = 0;
        self.sites.clear();
    }
}

// ── Session entry points ──────────────────────────────────────────

impl Session {
    /// Evaluate `condition`; on failure log `message` with the caller's
    /// location and count it towards the fail threshold.
    ///
    /// No-op while disabled or uninitialised.
    #[track_caller]
    pub fn assert(&self, condition: bool, message: &str) {
        self.assert_at(condition, message, CallSite::caller());
    }

    /// Same as [`assert`](Self::assert).
    #[track_caller]
    pub fn assert_true(&self, condition: bool, message: &str) {
        self.assert_at(condition, message, CallSite::caller());
    }

    /// Assert that `condition` is false.
    #[track_caller]
    pub fn assert_false(&self, condition: bool, message: &str) {
        self.assert_at(!condition, message, CallSite::caller());
    }

    /// Assert that two values are equal.
    #[track_caller]
    pub fn assert_eq<T: PartialEq + fmt::Debug + ?Sized>(&self, left: &T, right: &T) {
        let site = CallSite::caller();
        let equal = left == right;
        let message = if equal {
            String::new()
        } else {
            format!("expected values to be equal: {left:?} == {right:?}")
        };
        self.assert_at(equal, &message, site);
    }

    /// Assert that two values differ.
    #[track_caller]
    pub fn assert_ne<T: PartialEq + fmt::Debug + ?Sized>(&self, left: &T, right: &T) {
        let site = CallSite::caller();
        let differ = left != right;
        let message = if differ {
            String::new()
        } else {
            format!("expected values to differ: {left:?} != {right:?}")
        };
        self.assert_at(differ, &message, site);
    }

    /// Assert that `value` equals its type's zero (`Default`) value.
    #[track_caller]
    pub fn assert_zero<T: PartialEq + Default + fmt::Debug>(&self, value: T) {
        let site = CallSite::caller();
        let zero = value == T::default();
        let message = if zero {
            String::new()
        } else {
            format!("expected zero, got {value:?}")
        };
        self.assert_at(zero, &message, site);
    }

    /// Assert that `value` differs from its type's zero (`Default`) value.
    #[track_caller]
    pub fn assert_non_zero<T: PartialEq + Default + fmt::Debug>(&self, value: T) {
        let site = CallSite::caller();
        let non_zero = value != T::default();
        let message = if non_zero {
            String::new()
        } else {
            format!("expected a non-zero value, got {value:?}")
        };
        self.assert_at(non_zero, &message, site);
    }

    /// Assert that two `f32` values are within [`FLOAT_EPSILON`].
    #[track_caller]
    pub fn assert_near_f32(&self, left: f32, right: f32) {
        let site = CallSite::caller();
        let near = (left - right).abs() < FLOAT_EPSILON;
        let message = if near {
            String::new()
        } else {
            format!("expected values to be approximately equal: {left:?} ≈ {right:?}")
        };
        self.assert_at(near, &message, site);
    }

    /// Assert that two `f64` values are within [`DOUBLE_EPSILON`].
    #[track_caller]
    pub fn assert_near_f64(&self, left: f64, right: f64) {
        let site = CallSite::caller();
        let near = (left - right).abs() < DOUBLE_EPSILON;
        let message = if near {
            String::new()
        } else {
            format!("expected values to be approximately equal: {left:?} ≈ {right:?}")
        };
        self.assert_at(near, &message, site);
    }

    /// Copy of the stored failed assertions.
    pub fn get_failed_assertions(&self) -> Vec<FailedAssertion> {
        self.with_active(|a| a.assertions.failed().to_vec())
            .unwrap_or_default()
    }

    /// Forget stored failures, the fire count, totals, and seen sites.
    pub fn clear_failed_assertions(&self) {
        self.with_active(|a| a.assertions.clear());
    }

    pub(crate) fn assert_at(&self, condition: bool, message: &str, site: CallSite) {
        let outcome = self
            .with_active(|a| match a.assertions.evaluate(condition, message, site) {
                Verdict::Passed => None,
                Verdict::Failed {
                    failure,
                    threshold_reached,
                } => {
                    let fail = (threshold_reached && !a.failed).then(|| {
                        log::error!(
                            "assertion failure count {} reached the fail threshold of {}",
                            a.assertions.fire_count(),
                            a.config.effective_fail_threshold()
                        );
                        a.mark_failed()
                    });
                    Some((failure, a.config.on_assertion.clone(), fail))
                }
            })
            .flatten();

        let Some((failure, trigger, fail)) = outcome else {
            return;
        };
        log::error!("assertion failed at {}: {}", failure.site, failure.message);
        if let Some(trigger) = trigger {
            trigger(&failure);
        }
        if let Some(fail) = fail {
            fail.run();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(line: u32) -> CallSite {
        CallSite {
            file: "src/level.rs",
            line,
            column: 5,
        }
    }

    #[test]
    fn passing_assertions_only_count() {
        let mut log = AssertionLog::new(1);
        assert_eq!(log.evaluate(true, "ok", site(1)), Verdict::Passed);
        assert_eq!(log.evaluate(true, "ok", site(1)), Verdict::Passed);
        assert_eq!(log.total(), 2);
        assert_eq!(log.unique_sites(), 1);
        assert!(log.failed().is_empty());
    }

    #[test]
    fn threshold_reached_on_third_failure() {
        let mut log = AssertionLog::new(3);
        for expected in [false, false, true, true] {
            match log.evaluate(false, "boom", site(2)) {
                Verdict::Failed {
                    threshold_reached, ..
                } => assert_eq!(threshold_reached, expected),
                Verdict::Passed => panic!("expected failure"),
            }
        }
        assert_eq!(log.fire_count(), 4);
    }

    #[test]
    fn zero_threshold_fails_first() {
        let mut log = AssertionLog::new(0);
        assert!(matches!(
            log.evaluate(false, "x", site(1)),
            Verdict::Failed {
                threshold_reached: true,
                ..
            }
        ));
    }

    #[test]
    fn storage_is_bounded_but_count_is_not() {
        let mut log = AssertionLog::new(u32::MAX);
        for i in 0..(MAX_FAILED_ASSERTIONS + 10) {
            log.evaluate(false, "x", site(i as u32));
        }
        assert_eq!(log.failed().len(), MAX_FAILED_ASSERTIONS);
        assert_eq!(log.fire_count() as usize, MAX_FAILED_ASSERTIONS + 10);
    }

    #[test]
    fn site_set_saturates() {
        let mut log = AssertionLog::new(1);
        for line in 0..(MAX_UNIQUE_ASSERTION_SITES as u32 + 100) {
            log.evaluate(true, "", site(line));
        }
        assert_eq!(log.unique_sites(), MAX_UNIQUE_ASSERTION_SITES);
    }

    #[test]
    fn clear_resets_everything() {
        let mut log = AssertionLog::new(1);
        log.evaluate(false, "x", site(1));
        log.reset_failures();
        assert_eq!(log.fire_count(), 0);
        assert_eq!(log.total(), 1);
        log.clear();
        assert_eq!(log.total(), 0);
        assert_eq!(log.unique_sites(), 0);
    }
}

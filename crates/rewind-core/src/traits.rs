//! Capability traits implemented by platform adapters.
//!
//! The engine never talks to the operating system directly. Capturing
//! real input, synthesizing input, and reading a monotonic clock all go
//! through these traits so that adapters can be swapped per target and
//! tests can script every side effect.

use std::time::Instant;

use crate::input::InputSnapshot;

/// Input capture and injection for one target platform.
///
/// Both methods take `&self`: injection may be driven from a background
/// thread while the host thread keeps calling into the session, so
/// implementations handle their own interior synchronization.
pub trait Platform: Send + Sync {
    /// Sample the current state of every input device.
    ///
    /// Called only while recording.
    fn capture_input(&self) -> InputSnapshot;

    /// Synthesize the transition from `prev` to `new`.
    ///
    /// Called only while replaying. Implementations must emit only the
    /// delta (changed keys, buttons, cursor movement, wheel) so that the
    /// host's event queue observes discrete transitions.
    fn inject_input(&self, new: &InputSnapshot, prev: &InputSnapshot);
}

/// Monotonic time source.
pub trait Clock: Send + Sync {
    /// Seconds since an arbitrary fixed epoch, stable for the process
    /// lifetime.
    fn now(&self) -> f64;
}

/// [`Clock`] backed by [`Instant`], with its epoch at construction.
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    /// Create a clock whose epoch is now.
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }
}

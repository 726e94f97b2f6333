//! Test utilities and mock types for Rewind development.
//!
//! Provides mock implementations of the capability traits
//! ([`Platform`], [`Clock`]) and a [`CallLog`] for observing callbacks.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use rewind_core::{Clock, InputSnapshot, Platform};

pub use fixtures::{held, key_script};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Mock [`Platform`] driven by a script of snapshots.
///
/// Each [`capture_input`](Platform::capture_input) pops the next queued
/// snapshot; once the queue is empty the last one repeats. Every
/// [`inject_input`](Platform::inject_input) call is recorded for
/// inspection with [`injections`](ScriptedPlatform::injections).
pub struct ScriptedPlatform {
    script: Mutex<VecDeque<InputSnapshot>>,
    current: Mutex<InputSnapshot>,
    injected: Mutex<Vec<(InputSnapshot, InputSnapshot)>>,
}

impl ScriptedPlatform {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            current: Mutex::new(InputSnapshot::empty()),
            injected: Mutex::new(Vec::new()),
        }
    }

    /// A platform whose captures return `snapshots` in order.
    pub fn with_script(snapshots: impl IntoIterator<Item = InputSnapshot>) -> Self {
        let platform = Self::new();
        lock(&platform.script).extend(snapshots);
        platform
    }

    /// Queue a snapshot for a later capture.
    pub fn push(&self, snapshot: InputSnapshot) {
        lock(&self.script).push_back(snapshot);
    }

    /// Snapshots still queued.
    pub fn remaining(&self) -> usize {
        lock(&self.script).len()
    }

    /// Every `(new, prev)` pair passed to `inject_input`, in call order.
    pub fn injections(&self) -> Vec<(InputSnapshot, InputSnapshot)> {
        lock(&self.injected).clone()
    }

    /// Number of `inject_input` calls so far.
    pub fn injection_count(&self) -> usize {
        lock(&self.injected).len()
    }

    /// The most recently injected snapshot.
    pub fn last_injected(&self) -> Option<InputSnapshot> {
        lock(&self.injected).last().map(|(new, _)| new.clone())
    }
}

impl Default for ScriptedPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for ScriptedPlatform {
    fn capture_input(&self) -> InputSnapshot {
        let mut current = lock(&self.current);
        if let Some(next) = lock(&self.script).pop_front() {
            *current = next;
        }
        current.clone()
    }

    fn inject_input(&self, new: &InputSnapshot, prev: &InputSnapshot) {
        lock(&self.injected).push((new.clone(), prev.clone()));
    }
}

/// Mock [`Clock`] that only moves when told to.
///
/// Backed by an `AtomicU64` holding the `f64` bits so it can be shared
/// with a background thread.
pub struct ManualClock {
    bits: AtomicU64,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            bits: AtomicU64::new(start.to_bits()),
        }
    }

    /// Jump to `t` seconds.
    pub fn set(&self, t: f64) {
        self.bits.store(t.to_bits(), Ordering::SeqCst);
    }

    /// Move forward by `dt` seconds.
    pub fn advance(&self, dt: f64) {
        let now = self.now();
        self.set(now + dt);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}

/// Thread-safe record of callback invocations.
pub struct CallLog<T> {
    calls: Mutex<Vec<T>>,
}

impl<T: Clone> CallLog<T> {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, call: T) {
        lock(&self.calls).push(call);
    }

    /// Copy of every recorded call.
    pub fn calls(&self) -> Vec<T> {
        lock(&self.calls).clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.calls).is_empty()
    }
}

impl<T: Clone> Default for CallLog<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rewind_core::Key;

    #[test]
    fn script_repeats_last_snapshot() {
        let platform = ScriptedPlatform::with_script([held(&[Key::A]), held(&[Key::B])]);
        assert!(platform.capture_input().is_key_down(Key::A));
        assert!(platform.capture_input().is_key_down(Key::B));
        assert!(platform.capture_input().is_key_down(Key::B));
        assert_eq!(platform.remaining(), 0);
    }

    #[test]
    fn injections_are_recorded() {
        let platform = ScriptedPlatform::new();
        platform.inject_input(&held(&[Key::A]), &InputSnapshot::empty());
        assert_eq!(platform.injection_count(), 1);
        assert!(platform.last_injected().unwrap().is_key_down(Key::A));
    }

    #[test]
    fn manual_clock_moves_on_demand() {
        let clock = ManualClock::new(1.0);
        clock.advance(0.5);
        assert_eq!(clock.now(), 1.5);
        clock.set(10.0);
        assert_eq!(clock.now(), 10.0);
    }

    #[test]
    fn call_log_collects() {
        let log = CallLog::new();
        log.push(3);
        log.push(4);
        assert_eq!(log.calls(), vec![3, 4]);
    }
}

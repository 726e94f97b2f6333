//! Replay clock and injector.
//!
//! The replay clock runs at wall-clock rate from the moment the trace is
//! armed, minus an offset that absorbs time the application spent getting
//! to each sync signal:
//!
//! ```text
//! replay_time = (now - origin) - offset
//! ```
//!
//! [`Replayer::poll`] walks the decoded inputs and signals up to
//! `replay_time`. Inputs that fall due in the same poll collapse into one
//! injection of the latest snapshot. A due signal gates the stream until
//! the application reaches the same point and calls
//! [`Replayer::sync_signal`], which shifts the offset so that
//! `replay_time` lands exactly on the signal's recorded timestamp.

use rewind_core::InputSnapshot;
use rewind_trace::{DataTable, DecodedTrace, InputRecord, SignalRecord};

/// Maximum number of due events handled by one [`Replayer::poll`].
pub const BATCH_CAP: usize = 64;

/// A snapshot to hand to [`Platform::inject_input`](rewind_core::Platform::inject_input).
#[derive(Clone, Debug, PartialEq)]
pub struct Injection {
    /// Snapshot to apply.
    pub new: InputSnapshot,
    /// Snapshot applied by the previous injection.
    pub prev: InputSnapshot,
}

/// Result of matching a sync signal against the trace.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SignalOutcome {
    /// The signal matched the next expected one and the clock was adjusted
    /// by `shift` seconds.
    Matched {
        /// Whether replay was already gated on the signal.
        late: bool,
        /// Amount added to the clock offset.
        shift: f64,
    },
    /// A different signal is expected next.
    Mismatch {
        /// The id the trace expects.
        expected: i32,
    },
    /// Every recorded signal has already been matched.
    Exhausted,
}

#[derive(Clone, Copy, Debug)]
struct Wait {
    signal_id: i32,
    since: f64,
}

/// Decoded trace plus its cursors and replay clock.
pub struct Replayer {
    inputs: Vec<InputRecord>,
    signals: Vec<SignalRecord>,
    pins: DataTable,
    tracks: DataTable,
    input_cursor: usize,
    signal_cursor: usize,
    origin: f64,
    offset: f64,
    waiting: Option<Wait>,
    last_injected: InputSnapshot,
}

impl Replayer {
    /// Take ownership of a decoded trace and start its clock at `origin`.
    pub fn new(trace: DecodedTrace, origin: f64) -> Self {
        Self {
            inputs: trace.inputs,
            signals: trace.signals,
            pins: trace.pins,
            tracks: trace.tracks,
            input_cursor: 0,
            signal_cursor: 0,
            origin,
            offset: 0.0,
            waiting: None,
            last_injected: InputSnapshot::empty(),
        }
    }

    /// Restart from the first record with the clock at `origin`.
    ///
    /// Clears the offset, the signal gate, the last injected snapshot and
    /// every Pin/Track cursor.
    pub fn rearm(&mut self, origin: f64) {
        self.input_cursor = 0;
        self.signal_cursor = 0;
        self.origin = origin;
        self.offset = 0.0;
        self.waiting = None;
        self.last_injected = InputSnapshot::empty();
        self.pins.rewind();
        self.tracks.rewind();
    }

    /// Current position on the recording's timeline.
    pub fn replay_time(&self, now: f64) -> f64 {
        (now - self.origin) - self.offset
    }

    /// Accumulated clock correction.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Whether injection is gated on a signal.
    pub fn is_waiting(&self) -> bool {
        self.waiting.is_some()
    }

    /// The signal id injection is gated on, if any.
    pub fn waiting_signal(&self) -> Option<i32> {
        self.waiting.map(|w| w.signal_id)
    }

    /// Whether every input and signal has been consumed.
    pub fn is_finished(&self) -> bool {
        self.input_cursor >= self.inputs.len() && self.signal_cursor >= self.signals.len()
    }

    /// Recorded Pin values.
    pub fn pins_mut(&mut self) -> &mut DataTable {
        &mut self.pins
    }

    /// Recorded Track values.
    pub fn tracks_mut(&mut self) -> &mut DataTable {
        &mut self.tracks
    }

    fn next_input_time(&self) -> f64 {
        self.inputs
            .get(self.input_cursor)
            .map_or(f64::INFINITY, |r| r.timestamp)
    }

    fn next_signal(&self) -> Option<&SignalRecord> {
        self.signals.get(self.signal_cursor)
    }

    /// Advance through everything due at `now` and return the injection to
    /// perform, if any.
    ///
    /// Does nothing while gated. A signal whose timestamp is at or before
    /// the next input's is handled first; when it is due, the inputs
    /// gathered so far are flushed and replay gates on it.
    pub fn poll(&mut self, now: f64) -> Option<Injection> {
        if self.waiting.is_some() {
            return None;
        }
        let replay_time = self.replay_time(now);
        let mut latest = None;
        let mut handled = 0;

        while handled < BATCH_CAP {
            let input_at = self.next_input_time();
            let signal_at = self.next_signal().map_or(f64::INFINITY, |s| s.timestamp);

            if signal_at <= input_at {
                let Some(signal) = self.next_signal() else {
                    break;
                };
                if signal.timestamp > replay_time {
                    break;
                }
                let wait = Wait {
                    signal_id: signal.signal_id,
                    since: self.origin + self.offset + signal.timestamp,
                };
                log::debug!(
                    "replay gated on signal {} at {:.3}s",
                    wait.signal_id,
                    signal.timestamp
                );
                self.waiting = Some(wait);
                break;
            }

            if input_at > replay_time {
                break;
            }
            latest = Some(self.input_cursor);
            self.input_cursor += 1;
            handled += 1;
        }

        if handled == BATCH_CAP && self.waiting.is_none() && self.has_due_event(replay_time) {
            log::debug!(
                "injector batch cap of {BATCH_CAP} reached at {replay_time:.3}s; \
                 remaining events deferred (drift risk)"
            );
        }

        let index = latest?;
        let new = self.inputs[index].snapshot.clone();
        let prev = std::mem::replace(&mut self.last_injected, new.clone());
        log::debug!(
            "injecting input {index} (recorded at {:.3}s)",
            self.inputs[index].timestamp
        );
        Some(Injection { new, prev })
    }

    fn has_due_event(&self, replay_time: f64) -> bool {
        let signal_at = self.next_signal().map_or(f64::INFINITY, |s| s.timestamp);
        self.next_input_time().min(signal_at) <= replay_time
    }

    /// Match an application sync signal against the next expected one.
    ///
    /// On a match the offset is shifted so that `replay_time(now)` equals
    /// the signal's timestamp, the signal cursor advances, and the gate
    /// clears. Mismatches leave every cursor and the gate untouched.
    pub fn sync_signal(&mut self, signal_id: i32, now: f64) -> SignalOutcome {
        let Some(expected) = self.next_signal().copied() else {
            return SignalOutcome::Exhausted;
        };
        if expected.signal_id != signal_id {
            return SignalOutcome::Mismatch {
                expected: expected.signal_id,
            };
        }

        let (late, shift) = match self.waiting.take() {
            Some(wait) => (true, now - wait.since),
            None => (false, self.replay_time(now) - expected.timestamp),
        };
        self.offset += shift;
        self.signal_cursor += 1;
        SignalOutcome::Matched { late, shift }
    }
}

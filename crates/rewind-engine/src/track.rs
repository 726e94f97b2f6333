//! Track: assert a value matches its recorded counterpart during replay.
//!
//! Divergence is reported through the assertion subsystem, so it counts
//! towards the fail threshold like any other failed assertion.

use rewind_core::CallSite;
use rewind_trace::{DataKind, Payload, MAX_PAYLOAD};

use crate::session::{Channel, Session};
use crate::value::{describe_mismatch, values_match, Comparison, TraceValue};

impl Session {
    /// Track raw bytes, compared exactly.
    #[track_caller]
    pub fn track_bytes(&self, key: u32, value: &[u8]) {
        self.track_at(key, value, Comparison::Exact, CallSite::caller());
    }

    /// Track any [`TraceValue`] using its comparison.
    #[track_caller]
    pub fn track<T: TraceValue>(&self, key: u32, value: &T) {
        self.track_at(key, &value.to_payload(), T::COMPARISON, CallSite::caller());
    }

    /// Track an `i32`.
    #[track_caller]
    pub fn track_int(&self, key: u32, value: i32) {
        self.track(key, &value);
    }

    /// Track a `u32`.
    #[track_caller]
    pub fn track_uint(&self, key: u32, value: u32) {
        self.track(key, &value);
    }

    /// Track an `i64`.
    #[track_caller]
    pub fn track_i64(&self, key: u32, value: i64) {
        self.track(key, &value);
    }

    /// Track a `u64`.
    #[track_caller]
    pub fn track_u64(&self, key: u32, value: u64) {
        self.track(key, &value);
    }

    /// Track an `f32`, within [`FLOAT_EPSILON`](crate::value::FLOAT_EPSILON).
    #[track_caller]
    pub fn track_float(&self, key: u32, value: f32) {
        self.track(key, &value);
    }

    /// Track an `f64`, within [`DOUBLE_EPSILON`](crate::value::DOUBLE_EPSILON).
    #[track_caller]
    pub fn track_double(&self, key: u32, value: f64) {
        self.track(key, &value);
    }

    /// Track a `bool`.
    #[track_caller]
    pub fn track_bool(&self, key: u32, value: bool) {
        self.track(key, &value);
    }

    fn track_at(&self, key: u32, value: &[u8], cmp: Comparison, site: CallSite) {
        if value.is_empty() {
            return;
        }
        let recorded: Option<(u32, Payload)> = self
            .with_active(|a| {
                if value.len() > MAX_PAYLOAD {
                    log::error!(
                        "track for key {key} is {} bytes, maximum is {MAX_PAYLOAD}; ignored",
                        value.len()
                    );
                    return None;
                }
                let index = a.track_counter.next(key);
                match &mut a.channel {
                    Channel::Record(recorder) => {
                        recorder.write_data_record(DataKind::Track, key, index, value);
                        None
                    }
                    Channel::Replay(replayer) => match replayer.tracks_mut().take(key, index) {
                        None => {
                            log::warn!(
                                "no recorded track for key {key} index {index}; check skipped"
                            );
                            None
                        }
                        Some(rec) if rec.payload.len() != value.len() => {
                            log::warn!(
                                "track size mismatch for key {key} index {index}: recorded {} \
                                 bytes, got {}; check skipped",
                                rec.payload.len(),
                                value.len()
                            );
                            None
                        }
                        Some(rec) => Some((index, rec.payload.clone())),
                    },
                    Channel::Disabled => None,
                }
            })
            .flatten();

        let Some((index, recorded)) = recorded else {
            return;
        };
        if values_match(cmp, &recorded, value) {
            return;
        }
        let detail = describe_mismatch(key, index, cmp, &recorded, value);
        self.assert_at(false, &detail, site);
    }
}

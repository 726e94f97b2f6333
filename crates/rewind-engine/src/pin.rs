//! Pin: force a value to its recorded counterpart during replay.
//!
//! In record mode the current value is written to the trace and left
//! alone. In replay mode the value is overwritten with the recording made
//! by the same call (same key, same ordinal within the tick). A missing
//! recording or a size change leaves the value untouched.

use rewind_trace::{DataKind, MAX_PAYLOAD};

use crate::session::{Channel, Session};
use crate::value::TraceValue;

impl Session {
    /// Pin raw bytes. Returns `true` if `value` was overwritten.
    pub fn pin_bytes(&self, key: u32, value: &mut [u8]) -> bool {
        if value.is_empty() {
            return false;
        }
        self.with_active(|a| {
            if value.len() > MAX_PAYLOAD {
                log::error!(
                    "pin for key {key} is {} bytes, maximum is {MAX_PAYLOAD}; ignored",
                    value.len()
                );
                return false;
            }
            let index = a.pin_counter.next(key);
            match &mut a.channel {
                Channel::Record(recorder) => {
                    recorder.write_data_record(DataKind::Pin, key, index, value);
                    false
                }
                Channel::Replay(replayer) => match replayer.pins_mut().take(key, index) {
                    None => {
                        log::warn!(
                            "no recorded pin for key {key} index {index}; value left unchanged"
                        );
                        false
                    }
                    Some(rec) if rec.payload.len() != value.len() => {
                        log::warn!(
                            "pin size mismatch for key {key} index {index}: recorded {} bytes, \
                             got {}; value left unchanged",
                            rec.payload.len(),
                            value.len()
                        );
                        false
                    }
                    Some(rec) => {
                        value.copy_from_slice(&rec.payload);
                        true
                    }
                },
                Channel::Disabled => false,
            }
        })
        .unwrap_or(false)
    }

    /// Pin any [`TraceValue`]. Returns `true` if `value` was overwritten.
    pub fn pin<T: TraceValue>(&self, key: u32, value: &mut T) -> bool {
        let mut bytes = value.to_payload();
        if !self.pin_bytes(key, &mut bytes) {
            return false;
        }
        match T::from_bytes(&bytes) {
            Some(restored) => {
                *value = restored;
                true
            }
            None => false,
        }
    }

    /// Pin an `i32`.
    pub fn pin_int(&self, key: u32, value: &mut i32) -> bool {
        self.pin(key, value)
    }

    /// Pin a `u32`.
    pub fn pin_uint(&self, key: u32, value: &mut u32) -> bool {
        self.pin(key, value)
    }

    /// Pin an `i64`.
    pub fn pin_i64(&self, key: u32, value: &mut i64) -> bool {
        self.pin(key, value)
    }

    /// Pin a `u64`.
    pub fn pin_u64(&self, key: u32, value: &mut u64) -> bool {
        self.pin(key, value)
    }

    /// Pin an `f32`.
    pub fn pin_float(&self, key: u32, value: &mut f32) -> bool {
        self.pin(key, value)
    }

    /// Pin an `f64`.
    pub fn pin_double(&self, key: u32, value: &mut f64) -> bool {
        self.pin(key, value)
    }

    /// Pin a `bool`.
    pub fn pin_bool(&self, key: u32, value: &mut bool) -> bool {
        self.pin(key, value)
    }
}

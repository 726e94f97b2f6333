//! Byte encoding and comparison for Pin/Track values.

use std::fmt::Write as _;

use rewind_trace::Payload;

/// Tolerance for `f32` Track comparisons.
pub const FLOAT_EPSILON: f32 = 1e-5;

/// Tolerance for `f64` Track comparisons.
pub const DOUBLE_EPSILON: f64 = 1e-11;

/// How a tracked value is compared against its recording.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Comparison {
    /// Byte-for-byte.
    Exact,
    /// As `f32`, within [`FLOAT_EPSILON`].
    Float,
    /// As `f64`, within [`DOUBLE_EPSILON`].
    Double,
}

/// A value that can be pinned or tracked.
///
/// Values are stored little-endian so traces are portable between hosts.
pub trait TraceValue: Sized {
    /// How replayed values are compared.
    const COMPARISON: Comparison = Comparison::Exact;

    /// Encode the value.
    fn to_payload(&self) -> Payload;

    /// Decode a value, or `None` if `bytes` has the wrong length.
    fn from_bytes(bytes: &[u8]) -> Option<Self>;
}

macro_rules! impl_trace_value_le {
    ($($ty:ty => $cmp:expr),+ $(,)?) => {
        $(
            impl TraceValue for $ty {
                const COMPARISON: Comparison = $cmp;

                fn to_payload(&self) -> Payload {
                    Payload::from_slice(&self.to_le_bytes())
                }

                fn from_bytes(bytes: &[u8]) -> Option<Self> {
                    bytes.try_into().ok().map(<$ty>::from_le_bytes)
                }
            }
        )+
    };
}

impl_trace_value_le! {
    i8 => Comparison::Exact,
    u8 => Comparison::Exact,
    i16 => Comparison::Exact,
    u16 => Comparison::Exact,
    i32 => Comparison::Exact,
    u32 => Comparison::Exact,
    i64 => Comparison::Exact,
    u64 => Comparison::Exact,
    f32 => Comparison::Float,
    f64 => Comparison::Double,
}

impl TraceValue for bool {
    fn to_payload(&self) -> Payload {
        Payload::from_slice(&[u8::from(*self)])
    }

    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [b] => Some(*b != 0),
            _ => None,
        }
    }
}

/// Whether `current` matches `recorded` under `cmp`.
///
/// Inputs of different lengths never match.
pub fn values_match(cmp: Comparison, recorded: &[u8], current: &[u8]) -> bool {
    if recorded.len() != current.len() {
        return false;
    }
    match cmp {
        Comparison::Exact => recorded == current,
        Comparison::Float => match (f32::from_bytes(recorded), f32::from_bytes(current)) {
            (Some(r), Some(c)) => (r - c).abs() < FLOAT_EPSILON,
            _ => recorded == current,
        },
        Comparison::Double => match (f64::from_bytes(recorded), f64::from_bytes(current)) {
            (Some(r), Some(c)) => (r - c).abs() < DOUBLE_EPSILON,
            _ => recorded == current,
        },
    }
}

const DUMP_MAX: usize = 32;

fn hex_dump(out: &mut String, bytes: &[u8]) {
    out.push('[');
    for b in bytes.iter().take(DUMP_MAX) {
        let _ = write!(out, "{b:02X}");
    }
    if bytes.len() > DUMP_MAX {
        out.push_str("..");
    }
    out.push(']');
}

/// Human-readable description of a Track mismatch.
///
/// Floats print both values and their difference, 4- and 8-byte exact
/// values print as signed decimal plus hex, single bytes as hex, and
/// anything else as a hex dump of at most 32 bytes.
pub fn describe_mismatch(
    key: u32,
    index: u32,
    cmp: Comparison,
    recorded: &[u8],
    current: &[u8],
) -> String {
    let head = format!("tracked value mismatch (key {key}, index {index})");
    match (cmp, recorded.len()) {
        (Comparison::Float, 4) => {
            let (r, c) = (
                f32::from_bytes(recorded).unwrap_or_default(),
                f32::from_bytes(current).unwrap_or_default(),
            );
            format!("{head}: recorded {r:?}, current {c:?} (diff {:?})", (r - c).abs())
        }
        (Comparison::Double, 8) => {
            let (r, c) = (
                f64::from_bytes(recorded).unwrap_or_default(),
                f64::from_bytes(current).unwrap_or_default(),
            );
            format!("{head}: recorded {r:?}, current {c:?} (diff {:?})", (r - c).abs())
        }
        (_, 4) => {
            let (r, c) = (
                i32::from_bytes(recorded).unwrap_or_default(),
                i32::from_bytes(current).unwrap_or_default(),
            );
            format!("{head}: recorded {r} ({:#010X}), current {c} ({:#010X})", r as u32, c as u32)
        }
        (_, 8) => {
            let (r, c) = (
                i64::from_bytes(recorded).unwrap_or_default(),
                i64::from_bytes(current).unwrap_or_default(),
            );
            format!("{head}: recorded {r} ({:#018X}), current {c} ({:#018X})", r as u64, c as u64)
        }
        (_, 1) => format!(
            "{head}: recorded {:#04X}, current {:#04X}",
            recorded[0],
            current.first().copied().unwrap_or_default()
        ),
        (_, len) => {
            let mut out = format!("tracked value mismatch (key {key}, index {index}, {len} bytes): recorded ");
            hex_dump(&mut out, recorded);
            out.push_str(", current ");
            hex_dump(&mut out, current);
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_roundtrip_little_endian() {
        let p = (-2i32).to_payload();
        assert_eq!(p.as_slice(), &[0xFE, 0xFF, 0xFF, 0xFF]);
        assert_eq!(i32::from_bytes(&p), Some(-2));
        assert_eq!(i32::from_bytes(&[1, 2]), None);
        assert_eq!(u64::from_bytes(&7u64.to_le_bytes()), Some(7));
    }

    #[test]
    fn bool_is_one_byte() {
        assert_eq!(true.to_payload().as_slice(), &[1]);
        assert_eq!(bool::from_bytes(&[0]), Some(false));
        assert_eq!(bool::from_bytes(&[2]), Some(true));
        assert_eq!(bool::from_bytes(&[]), None);
    }

    #[test]
    fn float_comparison_uses_epsilon() {
        let a = 1.0f32.to_payload();
        let near = (1.0f32 + 5e-6).to_payload();
        let far = 1.001f32.to_payload();
        assert!(values_match(f32::COMPARISON, &a, &near));
        assert!(!values_match(f32::COMPARISON, &a, &far));
        assert!(!values_match(Comparison::Exact, &a, &near));
    }

    #[test]
    fn double_comparison_uses_epsilon() {
        let a = 0.1f64.to_payload();
        let near = (0.1f64 + 1e-12).to_payload();
        let far = (0.1f64 + 1e-9).to_payload();
        assert!(values_match(Comparison::Double, &a, &near));
        assert!(!values_match(Comparison::Double, &a, &far));
    }

    #[test]
    fn length_mismatch_never_matches() {
        assert!(!values_match(Comparison::Exact, &[1, 2], &[1, 2, 3]));
    }

    #[test]
    fn describe_int_shows_hex() {
        let msg = describe_mismatch(3, 1, Comparison::Exact, &(-1i32).to_le_bytes(), &5i32.to_le_bytes());
        assert_eq!(
            msg,
            "tracked value mismatch (key 3, index 1): recorded -1 (0xFFFFFFFF), current 5 (0x00000005)"
        );
    }

    #[test]
    fn describe_byte_and_dump() {
        let msg = describe_mismatch(1, 0, Comparison::Exact, &[0xAB], &[0x01]);
        assert!(msg.ends_with("recorded 0xAB, current 0x01"), "{msg}");

        let long_a = [0x11u8; 40];
        let long_b = [0x22u8; 40];
        let msg = describe_mismatch(1, 0, Comparison::Exact, &long_a, &long_b);
        assert!(msg.contains("40 bytes"), "{msg}");
        assert!(msg.contains(&format!("[{}..]", "11".repeat(32))), "{msg}");
    }

    #[test]
    fn describe_float_shows_diff() {
        let msg = describe_mismatch(2, 0, Comparison::Float, &1.5f32.to_le_bytes(), &2.0f32.to_le_bytes());
        assert!(msg.contains("recorded 1.5, current 2.0 (diff 0.5)"), "{msg}");
    }
}

//! Binary encode/decode for the trace format.
//!
//! All integers and floats are little-endian. There is no alignment
//! padding and no compression. Every body size is fixed per tag except
//! PIN/TRACK, which carry a `u32` length ahead of the payload.

use std::io::{Read, Write};

use rewind_core::{GamepadButtons, GamepadState, InputSnapshot, MouseButtons, GAMEPAD_SLOTS, KEY_COUNT};

use crate::error::TraceError;
use crate::types::*;
use crate::{FORMAT_VERSION, MAGIC, MAX_PAYLOAD};

/// Size of the file header in bytes.
pub const HEADER_SIZE: usize = 4;

/// Encoded size of one [`GamepadState`].
pub const GAMEPAD_SIZE: usize = 1 + 2 + 4 * 2 + 2;

/// Encoded size of one [`InputSnapshot`].
pub const SNAPSHOT_SIZE: usize = 2 * KEY_COUNT + 4 * 4 + 1 + GAMEPAD_SLOTS * GAMEPAD_SIZE;

/// Body size of an INPUT record.
pub const INPUT_BODY_SIZE: usize = 8 + SNAPSHOT_SIZE;

/// Body size of a SIGNAL record.
pub const SIGNAL_BODY_SIZE: usize = 8 + 4;

/// Size of the fixed part of a PIN/TRACK body (key, index, size).
pub const DATA_HEADER_SIZE: usize = 4 * 3;

// ── Primitive writers ───────────────────────────────────────────

/// Write a single byte.
pub fn write_u8(w: &mut dyn Write, v: u8) -> Result<(), TraceError> {
    w.write_all(&[v])?;
    Ok(())
}

/// Write a little-endian u16.
pub fn write_u16_le(w: &mut dyn Write, v: u16) -> Result<(), TraceError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian i16.
pub fn write_i16_le(w: &mut dyn Write, v: i16) -> Result<(), TraceError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian u32.
pub fn write_u32_le(w: &mut dyn Write, v: u32) -> Result<(), TraceError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian i32.
pub fn write_i32_le(w: &mut dyn Write, v: i32) -> Result<(), TraceError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian f64.
pub fn write_f64_le(w: &mut dyn Write, v: f64) -> Result<(), TraceError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

// ── Primitive readers ───────────────────────────────────────────

/// Read a single byte.
pub fn read_u8(r: &mut dyn Read) -> Result<u8, TraceError> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// Read a little-endian u16.
pub fn read_u16_le(r: &mut dyn Read) -> Result<u16, TraceError> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

/// Read a little-endian i16.
pub fn read_i16_le(r: &mut dyn Read) -> Result<i16, TraceError> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(i16::from_le_bytes(buf))
}

/// Read a little-endian u32.
pub fn read_u32_le(r: &mut dyn Read) -> Result<u32, TraceError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Read a little-endian i32.
pub fn read_i32_le(r: &mut dyn Read) -> Result<i32, TraceError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

/// Read a little-endian f64.
pub fn read_f64_le(r: &mut dyn Read) -> Result<f64, TraceError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(f64::from_le_bytes(buf))
}

// ── Header encode/decode ────────────────────────────────────────

/// Encode the trace header (magic, version).
pub fn encode_header(w: &mut dyn Write) -> Result<(), TraceError> {
    write_u16_le(w, MAGIC)?;
    write_u16_le(w, FORMAT_VERSION)?;
    Ok(())
}

/// Decode and validate the trace header.
///
/// Magic is checked before version so that an arbitrary file reports
/// [`TraceError::InvalidMagic`] rather than a version error.
pub fn decode_header(data: &[u8]) -> Result<(), TraceError> {
    if data.len() < HEADER_SIZE {
        return Err(TraceError::TruncatedHeader { len: data.len() });
    }
    let magic = u16::from_le_bytes([data[0], data[1]]);
    if magic != MAGIC {
        return Err(TraceError::InvalidMagic { found: magic });
    }
    let version = u16::from_le_bytes([data[2], data[3]]);
    if version != FORMAT_VERSION {
        return Err(TraceError::UnsupportedVersion { found: version });
    }
    Ok(())
}

// ── Snapshot encode/decode ──────────────────────────────────────

/// Encode an input snapshot in its fixed [`SNAPSHOT_SIZE`] layout.
pub fn encode_snapshot(w: &mut dyn Write, s: &InputSnapshot) -> Result<(), TraceError> {
    w.write_all(&s.keys)?;
    w.write_all(&s.key_repeats)?;
    write_i32_le(w, s.mouse_x)?;
    write_i32_le(w, s.mouse_y)?;
    write_i32_le(w, s.wheel_x)?;
    write_i32_le(w, s.wheel_y)?;
    write_u8(w, s.mouse_buttons.0)?;
    for pad in &s.gamepads {
        write_u8(w, u8::from(pad.connected))?;
        write_u16_le(w, pad.buttons.0)?;
        write_i16_le(w, pad.left_x)?;
        write_i16_le(w, pad.left_y)?;
        write_i16_le(w, pad.right_x)?;
        write_i16_le(w, pad.right_y)?;
        write_u8(w, pad.left_trigger)?;
        write_u8(w, pad.right_trigger)?;
    }
    Ok(())
}

/// Decode an input snapshot.
pub fn decode_snapshot(r: &mut dyn Read) -> Result<InputSnapshot, TraceError> {
    let mut snap = InputSnapshot::empty();
    r.read_exact(&mut snap.keys)?;
    r.read_exact(&mut snap.key_repeats)?;
    snap.mouse_x = read_i32_le(r)?;
    snap.mouse_y = read_i32_le(r)?;
    snap.wheel_x = read_i32_le(r)?;
    snap.wheel_y = read_i32_le(r)?;
    snap.mouse_buttons = MouseButtons(read_u8(r)?);
    for pad in snap.gamepads.iter_mut() {
        *pad = GamepadState {
            connected: read_u8(r)? != 0,
            buttons: GamepadButtons(read_u16_le(r)?),
            left_x: read_i16_le(r)?,
            left_y: read_i16_le(r)?,
            right_x: read_i16_le(r)?,
            right_y: read_i16_le(r)?,
            left_trigger: read_u8(r)?,
            right_trigger: read_u8(r)?,
        };
    }
    Ok(snap)
}

// ── Record encode/decode ────────────────────────────────────────

/// Encode one tagged record.
///
/// Rejects PIN/TRACK payloads over [`MAX_PAYLOAD`] before writing anything.
pub fn encode_record(w: &mut dyn Write, record: &Record) -> Result<(), TraceError> {
    if let Record::Pin(data) | Record::Track(data) = record {
        if data.payload.len() > MAX_PAYLOAD {
            return Err(TraceError::PayloadTooLarge {
                size: data.payload.len(),
                max: MAX_PAYLOAD,
            });
        }
    }

    write_u8(w, record.kind().tag())?;
    match record {
        Record::Input(input) => {
            write_f64_le(w, input.timestamp)?;
            encode_snapshot(w, &input.snapshot)?;
        }
        Record::Signal(signal) => {
            write_f64_le(w, signal.timestamp)?;
            write_i32_le(w, signal.signal_id)?;
        }
        Record::Pin(data) | Record::Track(data) => {
            write_u32_le(w, data.key)?;
            write_u32_le(w, data.index)?;
            write_u32_le(w, data.payload.len() as u32)?;
            w.write_all(&data.payload)?;
        }
        Record::End => {}
    }
    Ok(())
}

/// Size of the body following the tag at `data[offset]`.
///
/// `data` must start at the tag byte's containing buffer; the body is
/// assumed to start at `offset + 1`. Fails with
/// [`TraceError::TruncatedRecord`] if the body (including a PIN/TRACK
/// length prefix) does not fit in the remaining bytes.
pub fn body_len(data: &[u8], offset: usize, kind: RecordKind) -> Result<usize, TraceError> {
    let available = data.len().saturating_sub(offset + 1);
    let truncated = |needed: usize| TraceError::TruncatedRecord {
        kind,
        offset,
        needed,
        available,
    };

    let needed = match kind {
        RecordKind::Input => INPUT_BODY_SIZE,
        RecordKind::Signal => SIGNAL_BODY_SIZE,
        RecordKind::End => 0,
        RecordKind::Pin | RecordKind::Track => {
            if available < DATA_HEADER_SIZE {
                return Err(truncated(DATA_HEADER_SIZE));
            }
            let size_at = offset + 1 + 8;
            let size = u32::from_le_bytes([
                data[size_at],
                data[size_at + 1],
                data[size_at + 2],
                data[size_at + 3],
            ]) as usize;
            if size > MAX_PAYLOAD {
                return Err(TraceError::PayloadTooLarge {
                    size,
                    max: MAX_PAYLOAD,
                });
            }
            DATA_HEADER_SIZE + size
        }
    };

    if needed > available {
        return Err(truncated(needed));
    }
    Ok(needed)
}

/// Decode the body of a record whose tag has already been consumed.
pub fn decode_body(r: &mut dyn Read, kind: RecordKind) -> Result<Record, TraceError> {
    let record = match kind {
        RecordKind::Input => Record::Input(InputRecord {
            timestamp: read_f64_le(r)?,
            snapshot: decode_snapshot(r)?,
        }),
        RecordKind::Signal => Record::Signal(SignalRecord {
            timestamp: read_f64_le(r)?,
            signal_id: read_i32_le(r)?,
        }),
        RecordKind::Pin | RecordKind::Track => {
            let key = read_u32_le(r)?;
            let index = read_u32_le(r)?;
            let size = read_u32_le(r)? as usize;
            if size > MAX_PAYLOAD {
                return Err(TraceError::PayloadTooLarge {
                    size,
                    max: MAX_PAYLOAD,
                });
            }
            let mut payload = Payload::from_elem(0, size);
            r.read_exact(&mut payload)?;
            let data = DataRecord {
                key,
                index,
                payload,
            };
            if kind == RecordKind::Pin {
                Record::Pin(data)
            } else {
                Record::Track(data)
            }
        }
        RecordKind::End => Record::End,
    };
    Ok(record)
}

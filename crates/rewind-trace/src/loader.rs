//! Whole-file trace loading.
//!
//! Loading is two-pass. The first pass walks the tags, checks that every
//! body fits in the remaining bytes and counts records per kind. The second
//! pass decodes into arrays allocated at exactly those sizes. Any error in
//! the first pass aborts before a single record is decoded.

use std::fs;
use std::path::Path;

use crate::codec::{body_len, decode_body, decode_header, HEADER_SIZE};
use crate::error::TraceError;
use crate::table::DataTable;
use crate::types::{InputRecord, Record, RecordCounts, RecordKind, SignalRecord};

/// A fully decoded trace.
#[derive(Clone, Debug, Default)]
pub struct DecodedTrace {
    /// INPUT records in file (timestamp) order.
    pub inputs: Vec<InputRecord>,
    /// SIGNAL records in file (timestamp) order.
    pub signals: Vec<SignalRecord>,
    /// PIN records keyed by `(key, index)`.
    pub pins: DataTable,
    /// TRACK records keyed by `(key, index)`.
    pub tracks: DataTable,
    /// Whether the stream ended with an END record.
    pub terminated: bool,
}

impl DecodedTrace {
    /// Number of records of each kind.
    pub fn counts(&self) -> RecordCounts {
        RecordCounts {
            inputs: self.inputs.len(),
            signals: self.signals.len(),
            pins: self.pins.len(),
            tracks: self.tracks.len(),
        }
    }

    /// Timestamp of the last timed record, in seconds.
    pub fn duration(&self) -> f64 {
        let last_input = self.inputs.last().map_or(0.0, |r| r.timestamp);
        let last_signal = self.signals.last().map_or(0.0, |r| r.timestamp);
        last_input.max(last_signal)
    }
}

struct Scan {
    counts: RecordCounts,
    end: usize,
    terminated: bool,
}

fn scan(data: &[u8]) -> Result<Scan, TraceError> {
    let mut counts = RecordCounts::default();
    let mut offset = HEADER_SIZE;
    while offset < data.len() {
        let tag = data[offset];
        let kind = RecordKind::from_tag(tag).ok_or(TraceError::UnknownTag { tag, offset })?;
        if kind == RecordKind::End {
            return Ok(Scan {
                counts,
                end: offset,
                terminated: true,
            });
        }
        offset += 1 + body_len(data, offset, kind)?;
        counts.bump(kind);
    }
    Ok(Scan {
        counts,
        end: offset,
        terminated: false,
    })
}

/// Validate and decode a trace held in memory.
pub fn load_bytes(data: &[u8]) -> Result<DecodedTrace, TraceError> {
    decode_header(data)?;
    let scan = scan(data)?;

    let mut trace = DecodedTrace {
        inputs: Vec::with_capacity(scan.counts.inputs),
        signals: Vec::with_capacity(scan.counts.signals),
        pins: DataTable::with_capacity(scan.counts.pins),
        tracks: DataTable::with_capacity(scan.counts.tracks),
        terminated: scan.terminated,
    };

    let mut cursor = &data[HEADER_SIZE..scan.end];
    while let Some((&tag, rest)) = cursor.split_first() {
        cursor = rest;
        let kind = RecordKind::from_tag(tag).ok_or(TraceError::UnknownTag {
            tag,
            offset: scan.end - cursor.len() - 1,
        })?;
        match decode_body(&mut cursor, kind)? {
            Record::Input(r) => trace.inputs.push(r),
            Record::Signal(r) => trace.signals.push(r),
            Record::Pin(r) => trace.pins.push(r),
            Record::Track(r) => trace.tracks.push(r),
            Record::End => break,
        }
    }

    if !trace.terminated {
        log::warn!(
            "trace ends without an END record after {} records; accepting as truncated recording",
            scan.counts.total()
        );
    }
    Ok(trace)
}

/// Read a trace file in full and decode it.
pub fn load_file(path: impl AsRef<Path>) -> Result<DecodedTrace, TraceError> {
    let data = fs::read(path.as_ref())?;
    load_bytes(&data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DataKind, DataRecord};
    use crate::writer::TraceWriter;
    use rewind_core::{InputSnapshot, Key};

    fn sample_trace() -> Vec<u8> {
        let mut writer = TraceWriter::new(Vec::new()).unwrap();
        let mut snap = InputSnapshot::empty();
        writer.write_input(0.0, &snap).unwrap();
        snap.set_key(Key::A, true);
        writer.write_input(0.25, &snap).unwrap();
        writer.write_signal(0.5, 42).unwrap();
        writer
            .write_data(DataKind::Pin, &DataRecord::new(1, 0, &7u32.to_le_bytes()).unwrap())
            .unwrap();
        writer
            .write_data(DataKind::Track, &DataRecord::new(2, 0, &[9]).unwrap())
            .unwrap();
        writer.finish().unwrap()
    }

    #[test]
    fn decodes_every_kind() {
        let mut trace = load_bytes(&sample_trace()).unwrap();
        assert!(trace.terminated);
        assert_eq!(trace.counts().total(), 5);
        assert_eq!(trace.inputs[1].timestamp, 0.25);
        assert!(trace.inputs[1].snapshot.is_key_down(Key::A));
        assert_eq!(trace.signals[0].signal_id, 42);
        assert_eq!(trace.duration(), 0.5);
        assert_eq!(trace.pins.take(1, 0).unwrap().payload.as_slice(), &7u32.to_le_bytes());
        assert_eq!(trace.tracks.take(2, 0).unwrap().payload.as_slice(), &[9]);
    }

    #[test]
    fn bytes_after_end_are_ignored() {
        let mut data = sample_trace();
        data.extend_from_slice(&[0x77, 0x01, 0x02]);
        let trace = load_bytes(&data).unwrap();
        assert_eq!(trace.counts().total(), 5);
    }

    #[test]
    fn missing_end_is_accepted() {
        let mut data = sample_trace();
        data.pop();
        let trace = load_bytes(&data).unwrap();
        assert!(!trace.terminated);
        assert_eq!(trace.inputs.len(), 2);
    }

    #[test]
    fn unknown_tag_reports_offset() {
        let mut data = TraceWriter::new(Vec::new()).unwrap().into_inner();
        data.push(0x42);
        let err = load_bytes(&data).unwrap_err();
        assert!(matches!(err, TraceError::UnknownTag { tag: 0x42, offset: 4 }));
    }

    #[test]
    fn truncated_body_aborts() {
        let mut data = sample_trace();
        // Drop END and the last byte of the TRACK payload.
        data.truncate(data.len() - 2);
        let err = load_bytes(&data).unwrap_err();
        assert!(matches!(
            err,
            TraceError::TruncatedRecord {
                kind: RecordKind::Track,
                ..
            }
        ));
    }

    #[test]
    fn short_header_rejected() {
        assert!(matches!(
            load_bytes(&[0x52, 0x57]),
            Err(TraceError::TruncatedHeader { len: 2 })
        ));
    }

    #[test]
    fn header_only_is_empty_trace() {
        let data = TraceWriter::new(Vec::new()).unwrap().finish().unwrap();
        let trace = load_bytes(&data).unwrap();
        assert!(trace.terminated);
        assert_eq!(trace.counts().total(), 0);
        assert_eq!(trace.duration(), 0.0);
    }
}

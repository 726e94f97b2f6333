//! Trace writer.
//!
//! [`TraceWriter`] streams records to any `Write` sink. The header is
//! written immediately on construction and the END terminator by
//! [`TraceWriter::finish`].

use std::io::Write;

use rewind_core::InputSnapshot;

use crate::codec::{encode_header, encode_record, HEADER_SIZE};
use crate::error::TraceError;
use crate::types::{DataKind, DataRecord, InputRecord, Record, RecordCounts, SignalRecord};

/// Writes trace records to a byte stream.
///
/// Generic over `W: Write` so tests can use `Vec<u8>` and the recorder can
/// use `BufWriter<File>`. Each record is encoded into a scratch buffer first,
/// so a rejected record never leaves partial bytes in the sink.
///
/// # Examples
///
/// ```
/// use rewind_core::{InputSnapshot, Key};
/// use rewind_trace::{load_bytes, TraceWriter};
///
/// let mut writer = TraceWriter::new(Vec::new()).unwrap();
/// let mut snap = InputSnapshot::empty();
/// snap.set_key(Key::A, true);
/// writer.write_input(0.0, &snap).unwrap();
/// writer.write_signal(0.5, 7).unwrap();
/// let bytes = writer.finish().unwrap();
///
/// let trace = load_bytes(&bytes).unwrap();
/// assert_eq!(trace.inputs.len(), 1);
/// assert_eq!(trace.signals[0].signal_id, 7);
/// assert!(trace.terminated);
/// ```
pub struct TraceWriter<W: Write> {
    writer: W,
    scratch: Vec<u8>,
    counts: RecordCounts,
    bytes_written: u64,
}

impl<W: Write> TraceWriter<W> {
    /// Create a new trace writer, immediately writing the header.
    pub fn new(mut writer: W) -> Result<Self, TraceError> {
        encode_header(&mut writer)?;
        Ok(Self {
            writer,
            scratch: Vec::with_capacity(512),
            counts: RecordCounts::default(),
            bytes_written: HEADER_SIZE as u64,
        })
    }

    /// Append an INPUT record.
    pub fn write_input(&mut self, timestamp: f64, snapshot: &InputSnapshot) -> Result<(), TraceError> {
        self.write_record(&Record::Input(InputRecord {
            timestamp,
            snapshot: snapshot.clone(),
        }))
    }

    /// Append a SIGNAL record.
    pub fn write_signal(&mut self, timestamp: f64, signal_id: i32) -> Result<(), TraceError> {
        self.write_record(&Record::Signal(SignalRecord {
            timestamp,
            signal_id,
        }))
    }

    /// Append a PIN or TRACK record.
    pub fn write_data(&mut self, kind: DataKind, data: &DataRecord) -> Result<(), TraceError> {
        let record = match kind {
            DataKind::Pin => Record::Pin(data.clone()),
            DataKind::Track => Record::Track(data.clone()),
        };
        self.write_record(&record)
    }

    /// Append any record.
    pub fn write_record(&mut self, record: &Record) -> Result<(), TraceError> {
        self.scratch.clear();
        encode_record(&mut self.scratch, record)?;
        self.writer.write_all(&self.scratch)?;
        self.bytes_written += self.scratch.len() as u64;
        self.counts.bump(record.kind());
        Ok(())
    }

    /// Write the END terminator, flush, and return the sink.
    pub fn finish(mut self) -> Result<W, TraceError> {
        self.write_record(&Record::End)?;
        self.writer.flush()?;
        Ok(self.writer)
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> Result<(), TraceError> {
        self.writer.flush()?;
        Ok(())
    }

    /// Records written so far, per kind.
    pub fn counts(&self) -> RecordCounts {
        self.counts
    }

    /// Total bytes handed to the sink, header included.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Consume the writer without terminating the trace.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{DATA_HEADER_SIZE, INPUT_BODY_SIZE, SIGNAL_BODY_SIZE};
    use crate::types::Payload;
    use crate::MAX_PAYLOAD;

    #[test]
    fn header_written_on_construction() {
        let writer = TraceWriter::new(Vec::new()).unwrap();
        assert_eq!(writer.bytes_written(), HEADER_SIZE as u64);
        assert_eq!(writer.into_inner().len(), HEADER_SIZE);
    }

    #[test]
    fn counts_and_bytes_track_each_record() {
        let mut writer = TraceWriter::new(Vec::new()).unwrap();
        writer.write_input(0.0, &InputSnapshot::empty()).unwrap();
        writer.write_signal(0.1, 1).unwrap();
        let data = DataRecord::new(3, 0, &[1, 2, 3, 4]).unwrap();
        writer.write_data(DataKind::Pin, &data).unwrap();
        writer.write_data(DataKind::Track, &data).unwrap();

        let counts = writer.counts();
        assert_eq!(counts.inputs, 1);
        assert_eq!(counts.signals, 1);
        assert_eq!(counts.pins, 1);
        assert_eq!(counts.tracks, 1);

        let expected = HEADER_SIZE
            + 1
            + INPUT_BODY_SIZE
            + 1
            + SIGNAL_BODY_SIZE
            + 2 * (1 + DATA_HEADER_SIZE + 4);
        assert_eq!(writer.bytes_written(), expected as u64);

        let bytes = writer.finish().unwrap();
        assert_eq!(bytes.len(), expected + 1);
        assert_eq!(*bytes.last().unwrap(), 0xFF);
    }

    #[test]
    fn rejected_payload_leaves_sink_untouched() {
        let mut writer = TraceWriter::new(Vec::new()).unwrap();
        let oversized = DataRecord {
            key: 1,
            index: 0,
            payload: Payload::from_elem(0, MAX_PAYLOAD + 1),
        };
        let err = writer.write_data(DataKind::Track, &oversized).unwrap_err();
        assert!(matches!(err, TraceError::PayloadTooLarge { .. }));
        assert_eq!(writer.counts().total(), 0);
        assert_eq!(writer.into_inner().len(), HEADER_SIZE);
    }
}

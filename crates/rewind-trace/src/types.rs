//! Data types for trace records.

use std::fmt;

use rewind_core::InputSnapshot;
use smallvec::SmallVec;

use crate::MAX_PAYLOAD;

/// Inline storage for a Pin/Track payload.
///
/// Sized to [`MAX_PAYLOAD`] so decoded records never spill to the heap.
pub type Payload = SmallVec<[u8; MAX_PAYLOAD]>;

/// Tag byte identifying a record's kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RecordKind {
    /// Input snapshot.
    Input = 0x01,
    /// Sync signal marker.
    Signal = 0x02,
    /// Pinned value.
    Pin = 0x03,
    /// Tracked value.
    Track = 0x04,
    /// End of stream.
    End = 0xFF,
}

impl RecordKind {
    /// Decode a tag byte.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0x01 => Some(Self::Input),
            0x02 => Some(Self::Signal),
            0x03 => Some(Self::Pin),
            0x04 => Some(Self::Track),
            0xFF => Some(Self::End),
            _ => None,
        }
    }

    /// The tag byte written to disk.
    pub fn tag(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Input => "INPUT",
            Self::Signal => "SIGNAL",
            Self::Pin => "PIN",
            Self::Track => "TRACK",
            Self::End => "END",
        };
        f.write_str(name)
    }
}

/// Which Pin/Track stream a data record belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataKind {
    /// Values restored during replay.
    Pin,
    /// Values compared during replay.
    Track,
}

impl DataKind {
    /// The record kind used on disk.
    pub fn record_kind(self) -> RecordKind {
        match self {
            Self::Pin => RecordKind::Pin,
            Self::Track => RecordKind::Track,
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.record_kind(), f)
    }
}

/// One input snapshot and when it was captured.
#[derive(Clone, Debug, PartialEq)]
pub struct InputRecord {
    /// Seconds since the recording started.
    pub timestamp: f64,
    /// The captured input.
    pub snapshot: InputSnapshot,
}

/// A sync signal emitted by the application while recording.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SignalRecord {
    /// Seconds since the recording started.
    pub timestamp: f64,
    /// Application-chosen signal id.
    pub signal_id: i32,
}

/// A Pin or Track value.
///
/// `(key, index)` pairs the Nth call for `key` within a tick with the Nth
/// recorded entry for that key.
///
/// # Examples
///
/// ```
/// use rewind_trace::DataRecord;
///
/// let rec = DataRecord::new(7, 0, &42i32.to_le_bytes()).unwrap();
/// assert_eq!(rec.payload.len(), 4);
/// assert!(!rec.payload.spilled());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataRecord {
    /// User-chosen key.
    pub key: u32,
    /// Call ordinal for `key` within the tick.
    pub index: u32,
    /// Raw value bytes.
    pub payload: Payload,
}

impl DataRecord {
    /// Copy `bytes` into a new record, or `None` if they exceed
    /// [`MAX_PAYLOAD`].
    pub fn new(key: u32, index: u32, bytes: &[u8]) -> Option<Self> {
        if bytes.len() > MAX_PAYLOAD {
            return None;
        }
        Some(Self {
            key,
            index,
            payload: Payload::from_slice(bytes),
        })
    }
}

/// A single decoded trace record.
#[derive(Clone, Debug, PartialEq)]
pub enum Record {
    /// Input snapshot.
    Input(InputRecord),
    /// Sync signal.
    Signal(SignalRecord),
    /// Pinned value.
    Pin(DataRecord),
    /// Tracked value.
    Track(DataRecord),
    /// End of stream.
    End,
}

impl Record {
    /// The record's kind.
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Input(_) => RecordKind::Input,
            Self::Signal(_) => RecordKind::Signal,
            Self::Pin(_) => RecordKind::Pin,
            Self::Track(_) => RecordKind::Track,
            Self::End => RecordKind::End,
        }
    }
}

/// Number of records of each kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RecordCounts {
    /// INPUT records.
    pub inputs: usize,
    /// SIGNAL records.
    pub signals: usize,
    /// PIN records.
    pub pins: usize,
    /// TRACK records.
    pub tracks: usize,
}

impl RecordCounts {
    /// Bump the counter for `kind`. END is not counted.
    pub fn bump(&mut self, kind: RecordKind) {
        match kind {
            RecordKind::Input => self.inputs += 1,
            RecordKind::Signal => self.signals += 1,
            RecordKind::Pin => self.pins += 1,
            RecordKind::Track => self.tracks += 1,
            RecordKind::End => {}
        }
    }

    /// Sum over all kinds.
    pub fn total(&self) -> usize {
        self.inputs + self.signals + self.pins + self.tracks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_roundtrip() {
        for kind in [
            RecordKind::Input,
            RecordKind::Signal,
            RecordKind::Pin,
            RecordKind::Track,
            RecordKind::End,
        ] {
            assert_eq!(RecordKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(RecordKind::from_tag(0x00), None);
        assert_eq!(RecordKind::from_tag(0x05), None);
    }

    #[test]
    fn oversized_data_record_rejected() {
        assert!(DataRecord::new(1, 0, &[0u8; MAX_PAYLOAD]).is_some());
        assert!(DataRecord::new(1, 0, &[0u8; MAX_PAYLOAD + 1]).is_none());
    }

    #[test]
    fn counts_ignore_end() {
        let mut counts = RecordCounts::default();
        counts.bump(RecordKind::Input);
        counts.bump(RecordKind::Track);
        counts.bump(RecordKind::End);
        assert_eq!(counts.total(), 2);
        assert_eq!(counts.inputs, 1);
        assert_eq!(counts.tracks, 1);
    }
}

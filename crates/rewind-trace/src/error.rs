//! Error types for the trace format.

use std::fmt;
use std::io;

use crate::types::RecordKind;

/// Errors that can occur while writing or loading a trace.
#[derive(Debug)]
pub enum TraceError {
    /// An I/O error occurred during read or write.
    Io(io::Error),
    /// The file is shorter than the fixed header.
    TruncatedHeader {
        /// Number of bytes available.
        len: usize,
    },
    /// The header does not carry [`MAGIC`](crate::MAGIC).
    InvalidMagic {
        /// The value found in the file.
        found: u16,
    },
    /// The format version is not supported by this build.
    UnsupportedVersion {
        /// The version found in the file.
        found: u16,
    },
    /// A record body extends past the end of the data.
    TruncatedRecord {
        /// Kind of the record being decoded.
        kind: RecordKind,
        /// Byte offset of the record's tag.
        offset: usize,
        /// Bytes the body requires.
        needed: usize,
        /// Bytes remaining after the tag.
        available: usize,
    },
    /// A tag byte is not recognized.
    UnknownTag {
        /// The unrecognized tag.
        tag: u8,
        /// Byte offset of the tag.
        offset: usize,
    },
    /// A Pin/Track payload exceeds [`MAX_PAYLOAD`](crate::MAX_PAYLOAD).
    PayloadTooLarge {
        /// Size of the rejected payload.
        size: usize,
        /// The format's cap.
        max: usize,
    },
}

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::TruncatedHeader { len } => {
                write!(f, "trace is too small to contain a header ({len} bytes)")
            }
            Self::InvalidMagic { found } => {
                write!(
                    f,
                    "invalid magic {found:#06x} (expected {:#06x})",
                    crate::MAGIC
                )
            }
            Self::UnsupportedVersion { found } => {
                write!(f, "unsupported format version {found}")
            }
            Self::TruncatedRecord {
                kind,
                offset,
                needed,
                available,
            } => {
                write!(
                    f,
                    "truncated {kind} record at offset {offset}: \
                     needs {needed} bytes, {available} available"
                )
            }
            Self::UnknownTag { tag, offset } => {
                write!(f, "unknown tag {tag:#04x} at offset {offset}")
            }
            Self::PayloadTooLarge { size, max } => {
                write!(f, "payload of {size} bytes exceeds maximum {max}")
            }
        }
    }
}

impl std::error::Error for TraceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for TraceError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

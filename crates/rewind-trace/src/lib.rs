//! Binary trace format for Rewind input recordings.
//!
//! A trace is the file produced by a record run and consumed by a replay
//! run. It is append-only and self-delimiting so that a recorder can stream
//! it to disk one record at a time.
//!
//! # Architecture
//!
//! - [`TraceWriter`] appends records to any `Write` sink
//! - [`load_bytes`] and [`load_file`] validate and decode a whole trace
//!   into per-kind arrays ([`DecodedTrace`])
//! - [`DataTable`] pairs Pin/Track lookups with recorded entries
//! - All I/O uses a custom little-endian codec (no serde dependency)
//!
//! # Format
//!
//! ```text
//! [MAGIC u16] [VERSION u16]
//! [Tag u8][body] [Tag u8][body] ... [END 0xFF]
//! ```
//!
//! | Tag | Kind | Body |
//! |-----|------|------|
//! | `0x01` | INPUT | `f64` timestamp, input snapshot |
//! | `0x02` | SIGNAL | `f64` timestamp, `i32` signal id |
//! | `0x03` | PIN | `u32` key, `u32` index, `u32` size, payload |
//! | `0x04` | TRACK | `u32` key, `u32` index, `u32` size, payload |
//! | `0xFF` | END | none |
//!
//! Bytes after END are not part of the trace.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod error;
pub mod loader;
pub mod metrics;
pub mod table;
pub mod types;
pub mod writer;

pub use error::TraceError;
pub use loader::{load_bytes, load_file, DecodedTrace};
pub use metrics::TraceMetrics;
pub use table::DataTable;
pub use types::{
    DataKind, DataRecord, InputRecord, Payload, Record, RecordCounts, RecordKind, SignalRecord,
};
pub use writer::TraceWriter;

/// Magic number at the start of every trace (`b"RW"` on disk).
pub const MAGIC: u16 = 0x5752;

/// Current binary format version.
pub const FORMAT_VERSION: u16 = 1;

/// Largest Pin/Track payload, in bytes.
pub const MAX_PAYLOAD: usize = 256;

//! Rewind: deterministic input record/replay for game testing.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! Rewind sub-crates. For most users, adding `rewind` as a single dependency
//! is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use rewind::prelude::*;
//!
//! // The host adapter: read device state, push synthetic state back.
//! struct Host;
//! impl Platform for Host {
//!     fn capture_input(&self) -> InputSnapshot {
//!         let mut snap = InputSnapshot::empty();
//!         snap.set_key(Key::Space, true);
//!         snap
//!     }
//!     fn inject_input(&self, _new: &InputSnapshot, _prev: &InputSnapshot) {}
//! }
//!
//! let dir = tempfile::tempdir().unwrap();
//! let path = dir.path().join("jump.trace");
//!
//! // Record a few ticks, pinning the RNG seed and tracking the score.
//! let session = Session::new();
//! session.init(SessionConfig::record(&path, Arc::new(Host))).unwrap();
//! let mut seed = 1234u32;
//! for score in 0..3 {
//!     session.update();
//!     session.pin_uint(0, &mut seed);
//!     session.track_int(1, score);
//! }
//! session.sync_signal_str("level_done");
//! let report = session.quit().unwrap();
//! assert!(report.passed());
//!
//! let trace = rewind::trace::load_file(&path).unwrap();
//! assert_eq!(trace.inputs.len(), 1);
//! assert_eq!(trace.pins.len(), 3);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `rewind-core` | Input snapshots, capability traits, call sites |
//! | [`trace`] | `rewind-trace` | Binary trace format, writer, loader, metrics |
//! | [`engine`] | `rewind-engine` | Session, recorder, replayer, Pin/Track, assertions |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Input snapshots and capability traits (`rewind-core`).
///
/// A host implements [`types::Platform`] to capture and inject input, and
/// optionally [`types::Clock`] to control time.
pub use rewind_core as types;

/// Binary trace format (`rewind-trace`).
///
/// Write traces with [`trace::TraceWriter`], decode them with
/// [`trace::load_file`], and summarise them with [`trace::TraceMetrics`].
pub use rewind_trace as trace;

/// Session engine (`rewind-engine`).
///
/// [`engine::Session`] drives recording and replay; its configuration lives
/// in [`engine::SessionConfig`].
pub use rewind_engine as engine;

/// Common imports for typical Rewind usage.
///
/// ```rust
/// use rewind::prelude::*;
/// ```
///
/// This imports the session and its configuration, the capability traits,
/// input types, and the error types.
pub mod prelude {
    // Input and capabilities
    pub use rewind_core::{CallSite, Clock, InputSnapshot, Key, MonotonicClock, Platform};

    // Session
    pub use rewind_engine::{
        FailedAssertion, Mode, ReplayDriver, Session, SessionConfig, SessionReport, TraceValue,
    };

    // Errors
    pub use rewind_engine::{ConfigError, SessionError};
    pub use rewind_trace::TraceError;
}

//! Record/replay session engine for Rewind.
//!
//! A [`Session`] records every tick's input to a trace, or replays a trace
//! by re-injecting its input at the recorded relative times. Sync signals
//! gate replay across events whose duration varies between runs, and
//! Pin/Track calls capture or check state that input alone does not
//! determine.
//!
//! # Architecture
//!
//! - [`session`]: lifecycle, per-tick driver, the single state lock
//! - [`recorder`] / [`replay`]: the two sides of the trace
//! - [`assertion`]: failure accumulation and the fail threshold
//! - [`pin`] / [`track`] with [`value`]: typed state capture
//! - a background injector thread for
//!   [`ReplayDriver::Background`](config::ReplayDriver::Background)
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use rewind_core::{InputSnapshot, Platform};
//! use rewind_engine::{Mode, Session, SessionConfig};
//!
//! struct Host;
//! impl Platform for Host {
//!     fn capture_input(&self) -> InputSnapshot { InputSnapshot::empty() }
//!     fn inject_input(&self, _new: &InputSnapshot, _prev: &InputSnapshot) {}
//! }
//!
//! let args: Vec<String> = std::env::args().collect();
//! let mode = Mode::from_args(&args).unwrap().unwrap_or_default();
//! let mut config = SessionConfig::record("tests/menu.trace", Arc::new(Host));
//! config.mode = mode;
//!
//! let session = Session::new();
//! session.init(config).unwrap();
//! for _ in 0..600 {
//!     session.update();
//!     // ... game tick ...
//! }
//! session.quit();
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod assertion;
pub mod config;
pub mod error;
mod injector_thread;
pub mod key_counter;
pub mod pin;
pub mod recorder;
pub mod replay;
pub mod report;
pub mod session;
pub mod track;
pub mod value;

pub use assertion::{FailedAssertion, MAX_FAILED_ASSERTIONS, MAX_UNIQUE_ASSERTION_SITES};
pub use config::{
    trace_path_from_args, AssertionCallback, ConfigError, DirectoryMapping, FailCallback, Mode,
    ReplayDriver, SessionConfig, SignalCallback, DEFAULT_POLL_INTERVAL,
};
pub use error::SessionError;
pub use replay::BATCH_CAP;
pub use report::SessionReport;
pub use session::Session;
pub use value::{Comparison, TraceValue, DOUBLE_EPSILON, FLOAT_EPSILON};

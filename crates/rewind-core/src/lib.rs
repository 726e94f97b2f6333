//! Core input types and capability traits for the Rewind record/replay
//! framework.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! per-tick [`InputSnapshot`] that the trace format persists, the two
//! capability traits a platform adapter implements ([`Platform`] and
//! [`Clock`]), and call-site identification used by assertions and
//! sync signals.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod input;
pub mod site;
pub mod traits;

pub use input::{
    GamepadButtons, GamepadState, InputSnapshot, Key, KeyChange, MouseButtons, GAMEPAD_SLOTS,
    KEY_COUNT, KEY_DOWN,
};
pub use site::{hash_str, CallSite};
pub use traits::{Clock, MonotonicClock, Platform};

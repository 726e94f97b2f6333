//! Benchmark profiles and utilities for the Rewind record/replay framework.
//!
//! Provides deterministic synthetic traces for benchmarking and examples:
//!
//! - [`input_profile`]: a scripted stream of per-tick input snapshots
//! - [`encode_profile`]: a complete encoded trace built from that stream
//! - [`reference_trace`]: one minute of play at 60 Hz

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rewind_core::{InputSnapshot, Key, MouseButtons};
use rewind_trace::{DataKind, DataRecord, TraceError, TraceWriter};

/// Logical tick length of every profile (60 Hz).
pub const TICK: f64 = 1.0 / 60.0;

/// Ticks between sync signals in [`encode_profile`].
pub const SIGNAL_EVERY: usize = 120;

const MOVEMENT: [Key; 4] = [Key::W, Key::A, Key::S, Key::D];

/// Generate `ticks` deterministic input snapshots.
///
/// Movement keys change every few ticks, the mouse drifts, and the left
/// button toggles, so roughly a third of consecutive snapshots differ.
pub fn input_profile(ticks: usize, seed: u64) -> Vec<InputSnapshot> {
    let mut state = seed;
    let mut snap = InputSnapshot::empty();
    let mut out = Vec::with_capacity(ticks);

    for tick in 0..ticks {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let roll = (state >> 33) as usize;

        if roll % 3 == 0 {
            let key = MOVEMENT[roll % MOVEMENT.len()];
            let down = snap.is_key_down(key);
            snap.set_key(key, !down);
        }
        if roll % 7 == 0 {
            snap.mouse_x = (tick % 1920) as i32;
            snap.mouse_y = ((tick * 3) % 1080) as i32;
        }
        if roll % 11 == 0 {
            snap.mouse_buttons = MouseButtons(snap.mouse_buttons.0 ^ MouseButtons::LEFT.0);
        }
        out.push(snap.clone());
    }

    out
}

/// Encode a trace of `ticks` ticks into memory.
///
/// Identical consecutive snapshots are written once, as the recorder does.
/// Every tick carries one Pin (`key 0`, a frame seed) and one Track
/// (`key 1`, a score); a signal is emitted every [`SIGNAL_EVERY`] ticks.
pub fn encode_profile(ticks: usize, seed: u64) -> Result<Vec<u8>, TraceError> {
    let snapshots = input_profile(ticks, seed);
    let mut writer = TraceWriter::new(Vec::with_capacity(ticks * 64))?;
    let mut last: Option<&InputSnapshot> = None;

    for (tick, snap) in snapshots.iter().enumerate() {
        let t = tick as f64 * TICK;
        if last != Some(snap) {
            writer.write_input(t, snap)?;
            last = Some(snap);
        }
        if tick > 0 && tick % SIGNAL_EVERY == 0 {
            writer.write_signal(t, (tick / SIGNAL_EVERY) as i32)?;
        }
        let frame_seed = (seed ^ tick as u64).to_le_bytes();
        if let Some(pin) = DataRecord::new(0, 0, &frame_seed) {
            writer.write_data(DataKind::Pin, &pin)?;
        }
        if let Some(track) = DataRecord::new(1, 0, &(tick as i32).to_le_bytes()) {
            writer.write_data(DataKind::Track, &track)?;
        }
    }

    writer.finish()
}

/// One minute of play at 60 Hz, seed 42.
pub fn reference_trace() -> Result<Vec<u8>, TraceError> {
    encode_profile(3600, 42)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rewind_trace::load_bytes;

    #[test]
    fn input_profile_deterministic() {
        assert_eq!(input_profile(500, 7), input_profile(500, 7));
        assert_ne!(input_profile(500, 7), input_profile(500, 8));
    }

    #[test]
    fn input_profile_changes_over_time() {
        let snaps = input_profile(600, 42);
        let changes = snaps.windows(2).filter(|w| w[0] != w[1]).count();
        assert!(changes > 50, "only {changes} changes");
        assert!(changes < 599);
    }

    #[test]
    fn reference_trace_loads() {
        let bytes = reference_trace().unwrap();
        let trace = load_bytes(&bytes).unwrap();
        assert!(trace.terminated);
        assert_eq!(trace.signals.len(), 3599 / SIGNAL_EVERY);
        assert_eq!(trace.pins.len(), 3600);
        assert_eq!(trace.tracks.len(), 3600);
        assert!(trace.inputs.len() < 3600);
    }
}

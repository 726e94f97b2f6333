//! End-to-end record → replay example.
//!
//! Demonstrates: record a scripted session → replay it with a slower load
//! screen → compare the injected input and tracked state.

use std::sync::Arc;

use rewind_bench::{input_profile, TICK};
use rewind_engine::{ReplayDriver, Session, SessionConfig};
use rewind_test_utils::{ManualClock, ScriptedPlatform};

const TICKS: usize = 600;
const LOAD_AT: usize = 300;

fn run(session: &Session, clock: &ManualClock, load_time: f64) {
    let mut score = 0i32;
    let mut seed = 0xBEEFu32;
    for tick in 0..TICKS {
        if tick == LOAD_AT {
            clock.advance(load_time);
            session.sync_signal_str("level_loaded");
        }
        session.update();
        session.pin_uint(0, &mut seed);
        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        score += (seed >> 28) as i32;
        session.track_int(1, score);
        clock.advance(TICK);
    }
}

fn main() {
    println!("=== Rewind Record/Replay Example ===\n");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("example.trace");
    let script = input_profile(TICKS, 42);

    // --- Record ---
    let clock = Arc::new(ManualClock::new(0.0));
    let platform = Arc::new(ScriptedPlatform::with_script(script.clone()));
    let mut config = SessionConfig::record(&path, platform);
    config.clock = Some(clock.clone());

    let session = Session::new();
    session.init(config).unwrap();
    run(&session, &clock, 0.5);
    let recorded = session.quit().unwrap();
    println!("{recorded}");

    let trace = rewind_trace::load_file(&path).unwrap();
    let size = std::fs::metadata(&path).map(|m| m.len()).ok();
    println!(
        "trace: {}\n",
        rewind_trace::TraceMetrics::from_decoded(&trace, size)
    );

    // --- Replay with a load screen twice as slow ---
    let clock = Arc::new(ManualClock::new(1000.0));
    let platform = Arc::new(ScriptedPlatform::new());
    let mut config = SessionConfig::replay(&path, platform.clone());
    config.clock = Some(clock.clone());
    config.replay_driver = ReplayDriver::Tick;
    config.on_fail = Some(Arc::new(|| println!("replay diverged")));

    let session = Session::new();
    session.init(config).unwrap();
    run(&session, &clock, 1.0);
    let replayed = session.quit().unwrap();
    println!("{replayed}");

    let mut expected = script;
    expected.dedup();
    let injected: Vec<_> = platform
        .injections()
        .into_iter()
        .map(|(new, _)| new)
        .collect();
    println!(
        "recorded {} distinct inputs, replay injected {} ({})",
        expected.len(),
        injected.len(),
        if injected == expected { "identical" } else { "different" }
    );
}

//! Property tests for the replay clock and assertion threshold.

use proptest::prelude::*;
use rewind_core::{CallSite, InputSnapshot, Key};
use rewind_engine::assertion::{AssertionLog, Verdict};
use rewind_engine::replay::{Replayer, SignalOutcome};
use rewind_trace::{load_bytes, TraceWriter};

fn snapshot(key_index: usize) -> InputSnapshot {
    let mut snap = InputSnapshot::empty();
    snap.set_key(Key::ALL[key_index], true);
    snap
}

fn site() -> CallSite {
    CallSite {
        file: "tests/replay_properties.rs",
        line: 1,
        column: 1,
    }
}

/// Strictly increasing millisecond timestamps paired with key indices,
/// with no two consecutive snapshots equal.
fn arb_script() -> impl Strategy<Value = Vec<(u32, usize)>> {
    prop::collection::vec((1u32..500, 1usize..Key::ALL.len()), 1..40).prop_map(|steps| {
        let mut at = 0u32;
        let mut out: Vec<(u32, usize)> = Vec::new();
        for (gap, key) in steps {
            if out.last().is_some_and(|&(_, k)| k == key) {
                continue;
            }
            at += gap;
            out.push((at, key));
        }
        out
    })
}

proptest! {
    #[test]
    fn replay_reproduces_every_recorded_delta(script in arb_script()) {
        let mut writer = TraceWriter::new(Vec::new()).unwrap();
        for &(ms, key) in &script {
            writer.write_input(f64::from(ms) / 1000.0, &snapshot(key)).unwrap();
        }
        let trace = load_bytes(&writer.finish().unwrap()).unwrap();

        let mut replayer = Replayer::new(trace, 0.0);
        let mut prev = InputSnapshot::empty();
        for &(ms, key) in &script {
            let t = f64::from(ms) / 1000.0;
            let injection = replayer.poll(t);
            prop_assert!(injection.is_some(), "nothing injected at {}", t);
            let injection = injection.unwrap();
            prop_assert_eq!(&injection.new, &snapshot(key));
            prop_assert_eq!(&injection.prev, &prev);
            prev = injection.new;
        }
        prop_assert!(replayer.is_finished());
    }

    #[test]
    fn late_signal_lands_on_recorded_time(t_ms in 1u32..10_000, drift_ms in 0u32..5_000) {
        let t = f64::from(t_ms) / 1000.0;
        let mut writer = TraceWriter::new(Vec::new()).unwrap();
        writer.write_signal(t, 99).unwrap();
        let trace = load_bytes(&writer.finish().unwrap()).unwrap();

        let mut replayer = Replayer::new(trace, 0.0);
        prop_assert!(replayer.poll(t).is_none());
        prop_assert_eq!(replayer.waiting_signal(), Some(99));

        let now = t + f64::from(drift_ms) / 1000.0;
        let outcome = replayer.sync_signal(99, now);
        let late = matches!(outcome, SignalOutcome::Matched { late: true, .. });
        prop_assert!(late, "unexpected outcome {:?}", outcome);
        prop_assert!((replayer.replay_time(now) - t).abs() < 1e-9);
        prop_assert!(!replayer.is_waiting());
    }

    #[test]
    fn early_signal_lands_on_recorded_time(t_ms in 1u32..10_000, lead in 0.0f64..1.0) {
        let t = f64::from(t_ms) / 1000.0;
        let mut writer = TraceWriter::new(Vec::new()).unwrap();
        writer.write_signal(t, 5).unwrap();
        let trace = load_bytes(&writer.finish().unwrap()).unwrap();

        let mut replayer = Replayer::new(trace, 0.0);
        let now = t * lead;
        let outcome = replayer.sync_signal(5, now);
        let early = matches!(outcome, SignalOutcome::Matched { late: false, .. });
        prop_assert!(early, "unexpected outcome {:?}", outcome);
        prop_assert!((replayer.replay_time(now) - t).abs() < 1e-9);
    }

    #[test]
    fn mismatched_signal_changes_nothing(expected in any::<i32>(), other in any::<i32>()) {
        prop_assume!(expected != other);
        let mut writer = TraceWriter::new(Vec::new()).unwrap();
        writer.write_signal(0.5, expected).unwrap();
        let trace = load_bytes(&writer.finish().unwrap()).unwrap();

        let mut replayer = Replayer::new(trace, 0.0);
        replayer.poll(1.0);
        prop_assert_eq!(
            replayer.sync_signal(other, 2.0),
            SignalOutcome::Mismatch { expected }
        );
        prop_assert_eq!(replayer.waiting_signal(), Some(expected));
        prop_assert_eq!(replayer.offset(), 0.0);
    }

    #[test]
    fn threshold_is_reached_exactly_at_the_nth_failure(threshold in 0u32..10, failures in 0u32..20) {
        let mut log = AssertionLog::new(threshold);
        let mut first_reached = None;
        for n in 1..=failures {
            if let Verdict::Failed { threshold_reached: true, .. } = log.evaluate(false, "x", site()) {
                first_reached.get_or_insert(n);
            }
        }
        let effective = threshold.max(1);
        if failures >= effective {
            prop_assert_eq!(first_reached, Some(effective));
        } else {
            prop_assert_eq!(first_reached, None);
        }
        prop_assert_eq!(log.fire_count(), failures);
    }
}

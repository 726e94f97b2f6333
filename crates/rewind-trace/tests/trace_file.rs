//! Trace format integration tests: writer → disk/memory → loader.

use std::io::BufWriter;

use proptest::prelude::*;
use rewind_core::{GamepadButtons, GamepadState, InputSnapshot, MouseButtons, KEY_COUNT, KEY_DOWN};
use rewind_trace::{
    load_bytes, load_file, DataKind, DataRecord, Record, TraceError, TraceMetrics, TraceWriter,
    MAX_PAYLOAD,
};

// ── Strategies ──────────────────────────────────────────────────

fn arb_gamepad() -> impl Strategy<Value = GamepadState> {
    (
        any::<bool>(),
        any::<u16>(),
        any::<[i16; 4]>(),
        any::<u8>(),
        any::<u8>(),
    )
        .prop_map(|(connected, buttons, axes, lt, rt)| GamepadState {
            connected,
            buttons: GamepadButtons(buttons),
            left_x: axes[0],
            left_y: axes[1],
            right_x: axes[2],
            right_y: axes[3],
            left_trigger: lt,
            right_trigger: rt,
        })
}

fn arb_snapshot() -> impl Strategy<Value = InputSnapshot> {
    (
        prop::collection::vec((0..KEY_COUNT, any::<u8>()), 0..8),
        any::<[i32; 4]>(),
        0u8..32,
        prop::collection::vec(arb_gamepad(), 4),
    )
        .prop_map(|(held, mouse, buttons, pads)| {
            let mut snap = InputSnapshot::empty();
            for (index, repeats) in held {
                snap.keys[index] = KEY_DOWN;
                snap.key_repeats[index] = repeats;
            }
            snap.mouse_x = mouse[0];
            snap.mouse_y = mouse[1];
            snap.wheel_x = mouse[2];
            snap.wheel_y = mouse[3];
            snap.mouse_buttons = MouseButtons(buttons);
            snap.gamepads.copy_from_slice(&pads);
            snap
        })
}

fn arb_data() -> impl Strategy<Value = DataRecord> {
    (
        any::<u32>(),
        0u32..8,
        prop::collection::vec(any::<u8>(), 0..=MAX_PAYLOAD),
    )
        .prop_map(|(key, index, bytes)| DataRecord::new(key, index, &bytes).unwrap())
}

fn arb_record() -> impl Strategy<Value = Record> {
    prop_oneof![
        (0.0f64..1e6, arb_snapshot()).prop_map(|(timestamp, snapshot)| {
            Record::Input(rewind_trace::InputRecord {
                timestamp,
                snapshot,
            })
        }),
        (0.0f64..1e6, any::<i32>()).prop_map(|(timestamp, signal_id)| {
            Record::Signal(rewind_trace::SignalRecord {
                timestamp,
                signal_id,
            })
        }),
        arb_data().prop_map(Record::Pin),
        arb_data().prop_map(Record::Track),
    ]
}

fn encode_all(records: &[Record]) -> Vec<u8> {
    let mut writer = TraceWriter::new(Vec::new()).unwrap();
    for record in records {
        writer.write_record(record).unwrap();
    }
    writer.finish().unwrap()
}

// ── Properties ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn loaded_arrays_preserve_file_order(records in prop::collection::vec(arb_record(), 0..24)) {
        let bytes = encode_all(&records);
        let mut trace = load_bytes(&bytes).unwrap();

        let inputs: Vec<_> = records.iter().filter_map(|r| match r {
            Record::Input(i) => Some(i.clone()),
            _ => None,
        }).collect();
        let signals: Vec<_> = records.iter().filter_map(|r| match r {
            Record::Signal(s) => Some(*s),
            _ => None,
        }).collect();
        prop_assert_eq!(&trace.inputs, &inputs);
        prop_assert_eq!(&trace.signals, &signals);

        for record in &records {
            match record {
                Record::Pin(d) => prop_assert_eq!(trace.pins.take(d.key, d.index), Some(d)),
                Record::Track(d) => prop_assert_eq!(trace.tracks.take(d.key, d.index), Some(d)),
                _ => {}
            }
        }
        prop_assert_eq!(trace.pins.remaining(), 0);
        prop_assert_eq!(trace.tracks.remaining(), 0);
    }

    #[test]
    fn every_strict_prefix_is_rejected_or_unterminated(
        records in prop::collection::vec(arb_record(), 1..6),
        cut in any::<prop::sample::Index>(),
    ) {
        let bytes = encode_all(&records);
        let len = cut.index(bytes.len());
        match load_bytes(&bytes[..len]) {
            Ok(trace) => prop_assert!(!trace.terminated),
            Err(TraceError::TruncatedHeader { .. }) | Err(TraceError::TruncatedRecord { .. }) => {}
            Err(other) => prop_assert!(false, "unexpected error: {other}"),
        }
    }
}

// ── Files ───────────────────────────────────────────────────────

#[test]
fn file_roundtrip_with_metrics() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.trace");

    let file = std::fs::File::create(&path).unwrap();
    let mut writer = TraceWriter::new(BufWriter::new(file)).unwrap();
    let mut snap = InputSnapshot::empty();
    for i in 0..4 {
        snap.mouse_x = i * 10;
        writer.write_input(f64::from(i) * 0.5, &snap).unwrap();
    }
    writer
        .write_data(DataKind::Pin, &DataRecord::new(1, 0, &[1, 2]).unwrap())
        .unwrap();
    let written = writer.bytes_written() + 1;
    writer.finish().unwrap();

    let size = std::fs::metadata(&path).unwrap().len();
    assert_eq!(size, written);

    let trace = load_file(&path).unwrap();
    let metrics = TraceMetrics::from_decoded(&trace, Some(size));
    assert_eq!(metrics.counts.inputs, 4);
    assert_eq!(metrics.counts.pins, 1);
    assert_eq!(metrics.duration, 1.5);
    assert!((metrics.input_density() - 4.0 / 1.5).abs() < 1e-12);
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_file(dir.path().join("absent.trace")).unwrap_err();
    assert!(matches!(err, TraceError::Io(_)));
}

#[test]
fn foreign_file_is_invalid_magic() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, b"hello world").unwrap();
    assert!(matches!(
        load_file(&path),
        Err(TraceError::InvalidMagic { .. })
    ));
}

//! Criterion benchmarks for the replay side: injector polling, signal
//! matching, and Pin/Track lookups.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use rewind_bench::{reference_trace, SIGNAL_EVERY, TICK};
use rewind_engine::replay::Replayer;
use rewind_trace::{load_bytes, DecodedTrace};

fn decoded() -> DecodedTrace {
    load_bytes(&reference_trace().unwrap()).unwrap()
}

/// Benchmark: Drive a full minute of replay at 60 Hz, answering every
/// signal as soon as replay gates on it.
fn bench_replay_minute(c: &mut Criterion) {
    let trace = decoded();

    c.bench_function("replay_minute_60hz", |b| {
        b.iter_batched(
            || Replayer::new(trace.clone(), 0.0),
            |mut replayer| {
                let mut injections = 0usize;
                for tick in 0..3600 {
                    let now = tick as f64 * TICK;
                    if let Some(id) = replayer.waiting_signal() {
                        replayer.sync_signal(id, now);
                    }
                    if replayer.poll(now).is_some() {
                        injections += 1;
                    }
                }
                black_box(injections)
            },
            criterion::BatchSize::LargeInput,
        );
    });
}

/// Benchmark: Catch up after a long stall; every remaining event is due at
/// once and drains in batch-capped polls.
fn bench_replay_catch_up(c: &mut Criterion) {
    let mut trace = decoded();
    trace.signals.clear();

    c.bench_function("replay_catch_up", |b| {
        b.iter_batched(
            || Replayer::new(trace.clone(), 0.0),
            |mut replayer| {
                while !replayer.is_finished() {
                    black_box(replayer.poll(1_000.0));
                }
            },
            criterion::BatchSize::LargeInput,
        );
    });
}

/// Benchmark: One Pin and one Track lookup per tick for a minute.
fn bench_data_lookups(c: &mut Criterion) {
    let trace = decoded();
    let ticks = trace.pins.len() as u32;
    let signals = (ticks as usize - 1) / SIGNAL_EVERY;
    assert_eq!(trace.signals.len(), signals);

    c.bench_function("pin_track_lookup_minute", |b| {
        b.iter_batched(
            || (trace.pins.clone(), trace.tracks.clone()),
            |(mut pins, mut tracks)| {
                for _ in 0..ticks {
                    black_box(pins.take(0, 0));
                    black_box(tracks.take(1, 0));
                }
            },
            criterion::BatchSize::LargeInput,
        );
    });
}

criterion_group!(
    benches,
    bench_replay_minute,
    bench_replay_catch_up,
    bench_data_lookups
);
criterion_main!(benches);

//! Benchmarks for the per-batch work of a session
//!
//! Measures what the session task does for every tick batch:
//! - Event detection across a full grid of drivers
//! - Ranking sort and overlay for the same grid
//!
//! Platform: Cross-platform (synthetic ticks, CI-safe)

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use racecall::test_utils::TickBuilder;
use racecall::{
    DriverId, DriverMeta, DriverTick, EventDetector, RaceMode, RankingOrder, RankingOverlay,
    SessionOptions,
};
use std::hint::black_box;

/// `laps` batches for `drivers` cars, every car crossing once per batch.
fn race_batches(drivers: usize, laps: u32) -> Vec<Vec<DriverTick>> {
    (0..laps)
        .map(|lap| {
            (0..drivers)
                .map(|slot| {
                    let lap_ms = 9_000 + (slot as u64 * 37 + lap as u64 * 53) % 800;
                    TickBuilder::new(DriverId(slot))
                        .laps(lap)
                        .time(lap as u64 * 10_000 + slot as u64 * 90)
                        .best_lap(lap_ms)
                        .sector(1, lap_ms / 3)
                        .fuel(15u8.saturating_sub((lap / 4) as u8))
                        .pit(lap % 17 == 16)
                        .build()
                })
                .collect()
        })
        .collect()
}

fn bench_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("event_detection");

    for drivers in [2, 6, 8] {
        let batches = race_batches(drivers, 50);
        group.bench_with_input(BenchmarkId::new("race", drivers), &batches, |b, batches| {
            b.iter(|| {
                let mut detector = EventDetector::new(Some(50));
                let mut events = 0;
                for batch in batches {
                    events += detector.on_ticks(black_box(batch)).len();
                }
                black_box(events)
            })
        });
    }

    group.finish();
}

fn bench_ranking(c: &mut Criterion) {
    let mut group = c.benchmark_group("ranking");
    let roster: Vec<_> = (0..8).map(|slot| DriverMeta::anonymous(DriverId(slot))).collect();

    for mode in [RaceMode::Practice, RaceMode::Race] {
        let order = RankingOrder::for_options(&SessionOptions { mode, ..SessionOptions::default() });
        let batches = race_batches(8, 50);
        group.bench_with_input(BenchmarkId::new("sort_and_overlay", order.name()), &batches, |b, batches| {
            b.iter(|| {
                let mut overlay = RankingOverlay::new(mode);
                for batch in batches {
                    let mut snapshot = batch.clone();
                    order.sort(&mut snapshot);
                    black_box(overlay.apply(&snapshot, &roster));
                }
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_detection, bench_ranking);
criterion_main!(benches);

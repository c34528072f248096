//! Performance benchmarks for pathfinding and terrain synthesis.
//!
//! Run with: cargo bench
//!
//! This will generate HTML reports in target/criterion/

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::collections::HashSet;
use tactica::{
    generation::utils, Generator, GridCoordinate, PathPlanner, SynthesisConfig, WfcSynthesizer,
};

fn open_field(size: i32) -> HashSet<GridCoordinate> {
    (0..size)
        .flat_map(|y| (0..size).map(move |x| GridCoordinate::new(x, y)))
        .collect()
}

fn bench_find_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_path");
    let planner = PathPlanner::new();

    for size in [10, 32, 64].iter() {
        let admissible = open_field(*size);
        let goal = GridCoordinate::new(size - 1, size - 1);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let path = planner.find_path(
                    black_box(GridCoordinate::new(0, 0)),
                    black_box(goal),
                    &admissible,
                    &(),
                );
                black_box(path)
            });
        });
    }

    group.finish();
}

fn bench_synthesis(c: &mut Criterion) {
    let mut group = c.benchmark_group("wfc_synthesis");
    let synthesizer = WfcSynthesizer::new();

    for size in [10usize, 20].iter() {
        let config = SynthesisConfig::new(7)
            .with_output_size(*size, *size)
            .with_max_attempts(20);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let mut rng = utils::create_rng(&config);
                black_box(synthesizer.generate(black_box(&config), &mut rng).ok())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_find_path, bench_synthesis);
criterion_main!(benches);

//! Benchmarks for folding worker results into an accumulator

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sim_tally::prelude::*;

/// Generate voxel data with a smooth pattern
fn generate_voxels(len: usize, worker: usize) -> Vec<f64> {
    (0..len)
        .map(|i| ((i + worker) as f64 * 0.01).sin().abs() * 10.0)
        .collect()
}

fn generate_image(edge: usize, worker: usize) -> Image3D {
    let size = [edge, edge, edge];
    Image3D::new(size, [1.0; 3], generate_voxels(edge * edge * edge, worker)).unwrap()
}

/// Benchmark in-place array merges
fn bench_array_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("array_merge");

    for &len in &[1_000usize, 100_000, 1_000_000] {
        let acc = DataItem::with_data(ArrayData::from_vec(generate_voxels(len, 0)));
        let other = DataItem::with_data(ArrayData::from_vec(generate_voxels(len, 1)));

        group.bench_with_input(BenchmarkId::new("in_place", len), &other, |b, other| {
            let mut acc = acc.clone();
            b.iter(|| acc.merge_in_place(black_box(other)).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("fresh", len), &other, |b, other| {
            b.iter(|| black_box(acc.merge(black_box(other)).unwrap()));
        });
    }

    group.finish();
}

/// Benchmark folding a quotient-image composite over several workers
fn bench_quotient_fold(c: &mut Criterion) {
    let mut group = c.benchmark_group("quotient_fold");

    for &edge in &[16usize, 64] {
        let workers: Vec<CompositeItem> = (0..8)
            .map(|w| {
                CompositeItem::quotient_image(generate_image(edge, w), generate_image(edge, w + 1))
            })
            .collect();

        group.bench_with_input(BenchmarkId::new("merge_all", edge), &workers, |b, workers| {
            b.iter(|| black_box(merge_all(workers.iter().cloned()).unwrap()));
        });

        let merged = merge_all(workers.iter().cloned()).unwrap().unwrap();
        group.bench_with_input(BenchmarkId::new("quotient", edge), &merged, |b, merged| {
            b.iter(|| black_box(merged.quotient().unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_array_merge, bench_quotient_fold);
criterion_main!(benches);

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use pos2_plotter::radix::radix_sort_by_key;
use pos2_plotter::table::{build_table1, build_table2};
use pos2_primitives::hash::ProofHashing;
use pos2_primitives::params::ProofParams;
use std::hint::black_box;

const K: u32 = 16;
const STRENGTH: u8 = 6;

fn test_plot_id() -> [u8; 32] {
    let mut plot_id = [0u8; 32];
    for (i, b) in plot_id.iter_mut().enumerate() {
        *b = ((i as u32) * 37 + 11) as u8;
    }
    plot_id
}

fn criterion_benchmark(c: &mut Criterion) {
    let plot_id = test_plot_id();
    let hashing = ProofHashing::new(plot_id, K);
    let params = ProofParams::new(plot_id, K, STRENGTH).unwrap();

    let mut group = c.benchmark_group("plotting");

    group.bench_function("radix_sort_by_key/100k", |b| {
        b.iter_batched(
            || (0u64..100_000).rev().collect::<Vec<_>>(),
            |mut values| radix_sort_by_key(&mut values, 8, |v| *v),
            criterion::BatchSize::LargeInput,
        );
    });

    group.throughput(Throughput::Elements(1));
    group.bench_function("build_table1", |b| {
        b.iter(|| build_table1(black_box(&hashing), black_box(&params)));
    });

    let t1 = build_table1(&hashing, &params);
    group.bench_function("build_table2", |b| {
        b.iter(|| build_table2(black_box(&hashing), black_box(&params), black_box(&t1)));
    });

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

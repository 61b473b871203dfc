use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use pos2_format::chunk::{decode_chunk, encode_chunk};
use std::hint::black_box;

const K: u32 = 24;

fn sample_values(n: u64) -> Vec<u64> {
    let mut values = Vec::with_capacity(n as usize);
    let mut v = 0u64;
    for i in 0..n {
        v += 5 + (i % 7);
        values.push(v);
    }
    values
}

fn criterion_benchmark(c: &mut Criterion) {
    let values = sample_values(10_000);

    let mut group = c.benchmark_group("chunk");
    group.throughput(Throughput::Elements(values.len() as u64));

    group.bench_function("encode", |b| {
        b.iter(|| encode_chunk(black_box(0), black_box(&values), None, black_box(K)).unwrap());
    });

    let (fse, stub, xsb) = encode_chunk(0, &values, None, K).unwrap();
    group.bench_function("decode", |b| {
        b.iter(|| decode_chunk(black_box(0), values.len() as u32, &fse, &stub, &xsb, black_box(K)).unwrap());
    });

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use incrdict::{Dict, DictValue, SipDict, SipDictType};

const SIZES: &[usize] = &[256, 1_024, 8_192, 65_536];

fn bench_insert_with_rehash(c: &mut Criterion) {
    let mut group = c.benchmark_group("dict/insert_no_prealloc");

    for &n in SIZES {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let mut d: SipDict<u64, u64> = SipDict::default();
                for i in 0..n as u64 {
                    d.add(black_box(i), DictValue::UnsignedInt(black_box(i)))
                        .unwrap();
                }
                black_box(d)
            });
        });
    }

    group.finish();
}

fn bench_insert_with_capacity(c: &mut Criterion) {
    let mut group = c.benchmark_group("dict/insert_with_capacity");

    for &n in SIZES {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let mut d: SipDict<u64, u64> =
                    Dict::with_capacity(SipDictType::default(), n);
                for i in 0..n as u64 {
                    d.add(black_box(i), DictValue::UnsignedInt(black_box(i)))
                        .unwrap();
                }
                black_box(d)
            });
        });
    }

    group.finish();
}

fn bench_find_mid_rehash(c: &mut Criterion) {
    let mut group = c.benchmark_group("dict/find_mid_rehash");

    for &n in SIZES {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let mut d: SipDict<u64, u64> = SipDict::default();
            for i in 0..n as u64 {
                d.add(i, DictValue::UnsignedInt(i)).unwrap();
            }
            while d.rehash(100) {}
            d.expand(n * 4).unwrap();

            b.iter(|| {
                for i in 0..n as u64 {
                    black_box(d.find(&black_box(i)));
                }
            });
        });
    }

    group.finish();
}

fn bench_explicit_rehash(c: &mut Criterion) {
    let mut group = c.benchmark_group("dict/explicit_rehash");

    for &n in SIZES {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter_batched(
                || {
                    let mut d: SipDict<u64, u64> = SipDict::default();
                    for i in 0..n as u64 {
                        d.add(i, DictValue::UnsignedInt(i)).unwrap();
                    }
                    while d.rehash(100) {}
                    d.expand(n * 4).unwrap();
                    d
                },
                |mut d| {
                    while d.rehash(100) {}
                    black_box(d)
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

fn bench_full_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("dict/full_scan");

    for &n in SIZES {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let mut d: SipDict<u64, u64> = SipDict::default();
            for i in 0..n as u64 {
                d.add(i, DictValue::UnsignedInt(i)).unwrap();
            }

            b.iter(|| {
                let mut total = 0u64;
                let mut cursor = 0;
                loop {
                    cursor = d.scan(cursor, |_, _| total += 1);
                    if cursor == 0 {
                        break;
                    }
                }
                black_box(total)
            });
        });
    }

    group.finish();
}

fn bench_random_key(c: &mut Criterion) {
    let mut group = c.benchmark_group("dict/random_key");

    let mut d: SipDict<u64, u64> = SipDict::default();
    for i in 0..65_536u64 {
        d.add(i, DictValue::UnsignedInt(i)).unwrap();
    }

    group.bench_function("uniform_single", |b| {
        b.iter(|| black_box(d.random_key().map(|(k, _)| *k)));
    });
    group.bench_function("clustered_batch_100", |b| {
        b.iter(|| black_box(d.random_keys(100).len()));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_insert_with_rehash,
    bench_insert_with_capacity,
    bench_find_mid_rehash,
    bench_explicit_rehash,
    bench_full_scan,
    bench_random_key,
);
criterion_main!(benches);

//! Throughput Benchmark for ttlmap
//!
//! This benchmark measures the performance of the map
//! under various workloads.

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use std::sync::Arc;
use std::time::Duration;
use ttlmap::{ExpiringMap, MapConfig};

fn lazy_map() -> ExpiringMap<Bytes, Bytes> {
    // No runtime here, so benchmark the map without a reaper
    ExpiringMap::with_config(MapConfig::default().without_sweeping())
}

/// Benchmark SET operations
fn bench_set(c: &mut Criterion) {
    let map = lazy_map();

    let mut group = c.benchmark_group("set");
    group.throughput(Throughput::Elements(1));

    group.bench_function("set_small", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = Bytes::from(format!("key:{}", i));
            map.set(key, Bytes::from("small_value"), None);
            i += 1;
        });
    });

    group.bench_function("set_with_ttl", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = Bytes::from(format!("ttl:{}", i));
            map.set(key, Bytes::from("value"), Some(Duration::from_secs(3600)));
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark GET operations
fn bench_get(c: &mut Criterion) {
    let map = lazy_map();

    // Pre-populate with data
    for i in 0..100_000 {
        let key = Bytes::from(format!("key:{}", i));
        let value = Bytes::from(format!("value:{}", i));
        map.set(key, value, None);
    }

    let mut group = c.benchmark_group("get");
    group.throughput(Throughput::Elements(1));

    group.bench_function("get_existing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = Bytes::from(format!("key:{}", i % 100_000));
            let _ = black_box(map.get(&key));
            i += 1;
        });
    });

    group.bench_function("get_missing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = Bytes::from(format!("missing:{}", i));
            let _ = black_box(map.get(&key));
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark the O(n) scans: len and sweeping
fn bench_scans(c: &mut Criterion) {
    let map = lazy_map();

    // Half persistent, half already expired
    for i in 0..10_000 {
        let key = Bytes::from(format!("key:{}", i));
        let ttl = (i % 2 == 0).then_some(Duration::ZERO);
        map.set(key, Bytes::from("value"), ttl);
    }

    let mut group = c.benchmark_group("scans");

    group.bench_function("len_10k", |b| {
        b.iter(|| black_box(map.len()));
    });

    group.bench_function("items_10k", |b| {
        b.iter(|| black_box(map.items()));
    });

    group.bench_function("purge_10k", |b| {
        b.iter(|| {
            let map = lazy_map();
            for i in 0..10_000 {
                map.set(
                    Bytes::from(format!("key:{}", i)),
                    Bytes::from("value"),
                    Some(Duration::ZERO),
                );
            }
            black_box(map.purge_expired());
        });
    });

    group.finish();
}

/// Benchmark concurrent access
fn bench_concurrent(c: &mut Criterion) {
    use std::thread;

    let mut group = c.benchmark_group("concurrent");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("4_threads_mixed", |b| {
        b.iter(|| {
            let map = Arc::new(lazy_map());
            let handles: Vec<_> = (0..4)
                .map(|t| {
                    let map = Arc::clone(&map);
                    thread::spawn(move || {
                        for i in 0..10_000 {
                            let key = Bytes::from(format!("key:{}:{}", t, i));
                            map.set(key.clone(), Bytes::from("value"), None);
                            let _ = map.get(&key);
                        }
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }

            black_box(map.len());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_set, bench_get, bench_scans, bench_concurrent);

criterion_main!(benches);

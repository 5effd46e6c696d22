//! Benchmarks for the fetch path
//!
//! This benchmark measures:
//! - Cache hit latency (no batching machinery involved)
//! - Coalescing a burst of requests into one provider call
//! - Key parsing overhead

use batched_fetcher::cache::parse_key;
use batched_fetcher::{BatchedFetcher, KeyArg, Provider};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::collections::HashMap;
use std::time::Duration;

fn echo() -> Provider<u64> {
    Provider::batch_fn(|keys: Vec<KeyArg>| async move {
        Ok(keys
            .iter()
            .map(|k| (k.to_string(), k.as_number().unwrap_or_default()))
            .collect::<HashMap<_, _>>())
    })
}

fn bench_cache_hit(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let fetcher: BatchedFetcher<u64, u64> = BatchedFetcher::builder(echo())
        .debounce(Duration::ZERO)
        .cache_ttl(Duration::from_secs(3600))
        .build();
    rt.block_on(async { fetcher.fetch(&1).await }).unwrap();

    c.bench_function("cache_hit", |b| {
        b.to_async(&rt)
            .iter(|| async { black_box(fetcher.fetch(black_box(&1)).await.unwrap()) })
    });
}

fn bench_burst(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("burst");

    for size in [10u64, 100, 1000] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let fetcher: BatchedFetcher<u64, u64> = BatchedFetcher::builder(echo())
                .debounce(Duration::ZERO)
                .build();
            let ids: Vec<u64> = (0..size).collect();
            b.to_async(&rt).iter(|| async {
                let results = fetcher.fetch_all(&ids).await;
                black_box(results.len())
            })
        });
    }

    group.finish();
}

fn bench_parse_key(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_key");
    group.bench_function("numeric", |b| b.iter(|| parse_key(black_box("1234567"))));
    group.bench_function("text", |b| b.iter(|| parse_key(black_box("user:1234567"))));
    group.finish();
}

criterion_group!(benches, bench_cache_hit, bench_burst, bench_parse_key);
criterion_main!(benches);

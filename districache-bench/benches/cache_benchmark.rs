//! Worker-local LRU+TTL cache throughput under a hit-heavy and a miss-heavy
//! workload, at a couple of capacities — mirrors the GET/SET throughput
//! split a byte-oriented engine bench would report, adapted to
//! entry-count capacities.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use districache_cache::LruCache;

const CAPACITIES: [usize; 2] = [1_000, 10_000];

fn filled_cache(capacity: usize) -> LruCache {
    let cache = LruCache::new(capacity).unwrap();
    for i in 0..capacity {
        cache.put(&format!("key-{i}"), "some-value-some-value-some-value", None);
    }
    cache
}

fn bench_get_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_get_hit");
    for &cap in &CAPACITIES {
        let cache = filled_cache(cap);
        group.bench_with_input(BenchmarkId::new("capacity", cap), &cap, |b, &cap| {
            let mut i = 0usize;
            b.iter(|| {
                i = (i + 1) % cap;
                black_box(cache.get(&format!("key-{i}")))
            });
        });
    }
    group.finish();
}

fn bench_put_eviction_pressure(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_put_eviction");
    for &cap in &CAPACITIES {
        group.bench_with_input(BenchmarkId::new("capacity", cap), &cap, |b, &cap| {
            let cache = LruCache::new(cap / 2).unwrap();
            let mut i = 0u64;
            b.iter(|| {
                i += 1;
                cache.put(&format!("key-{i}"), "value", None);
            });
        });
    }
    group.finish();
}

criterion_group!(cache, bench_get_hit, bench_put_eviction_pressure);
criterion_main!(cache);

//! Consistent-hash ring throughput: membership churn and placement lookups
//! at a few cluster sizes, the way `hkv-bench`'s sibling `bench_engine.rs`
//! profiles the cache engine rather than micro-benchmarking individual
//! instructions.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use districache_ring::HashRing;

const CLUSTER_SIZES: [usize; 3] = [3, 10, 50];

fn populated_ring(nodes: usize) -> HashRing {
    let ring = HashRing::new(10);
    for i in 0..nodes {
        ring.add(format!("districache://node-{i}:8001"));
    }
    ring
}

fn bench_primary_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_primary");
    for &nodes in &CLUSTER_SIZES {
        let ring = populated_ring(nodes);
        group.bench_with_input(BenchmarkId::new("nodes", nodes), &nodes, |b, _| {
            let mut i = 0u64;
            b.iter(|| {
                i += 1;
                black_box(ring.primary(&format!("key-{i}")))
            });
        });
    }
    group.finish();
}

fn bench_replicas_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_replicas");
    for &nodes in &CLUSTER_SIZES {
        let ring = populated_ring(nodes);
        group.bench_with_input(BenchmarkId::new("nodes", nodes), &nodes, |b, _| {
            let mut i = 0u64;
            b.iter(|| {
                i += 1;
                black_box(ring.replicas(&format!("key-{i}"), 2))
            });
        });
    }
    group.finish();
}

fn bench_add_remove_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_churn");
    group.bench_function("add_then_remove", |b| {
        let ring = populated_ring(10);
        let mut i = 0u64;
        b.iter(|| {
            i += 1;
            let node = format!("districache://churn-{i}:8001");
            ring.add(&node);
            black_box(ring.stats());
            ring.remove(&node);
        });
    });
    group.finish();
}

criterion_group!(ring, bench_primary_lookup, bench_replicas_lookup, bench_add_remove_churn);
criterion_main!(ring);

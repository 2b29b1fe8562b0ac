//! Benchmarks for the Load Manager's slot acquisition and dispatch path.

use std::sync::Arc;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tenant_ratelimit::{GlobalLimits, Quota, RateLimiter};
use tokio::runtime::Runtime;

fn bench_load_manager(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let quota = Quota::new(1_000_000, Duration::from_secs(3600)).unwrap();

    let mut group = c.benchmark_group("load_manager");

    group.bench_function("check_and_consume_immediate_slot", |b| {
        let limiter = RateLimiter::new(GlobalLimits::new(1_000, 100).unwrap());
        let mut i = 0u64;
        b.iter(|| {
            i += 1;
            let client = format!("client-{}", i % 10_000);
            rt.block_on(async {
                black_box(
                    limiter
                        .check_and_consume("tenant-a", &client, "action", Some(quota))
                        .await,
                )
            })
        })
    });

    group.bench_function("check_and_consume_contended_slot", |b| {
        let limiter = Arc::new(RateLimiter::new(GlobalLimits::new(4, 10_000).unwrap()));
        let mut i = 0u64;
        b.iter(|| {
            i += 1;
            let client = format!("client-{}", i % 1_000);
            let limiter = limiter.clone();
            rt.block_on(async move {
                black_box(
                    limiter
                        .check_and_consume("tenant-a", &client, "action", Some(quota))
                        .await,
                )
            })
        })
    });

    group.finish();
}

criterion_group!(benches, bench_load_manager);
criterion_main!(benches);

//! Criterion benchmarks for connection leasing and column type inference.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use vtquery::{
    describe, describe_columns, ConnectionManager, ManagerConfig, QueryPlanner, SchemaRegistry,
};

const QUERY: &str = "SELECT name, count(*) AS c, sum(score) AS s, max(big) + 1 AS m \
                     FROM t GROUP BY name ORDER BY c DESC";

fn manager() -> ConnectionManager {
    let registry = SchemaRegistry::new()
        .with_table("t", "name TEXT, age INTEGER, score REAL, big BIGINT")
        .with_table("processes", "pid INTEGER, name TEXT, path TEXT");
    ConnectionManager::new(ManagerConfig::default(), Arc::new(registry)).unwrap()
}

fn bench_leases(c: &mut Criterion) {
    let manager = manager();
    let mut group = c.benchmark_group("lease");

    group.bench_function("primary", |b| {
        b.iter(|| {
            let instance = manager.get().unwrap();
            black_box(instance.is_primary())
        })
    });

    group.bench_function("transient", |b| {
        let _held = manager.get().unwrap();
        b.iter(|| {
            let instance = manager.get().unwrap();
            black_box(instance.is_primary())
        })
    });

    group.finish();
}

fn bench_planner(c: &mut Criterion) {
    let manager = manager();
    let instance = manager.get().unwrap();
    let planner = QueryPlanner::new(QUERY, instance.connection().handle()).unwrap();
    let columns = describe(QUERY, &instance).unwrap();

    let mut group = c.benchmark_group("planner");

    group.bench_function("apply_types", |b| {
        b.iter_batched(
            || columns.clone(),
            |mut columns| {
                let _ = planner.apply_types(&mut columns);
                black_box(columns)
            },
            BatchSize::SmallInput,
        )
    });

    group.bench_function("describe_columns", |b| {
        b.iter(|| black_box(describe_columns(QUERY, &instance).unwrap()))
    });

    group.finish();
}

criterion_group!(benches, bench_leases, bench_planner);
criterion_main!(benches);

//! Benchmarks for index-accelerated scans and reference-segment reads.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};

use tessera_common::types::{ChunkId, ColumnId, DataType, PredicateCondition, Value};
use tessera_core::storage::{ColumnDefinition, IndexKind, Segment, TableKind, UseMvcc};
use tessera_core::{EngineConfig, EngineContext, IndexScan, Table};

fn build_table(rows: i64, chunk_size: u32) -> Arc<Table> {
    let table = Table::with_options(
        vec![
            ColumnDefinition::new("a", DataType::Int64, false),
            ColumnDefinition::new("b", DataType::Float64, false),
        ],
        TableKind::Data,
        Some(chunk_size),
        UseMvcc::No,
    );
    for i in 0..rows {
        table.append(&[Value::Int64(i % 1000), Value::Float64(i as f64)]);
    }
    table.finalize_last_chunk();
    for chunk_id in 0..table.chunk_count() {
        let chunk = table.get_chunk(ChunkId::new(chunk_id)).unwrap();
        chunk.create_index(IndexKind::Ordered, &[ColumnId::new(0)]);
    }
    Arc::new(table)
}

fn bench_index_scan_equals(c: &mut Criterion) {
    let ctx = EngineContext::new(EngineConfig {
        workers: 4,
        ..EngineConfig::default()
    })
    .unwrap();
    let table = build_table(100_000, 4_096);

    c.bench_function("index_scan_equals_100k", |b| {
        b.iter(|| {
            let scan = IndexScan::new(
                Arc::clone(&table),
                IndexKind::Ordered,
                vec![ColumnId::new(0)],
                PredicateCondition::Equals,
                vec![Value::Int64(500)],
                Vec::new(),
            );
            black_box(scan.execute(&ctx))
        });
    });
}

fn bench_index_scan_between(c: &mut Criterion) {
    let ctx = EngineContext::new(EngineConfig {
        workers: 4,
        ..EngineConfig::default()
    })
    .unwrap();
    let table = build_table(100_000, 4_096);

    c.bench_function("index_scan_between_100k", |b| {
        b.iter(|| {
            let scan = IndexScan::new(
                Arc::clone(&table),
                IndexKind::Ordered,
                vec![ColumnId::new(0)],
                PredicateCondition::BetweenInclusive,
                vec![Value::Int64(100)],
                vec![Value::Int64(200)],
            );
            black_box(scan.execute(&ctx))
        });
    });
}

fn bench_reference_segment_iteration(c: &mut Criterion) {
    let ctx = EngineContext::new(EngineConfig {
        workers: 4,
        ..EngineConfig::default()
    })
    .unwrap();
    let table = build_table(100_000, 4_096);

    let scan = IndexScan::new(
        Arc::clone(&table),
        IndexKind::Ordered,
        vec![ColumnId::new(0)],
        PredicateCondition::LessThan,
        vec![Value::Int64(500)],
        Vec::new(),
    );
    let result = scan.execute(&ctx);

    c.bench_function("reference_segment_sum_50k", |b| {
        b.iter(|| {
            let mut sum = 0f64;
            for chunk_id in 0..result.chunk_count() {
                let chunk = result.get_chunk(ChunkId::new(chunk_id)).unwrap();
                let Segment::Reference(reference) = chunk.segment(ColumnId::new(1)) else {
                    unreachable!()
                };
                reference.for_each_typed::<f64, _>(|_, v| {
                    if let Some(v) = v {
                        sum += v;
                    }
                });
            }
            black_box(sum)
        });
    });
}

criterion_group!(
    benches,
    bench_index_scan_equals,
    bench_index_scan_between,
    bench_reference_segment_iteration
);
criterion_main!(benches);

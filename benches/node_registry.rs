//! Benchmark for the per-chain node registry
//!
//! Create and paginated list throughput over the memory store.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use ocr_node::registry::PageRequest;
use ocr_node::{ChainFamily, ChainRecord, NewTerraNode, NodeRegistry, TerraNode};
use std::sync::Arc;

fn terra_input(i: u64) -> NewTerraNode {
    NewTerraNode {
        name: format!("node-{}", i),
        tendermint_url: format!("http://host-{}.local:26657", i % 64),
    }
}

fn seeded_registry(rt: &tokio::runtime::Runtime, nodes: u64) -> Arc<NodeRegistry<TerraNode>> {
    let registry = NodeRegistry::<TerraNode>::in_memory();
    registry
        .register_chain(ChainRecord::new(ChainFamily::Terra, "terra-X"))
        .unwrap();
    rt.block_on(async {
        for i in 0..nodes {
            registry.create_node("terra-X", terra_input(i)).await.unwrap();
        }
    });
    registry
}

fn bench_create_nodes(c: &mut Criterion) {
    let mut group = c.benchmark_group("node_registry");
    group.throughput(Throughput::Elements(1));

    let rt = tokio::runtime::Runtime::new().unwrap();
    let registry = seeded_registry(&rt, 0);
    let mut counter = 0u64;

    group.bench_function("create_node", |b| {
        b.iter(|| {
            counter += 1;
            rt.block_on(async {
                let _ = registry
                    .create_node(black_box("terra-X"), terra_input(counter))
                    .await;
            });
        });
    });

    group.finish();
}

fn bench_list_pages(c: &mut Criterion) {
    let mut group = c.benchmark_group("node_registry");

    let rt = tokio::runtime::Runtime::new().unwrap();
    let registry = seeded_registry(&rt, 10_000);

    for size in [25u64, 1000] {
        group.throughput(Throughput::Elements(size));
        group.bench_function(format!("list_page_size_{}", size), |b| {
            // Both land mid-collection, at offset 5000
            let request = PageRequest::new(5000 / size + 1, size).unwrap();
            b.iter(|| {
                rt.block_on(async {
                    let page = registry
                        .list_nodes(black_box("terra-X"), &request)
                        .await
                        .unwrap();
                    black_box(page.items.len());
                });
            });
        });
    }

    group.finish();
}

fn bench_concurrent_creates(c: &mut Criterion) {
    let mut group = c.benchmark_group("node_registry");
    group.throughput(Throughput::Elements(100));

    let rt = tokio::runtime::Runtime::new().unwrap();
    let registry = seeded_registry(&rt, 0);
    let mut round = 0u64;

    group.bench_function("concurrent_100_creates", |b| {
        b.iter(|| {
            round += 1;
            rt.block_on(async {
                let mut handles = Vec::new();
                for i in 0..100 {
                    let reg = registry.clone();
                    let input = terra_input(round * 100 + i);
                    handles.push(tokio::spawn(async move {
                        let _ = reg.create_node("terra-X", input).await;
                    }));
                }
                for handle in handles {
                    let _ = handle.await;
                }
            });
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_create_nodes,
    bench_list_pages,
    bench_concurrent_creates,
);
criterion_main!(benches);

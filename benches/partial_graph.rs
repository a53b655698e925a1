//! Benchmarks for graph construction and partial graph extraction.
//!
//! Run with: cargo bench --bench partial_graph

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sdl_lineage_graph::{ConfigData, ExtractOptions, LineageGraph};
use serde_json::{json, Map};

/// Build a layered pipeline: `width` data objects per layer, each fed by two
/// objects of the previous layer.
fn layered_config(layers: usize, width: usize) -> ConfigData {
    let mut data_objects = Map::new();
    let mut actions = Map::new();

    for layer in 0..layers {
        for slot in 0..width {
            data_objects.insert(format!("do-{layer}-{slot}"), json!({}));
            if layer == 0 {
                continue;
            }
            let left = format!("do-{}-{}", layer - 1, slot);
            let right = format!("do-{}-{}", layer - 1, (slot + 1) % width);
            actions.insert(
                format!("action-{layer}-{slot}"),
                json!({"inputIds": [left, right], "outputId": format!("do-{layer}-{slot}")}),
            );
        }
    }

    ConfigData::from_value(json!({"dataObjects": data_objects, "actions": actions}))
        .expect("generated configuration is an object")
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");

    for layers in [10, 50, 100] {
        let config = layered_config(layers, 10);
        group.bench_with_input(BenchmarkId::new("layered", layers), &layers, |b, _| {
            b.iter(|| {
                let outcome = LineageGraph::from_config(black_box(&config));
                black_box(outcome.graph.edge_count())
            });
        });
    }

    group.finish();
}

fn bench_partial_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("partial_graph");

    for layers in [10, 50, 100] {
        let graph = LineageGraph::from_config(&layered_config(layers, 10)).graph;
        let middle = format!("do-{}-0", layers / 2);

        group.bench_with_input(BenchmarkId::new("lineage", layers), &layers, |b, _| {
            b.iter(|| {
                let partial = graph.lineage(black_box(&middle)).ok();
                black_box(partial.map(|partial| partial.edge_count()))
            });
        });

        group.bench_with_input(
            BenchmarkId::new("direct_neighbours", layers),
            &layers,
            |b, _| {
                b.iter(|| {
                    let partial = graph
                        .partial_graph_for(black_box(&middle), &ExtractOptions::direct_neighbours())
                        .ok();
                    black_box(partial.map(|partial| partial.node_count()))
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_build, bench_partial_graph);
criterion_main!(benches);

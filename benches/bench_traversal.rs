use std::time::Duration;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use lineagegraph::{
    Edge, EdgeType, LineageDirection, Node, NodeType, SqliteLineageStore, StoreConfig,
    UNLIMITED_DEPTH, find_downstream, find_upstream,
};
use rand::{Rng, SeedableRng, rngs::StdRng};

const DAG_SEED: u64 = 0xDA61;
const NODES: usize = 2_000;
const FAN_IN: usize = 3;
const SAMPLE_SIZE: usize = 20;
const WARM_UP: Duration = Duration::from_millis(300);
const MEASURE: Duration = Duration::from_millis(500);

/// Node `i` draws its parents from nodes `0..i`, so the graph is acyclic.
fn seeded_dag(adjacency_cache: bool) -> SqliteLineageStore {
    let config = StoreConfig {
        adjacency_cache,
        ..StoreConfig::in_memory()
    };
    let store = SqliteLineageStore::from_config(&config).expect("store");
    let mut rng = StdRng::seed_from_u64(DAG_SEED);
    for idx in 0..NODES {
        store
            .insert_node(&Node::new(asset(idx), NodeType::Table))
            .expect("node");
        if idx == 0 {
            continue;
        }
        for _ in 0..FAN_IN {
            let parent = rng.gen_range(0..idx);
            store
                .insert_edge(&Edge::new(asset(parent), asset(idx), EdgeType::Derives))
                .expect("edge");
        }
    }
    store
}

fn asset(idx: usize) -> String {
    format!("asset_{idx:05}")
}

fn bench_directions(c: &mut Criterion) {
    let mut group = c.benchmark_group("traversal");
    group.sample_size(SAMPLE_SIZE);
    group.warm_up_time(WARM_UP);
    group.measurement_time(MEASURE);
    for cached in [false, true] {
        let store = seeded_dag(cached);
        let label = if cached { "cached" } else { "uncached" };
        let tail = asset(NODES - 1);
        let head = asset(0);
        group.bench_function(BenchmarkId::new("upstream", label), |b| {
            b.iter(|| find_upstream(&store, &tail, UNLIMITED_DEPTH).expect("upstream"));
        });
        group.bench_function(BenchmarkId::new("downstream", label), |b| {
            b.iter(|| find_downstream(&store, &head, UNLIMITED_DEPTH).expect("downstream"));
        });
    }
    group.finish();
}

fn bench_depth_limits(c: &mut Criterion) {
    let store = seeded_dag(false);
    let tail = asset(NODES - 1);
    let mut group = c.benchmark_group("lineage_graph");
    group.sample_size(SAMPLE_SIZE);
    group.warm_up_time(WARM_UP);
    group.measurement_time(MEASURE);
    for depth in [1, 3, 6] {
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, depth| {
            b.iter(|| {
                store
                    .lineage()
                    .get_lineage_graph(&tail, LineageDirection::Both, *depth)
                    .expect("graph")
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_directions, bench_depth_limits);
criterion_main!(benches);

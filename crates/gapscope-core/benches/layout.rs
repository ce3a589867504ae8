use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use gapscope_core::layout::{ForceLayout, LayoutConfig};
use gapscope_core::model::{GapEdge, GapGraph, GapNode};

/// Ring of `n` topics with a chord every third node.
fn ring_graph(n: usize) -> GapGraph {
    let nodes = (0..n)
        .map(|i| GapNode::new(format!("topic-{i}"), (i % 7) as f64 * 10.0 + 5.0))
        .collect();
    let mut edges = Vec::new();
    for i in 0..n {
        let next = (i + 1) % n;
        edges.push(GapEdge::new(
            format!("topic-{i}"),
            format!("topic-{next}"),
            ((i * 13) % 100) as f64,
        ));
        if i % 3 == 0 {
            let far = (i + n / 2) % n;
            edges.push(GapEdge::new(format!("topic-{i}"), format!("topic-{far}"), 25.0));
        }
    }
    GapGraph { nodes, edges }
}

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout_step");

    for n in [10, 50, 200] {
        let layout = ForceLayout::new(&ring_graph(n), LayoutConfig::default());
        let state = layout.initial_state(42);
        group.bench_with_input(BenchmarkId::from_parameter(n), &state, |b, state| {
            b.iter(|| layout.step(black_box(state)))
        });
    }

    group.finish();
}

fn bench_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout_solve");
    group.sample_size(20);

    for n in [10, 50] {
        let layout = ForceLayout::new(&ring_graph(n), LayoutConfig::default());
        group.bench_with_input(BenchmarkId::from_parameter(n), &layout, |b, layout| {
            b.iter(|| black_box(layout).solve())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_step, bench_solve);
criterion_main!(benches);

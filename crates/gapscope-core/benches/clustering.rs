use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use gapscope_core::aggregate::build_gap_graph;
use gapscope_core::clustering::cluster_by_shared_gaps;
use gapscope_core::model::{Entity, WeakTopic};

/// `n` learners drawing 6 of 20 topics each in a fixed pattern.
fn cohort(n: usize) -> Vec<Entity> {
    (0..n)
        .map(|i| {
            let mut entity = Entity::with_topics(format!("learner-{i}"), &[]);
            entity.weak_topics = (0..6)
                .map(|k| {
                    let topic = (i * 7 + k * 3) % 20;
                    WeakTopic::new(format!("topic-{topic}"), ((i + k) % 10) as f64 / 10.0)
                })
                .collect();
            entity
        })
        .collect()
}

fn bench_clustering(c: &mut Criterion) {
    let mut group = c.benchmark_group("cluster_by_shared_gaps");

    for n in [10, 50, 200] {
        let entities = cohort(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &entities, |b, entities| {
            b.iter(|| cluster_by_shared_gaps(black_box(entities), 3))
        });
    }

    group.finish();
}

fn bench_gap_graph(c: &mut Criterion) {
    let entities = cohort(200);
    c.bench_function("build_gap_graph_200", |b| {
        b.iter(|| build_gap_graph(black_box(&entities), None, 10.0))
    });
}

criterion_group!(benches, bench_clustering, bench_gap_graph);
criterion_main!(benches);

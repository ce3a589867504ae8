//! Per-entity and per-topic roll-ups feeding the analytics modules.
//!
//! Also derives the gap-overlap graph from an entity population and
//! re-indexes raw series points into `0..n-1` ordinal form.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::DatasetError;
use crate::model::{
    clamp_non_negative, DatedPoint, Entity, GapEdge, GapGraph, GapNode, SeriesPoint, TimeSeries,
    TimeSeriesPoint,
};
use crate::sync::elapsed_proxy;

/// Arithmetic mean of the finite values; `0` when there are none.
pub fn mean(values: &[f64]) -> f64 {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        0.0
    } else {
        finite.iter().sum::<f64>() / finite.len() as f64
    }
}

/// Weighted average of `(value, weight)` pairs.
///
/// Negative and non-finite weights count as zero. A zero total weight yields `0`.
pub fn weighted_average(pairs: &[(f64, f64)]) -> f64 {
    let mut total = 0.0;
    let mut weight_sum = 0.0;
    for &(value, weight) in pairs {
        if !value.is_finite() {
            continue;
        }
        let weight = clamp_non_negative(weight);
        total += value * weight;
        weight_sum += weight;
    }
    if weight_sum > 0.0 {
        total / weight_sum
    } else {
        0.0
    }
}

/// Roll-up of a single entity's records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySummary {
    pub id: String,
    pub name: String,
    /// Number of distinct weak topics.
    pub gap_count: usize,
    /// Sum of recorded time lost across gaps, in minutes.
    pub total_time_lost: f64,
    /// Plain mean of clamped intensities.
    pub mean_intensity: f64,
    /// Intensity weighted by time lost; equals `mean_intensity` without time data.
    pub weighted_intensity: f64,
    pub completed_units: u32,
    /// `completed_units × minutes_per_unit`.
    pub elapsed_proxy: f64,
}

/// Summarize one entity.
pub fn summarize_entity(entity: &Entity, minutes_per_unit: f64) -> EntitySummary {
    let distinct: HashSet<&str> = entity.topic_labels().collect();
    let intensities: Vec<f64> = entity
        .weak_topics
        .iter()
        .map(|g| g.clamped_intensity())
        .collect();
    let total_time_lost = entity
        .weak_topics
        .iter()
        .filter_map(|g| g.clamped_time_lost())
        .sum::<f64>();

    let mean_intensity = mean(&intensities);
    let weighted_intensity = if total_time_lost > 0.0 {
        let pairs: Vec<(f64, f64)> = entity
            .weak_topics
            .iter()
            .map(|g| (g.clamped_intensity(), g.clamped_time_lost().unwrap_or(0.0)))
            .collect();
        weighted_average(&pairs)
    } else {
        mean_intensity
    };

    EntitySummary {
        id: entity.id.clone(),
        name: entity.name.clone(),
        gap_count: distinct.len(),
        total_time_lost,
        mean_intensity,
        weighted_intensity,
        completed_units: entity.completed_units,
        elapsed_proxy: elapsed_proxy(entity.completed_units, minutes_per_unit),
    }
}

/// Population-wide roll-up of one topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicSummary {
    pub topic: String,
    /// Number of distinct entities holding this topic.
    pub learner_count: usize,
    pub total_time_lost: f64,
    /// Mean time lost over the records that carry time data.
    pub avg_time_lost: f64,
    pub avg_intensity: f64,
}

#[derive(Default)]
struct TopicAccumulator {
    learners: HashSet<usize>,
    intensities: Vec<f64>,
    times: Vec<f64>,
}

/// Accumulate per-topic records, keeping first-appearance order.
fn accumulate_topics(entities: &[Entity]) -> Vec<(String, TopicAccumulator)> {
    let mut order: Vec<String> = Vec::new();
    let mut acc: HashMap<String, TopicAccumulator> = HashMap::new();

    for (idx, entity) in entities.iter().enumerate() {
        for gap in &entity.weak_topics {
            if gap.topic.trim().is_empty() {
                continue;
            }
            let entry = acc.entry(gap.topic.clone()).or_insert_with(|| {
                order.push(gap.topic.clone());
                TopicAccumulator::default()
            });
            entry.learners.insert(idx);
            entry.intensities.push(gap.clamped_intensity());
            if let Some(t) = gap.clamped_time_lost() {
                entry.times.push(t);
            }
        }
    }

    order
        .into_iter()
        .filter_map(|topic| acc.remove(&topic).map(|a| (topic, a)))
        .collect()
}

/// Per-topic roll-up, ordered by learner count (descending) then topic label.
pub fn topic_rollup(entities: &[Entity]) -> Vec<TopicSummary> {
    let mut summaries: Vec<TopicSummary> = accumulate_topics(entities)
        .into_iter()
        .map(|(topic, acc)| TopicSummary {
            topic,
            learner_count: acc.learners.len(),
            total_time_lost: acc.times.iter().sum(),
            avg_time_lost: mean(&acc.times),
            avg_intensity: mean(&acc.intensities),
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.learner_count
            .cmp(&a.learner_count)
            .then_with(|| a.topic.cmp(&b.topic))
    });
    summaries
}

/// Build the gap-overlap graph of a population.
///
/// One node per topic (first-appearance order). Node weight is the average
/// time lost on the topic, or average intensity × 100 when no record carries
/// time data. An edge joins two topics held together by at least one entity;
/// its overlap strength is `100 × |both| / |either|`. Edges below
/// `min_overlap` are dropped.
pub fn build_gap_graph(entities: &[Entity], primary: Option<&Entity>, min_overlap: f64) -> GapGraph {
    let topics = accumulate_topics(entities);
    let index: HashMap<&str, usize> = topics
        .iter()
        .enumerate()
        .map(|(i, (topic, _))| (topic.as_str(), i))
        .collect();

    let nodes: Vec<GapNode> = topics
        .iter()
        .map(|(topic, acc)| {
            let weight = if acc.times.is_empty() {
                mean(&acc.intensities) * 100.0
            } else {
                mean(&acc.times)
            };
            GapNode {
                id: topic.clone(),
                weight,
                is_primary_user_gap: primary.is_some_and(|p| p.has_topic(topic)),
                position: None,
            }
        })
        .collect();

    // co-occurrence counts keyed by (lower, higher) node index
    let mut both: BTreeMap<(usize, usize), usize> = BTreeMap::new();
    for entity in entities {
        let mut held: Vec<usize> = entity
            .topic_labels()
            .filter_map(|t| index.get(t).copied())
            .collect();
        held.sort_unstable();
        held.dedup();
        for (pos, &a) in held.iter().enumerate() {
            for &b in &held[pos + 1..] {
                *both.entry((a, b)).or_insert(0) += 1;
            }
        }
    }

    let edges = both
        .into_iter()
        .filter_map(|((a, b), together)| {
            let either = topics[a].1.learners.len() + topics[b].1.learners.len() - together;
            if either == 0 {
                return None;
            }
            let overlap = 100.0 * together as f64 / either as f64;
            (overlap >= min_overlap).then(|| GapEdge::new(&topics[a].0, &topics[b].0, overlap))
        })
        .collect();

    GapGraph { nodes, edges }
}

/// Sort indexed points by index and assign `0..n-1`.
pub fn reindex_points(points: &[TimeSeriesPoint]) -> Vec<TimeSeriesPoint> {
    let mut sorted = points.to_vec();
    sorted.sort_by_key(|p| p.index);
    sorted
        .into_iter()
        .enumerate()
        .map(|(i, p)| TimeSeriesPoint { index: i, value: p.value })
        .collect()
}

/// Sort dated points by date (stable for equal dates) and assign `0..n-1`.
pub fn reindex_dated(points: &[DatedPoint]) -> Vec<TimeSeriesPoint> {
    let mut sorted = points.to_vec();
    sorted.sort_by_key(|p| p.date);
    sorted
        .into_iter()
        .enumerate()
        .map(|(i, p)| TimeSeriesPoint { index: i, value: p.value })
        .collect()
}

/// Convert raw series points into ordinal points.
///
/// A series is either fully dated or not dated at all. Undated points without
/// an explicit index take their input position as index.
pub fn reindex_series(series: &TimeSeries) -> Result<Vec<TimeSeriesPoint>, DatasetError> {
    let dated = series.points.iter().filter(|p| p.date.is_some()).count();

    if dated == 0 {
        let points: Vec<TimeSeriesPoint> = series
            .points
            .iter()
            .enumerate()
            .map(|(pos, p)| TimeSeriesPoint {
                index: p.index.unwrap_or(pos),
                value: p.value,
            })
            .collect();
        return Ok(reindex_points(&points));
    }

    if dated != series.points.len() {
        return Err(DatasetError::MixedSeriesPoints(series.id.clone()));
    }

    let points: Vec<DatedPoint> = series
        .points
        .iter()
        .filter_map(|p: &SeriesPoint| {
            p.date.map(|date| DatedPoint {
                date,
                value: p.value,
            })
        })
        .collect();
    Ok(reindex_dated(&points))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WeakTopic;
    use chrono::NaiveDate;

    fn learner(id: &str, gaps: &[(&str, f64, Option<f64>)]) -> Entity {
        Entity {
            id: id.into(),
            name: format!("Learner {id}"),
            weak_topics: gaps
                .iter()
                .map(|(t, i, time)| WeakTopic {
                    topic: (*t).into(),
                    intensity: *i,
                    time_lost_minutes: *time,
                })
                .collect(),
            completed_units: 10,
            elapsed_minutes: None,
        }
    }

    #[test]
    fn weighted_average_ignores_zero_weights() {
        assert_eq!(weighted_average(&[]), 0.0);
        assert_eq!(weighted_average(&[(5.0, 0.0)]), 0.0);
        let avg = weighted_average(&[(1.0, 1.0), (4.0, 3.0), (100.0, -2.0)]);
        assert!((avg - 3.25).abs() < 1e-9);
    }

    #[test]
    fn mean_skips_non_finite() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[2.0, f64::NAN, 4.0]), 3.0);
    }

    #[test]
    fn entity_summary_weights_by_time_lost() {
        let e = learner("a", &[("Optics", 0.2, Some(10.0)), ("Waves", 1.4, Some(30.0))]);
        let summary = summarize_entity(&e, 2.0);
        assert_eq!(summary.gap_count, 2);
        assert_eq!(summary.total_time_lost, 40.0);
        assert!((summary.mean_intensity - 0.6).abs() < 1e-9);
        // intensity 1.4 is clamped to 1.0
        assert!((summary.weighted_intensity - 0.8).abs() < 1e-9);
        assert_eq!(summary.elapsed_proxy, 20.0);
    }

    #[test]
    fn entity_summary_without_time_data_uses_mean() {
        let e = learner("a", &[("Optics", 0.2, None), ("Waves", 0.6, None)]);
        let summary = summarize_entity(&e, 2.0);
        assert_eq!(summary.weighted_intensity, summary.mean_intensity);
    }

    #[test]
    fn topic_rollup_counts_distinct_learners() {
        let entities = vec![
            learner("a", &[("Optics", 0.5, Some(10.0)), ("Waves", 0.4, None)]),
            learner("b", &[("Optics", 0.7, Some(20.0))]),
        ];
        let rollup = topic_rollup(&entities);
        assert_eq!(rollup[0].topic, "Optics");
        assert_eq!(rollup[0].learner_count, 2);
        assert_eq!(rollup[0].avg_time_lost, 15.0);
        assert!((rollup[0].avg_intensity - 0.6).abs() < 1e-9);
        assert_eq!(rollup[1].topic, "Waves");
        assert_eq!(rollup[1].avg_time_lost, 0.0);
    }

    #[test]
    fn gap_graph_overlap_is_jaccard_percentage() {
        let entities = vec![
            learner("a", &[("A", 0.5, Some(4.0)), ("B", 0.5, Some(6.0))]),
            learner("b", &[("A", 0.5, Some(8.0)), ("B", 0.5, None)]),
            learner("c", &[("A", 0.5, None), ("C", 0.9, None)]),
        ];
        let graph = build_gap_graph(&entities, Some(&entities[2]), 0.0);

        assert_eq!(graph.nodes.len(), 3);
        let node_a = &graph.nodes[0];
        assert_eq!(node_a.id, "A");
        assert_eq!(node_a.weight, 6.0);
        assert!(node_a.is_primary_user_gap);
        assert!(!graph.nodes[1].is_primary_user_gap);
        // C has no time data: intensity fallback
        assert!((graph.nodes[2].weight - 90.0).abs() < 1e-9);

        let ab = graph
            .edges
            .iter()
            .find(|e| e.source == "A" && e.target == "B")
            .unwrap();
        // both = 2, either = 3 + 2 - 2 = 3
        assert!((ab.overlap_strength - 200.0 / 3.0).abs() < 1e-9);
        assert!(!graph.edges.iter().any(|e| e.source == "B" && e.target == "C"));
    }

    #[test]
    fn gap_graph_drops_weak_edges() {
        let entities = vec![
            learner("a", &[("A", 0.5, None), ("B", 0.5, None)]),
            learner("b", &[("A", 0.5, None)]),
            learner("c", &[("A", 0.5, None)]),
            learner("d", &[("A", 0.5, None)]),
        ];
        let graph = build_gap_graph(&entities, None, 30.0);
        assert!(graph.edges.is_empty());
        let graph = build_gap_graph(&entities, None, 0.0);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].overlap_strength, 25.0);
    }

    #[test]
    fn empty_population_gives_empty_graph() {
        let graph = build_gap_graph(&[], None, 0.0);
        assert!(graph.nodes.is_empty());
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn reindex_series_orders_dates() {
        let date = |d| NaiveDate::from_ymd_opt(2026, 1, d);
        let series = TimeSeries {
            id: "s".into(),
            entity: None,
            label: String::new(),
            points: vec![
                SeriesPoint { index: None, date: date(9), value: 2.0 },
                SeriesPoint { index: None, date: date(2), value: 1.0 },
            ],
        };
        let points = reindex_series(&series).unwrap();
        assert_eq!(points[0], TimeSeriesPoint { index: 0, value: 1.0 });
        assert_eq!(points[1], TimeSeriesPoint { index: 1, value: 2.0 });
    }

    #[test]
    fn reindex_series_rejects_mixed_points() {
        let series = TimeSeries {
            id: "mixed".into(),
            entity: None,
            label: String::new(),
            points: vec![
                SeriesPoint { index: Some(0), date: None, value: 2.0 },
                SeriesPoint { index: None, date: NaiveDate::from_ymd_opt(2026, 1, 1), value: 1.0 },
            ],
        };
        assert_eq!(
            reindex_series(&series),
            Err(DatasetError::MixedSeriesPoints("mixed".into()))
        );
    }
}

//! Greedy clustering of entities by shared weak topics.
//!
//! Membership is decided against the seed only: two entities that each share
//! enough topics with the seed join the same cluster even when they share few
//! topics with each other. The result depends on input order.

use std::collections::{HashMap, HashSet};

use crate::aggregate::mean;
use crate::model::{Cluster, CommonGap, Entity};

/// Default minimum number of shared topics for two entities to cluster.
pub const DEFAULT_MIN_SHARED_TOPICS: usize = 3;

/// Partition `entities` into clusters of at least two members.
///
/// `min_shared` of `0` is treated as `1`, so entities without topics never
/// cluster together.
pub fn cluster_by_shared_gaps(entities: &[Entity], min_shared: usize) -> Vec<Cluster> {
    let min_shared = min_shared.max(1);
    let topic_sets: Vec<HashSet<&str>> = entities
        .iter()
        .map(|e| e.topic_labels().collect())
        .collect();

    let mut processed = vec![false; entities.len()];
    let mut clusters = Vec::new();

    for seed in 0..entities.len() {
        if processed[seed] {
            continue;
        }

        let mut members = vec![seed];
        for other in 0..entities.len() {
            if other == seed || processed[other] {
                continue;
            }
            let shared = topic_sets[seed].intersection(&topic_sets[other]).count();
            if shared >= min_shared {
                members.push(other);
                processed[other] = true;
            }
        }
        processed[seed] = true;

        if members.len() < 2 {
            continue;
        }

        let member_entities: Vec<&Entity> = members.iter().map(|&i| &entities[i]).collect();
        let cluster = Cluster {
            member_ids: member_entities.iter().map(|e| e.id.clone()).collect(),
            common_gaps: common_gaps(&member_entities),
            avg_intensity: average_intensity(&member_entities),
        };
        tracing::debug!(
            seed = %entities[seed].id,
            members = cluster.member_ids.len(),
            common = cluster.common_gaps.len(),
            "materialized cluster"
        );
        clusters.push(cluster);
    }

    clusters
}

/// Topics held by at least two members, by member count then first appearance.
fn common_gaps(members: &[&Entity]) -> Vec<CommonGap> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for member in members {
        // walk records rather than a set to keep first-appearance order stable
        let mut seen_here: HashSet<&str> = HashSet::new();
        for topic in member.topic_labels() {
            if !seen_here.insert(topic) {
                continue;
            }
            let count = counts.entry(topic).or_insert_with(|| {
                order.push(topic);
                0
            });
            *count += 1;
        }
    }

    let mut gaps: Vec<CommonGap> = order
        .into_iter()
        .filter_map(|topic| {
            let count = counts[topic];
            (count >= 2).then(|| CommonGap {
                topic: topic.to_string(),
                count,
            })
        })
        .collect();
    // stable: ties keep first-appearance order
    gaps.sort_by(|a, b| b.count.cmp(&a.count));
    gaps
}

/// Mean of every clamped intensity across all members' gap records.
fn average_intensity(members: &[&Entity]) -> f64 {
    let intensities: Vec<f64> = members
        .iter()
        .flat_map(|m| m.weak_topics.iter().map(|g| g.clamped_intensity()))
        .collect();
    mean(&intensities)
}

/// Ids of entities that belong to no cluster, in input order.
pub fn unclustered_ids(entities: &[Entity], clusters: &[Cluster]) -> Vec<String> {
    let clustered: HashSet<&str> = clusters
        .iter()
        .flat_map(|c| c.member_ids.iter().map(String::as_str))
        .collect();
    entities
        .iter()
        .filter(|e| !clustered.contains(e.id.as_str()))
        .map(|e| e.id.clone())
        .collect()
}

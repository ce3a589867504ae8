//! The `gapscope cluster` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};
use serde::Serialize;

use gapscope_core::clustering::{cluster_by_shared_gaps, unclustered_ids};
use gapscope_core::model::Cluster;

use super::{display_name, load_inputs};

#[derive(Serialize)]
struct ClusterOutput {
    min_shared_topics: usize,
    clusters: Vec<Cluster>,
    unclustered: Vec<String>,
}

pub fn execute(
    dataset_path: PathBuf,
    min_shared: Option<usize>,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let (dataset, config) = load_inputs(&dataset_path, config_path)?;
    let min_shared = min_shared.unwrap_or(config.clustering.min_shared_topics);

    let clusters = cluster_by_shared_gaps(&dataset.entities, min_shared);
    let unclustered = unclustered_ids(&dataset.entities, &clusters);

    if format == "json" {
        let output = ClusterOutput {
            min_shared_topics: min_shared,
            clusters,
            unclustered,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "{} cluster(s) at {} shared topic(s)",
        clusters.len(),
        min_shared
    );

    if !clusters.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["#", "Members", "Common gaps", "Avg intensity"]);
        for (i, cluster) in clusters.iter().enumerate() {
            let gaps: Vec<String> = cluster
                .common_gaps
                .iter()
                .map(|g| format!("{} ({})", g.topic, g.count))
                .collect();
            table.add_row(vec![
                Cell::new(i + 1),
                Cell::new(cluster.member_ids.join(", ")),
                Cell::new(gaps.join(", ")),
                Cell::new(format!("{:.2}", cluster.avg_intensity)),
            ]);
        }
        println!("{table}");
    }

    if !unclustered.is_empty() {
        let names: Vec<String> = unclustered
            .iter()
            .map(|id| format!("{} ({})", id, display_name(&dataset, id)))
            .collect();
        println!("Unclustered: {}", names.join(", "));
    }

    Ok(())
}

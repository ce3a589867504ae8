//! The `gapscope analyze` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use gapscope_core::engine::AnalyticsEngine;
use gapscope_core::report::AnalyticsReport;

use super::load_inputs;

pub fn execute(
    dataset_path: PathBuf,
    output: Option<PathBuf>,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let (dataset, config) = load_inputs(&dataset_path, config_path)?;

    let mut engine = AnalyticsEngine::new(config);
    let report = engine.analyze(&dataset)?;

    if let Some(path) = &output {
        report.save_json(path)?;
        eprintln!("Report saved to {}", path.display());
    }

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "markdown" | "md" => println!("{}", report.to_markdown()),
        _ => print_summary(&report),
    }

    Ok(())
}

fn print_summary(report: &AnalyticsReport) {
    let analysis = &report.analysis;
    println!(
        "Dataset: {} ({} entities, {} series)",
        if report.dataset.name.is_empty() {
            &report.dataset.id
        } else {
            &report.dataset.name
        },
        report.dataset.entity_count,
        report.dataset.series_count
    );

    let mut table = Table::new();
    table.set_header(vec!["Entity", "Gaps", "Time lost", "Intensity", "Units", "Elapsed"]);
    for e in &analysis.entities {
        table.add_row(vec![
            Cell::new(&e.id),
            Cell::new(e.gap_count),
            Cell::new(format!("{:.1}", e.total_time_lost)),
            Cell::new(format!("{:.2}", e.mean_intensity)),
            Cell::new(e.completed_units),
            Cell::new(format!("{:.0}", e.elapsed_proxy)),
        ]);
    }
    println!("\n{table}");

    println!("\nClusters: {}", analysis.clusters.len());
    for (i, cluster) in analysis.clusters.iter().enumerate() {
        println!(
            "  {}. {} [{}]",
            i + 1,
            cluster.member_ids.join(", "),
            cluster.common_topics().join(", ")
        );
    }
    if !analysis.unclustered.is_empty() {
        println!("Unclustered: {}", analysis.unclustered.join(", "));
    }

    for t in &analysis.trends {
        println!(
            "Trend {}: {} (slope {:+.2}, r {:.2})",
            t.series_id, t.direction, t.trend.slope, t.trend.correlation
        );
    }

    let layout = &analysis.layout;
    println!(
        "Layout: {} nodes, {} edges, {} steps ({})",
        layout.positions.len(),
        layout.edges.len(),
        layout.steps,
        layout.status()
    );
}

//! The `gapscope layout` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use gapscope_core::aggregate::build_gap_graph;
use gapscope_core::engine::layout_gap_graph;
use gapscope_core::layout::{LayoutObserver, LayoutRun, LayoutState, NoopObserver};

use super::load_inputs;

/// Prints every intermediate state to stderr.
struct TraceObserver;

impl LayoutObserver for TraceObserver {
    fn on_step(&self, state: &LayoutState) {
        let moved = if state.max_displacement.is_finite() {
            format!("{:.4}", state.max_displacement)
        } else {
            "-".to_string()
        };
        eprintln!(
            "  step {} alpha {:.4} max displacement {}",
            state.tick, state.alpha, moved
        );
    }

    fn on_finish(&self, run: &LayoutRun) {
        eprintln!(
            "  finished after {} steps (converged: {}, cooled: {})",
            run.steps, run.converged, run.cooled
        );
    }
}

pub fn execute(
    dataset_path: PathBuf,
    steps: Option<usize>,
    seed: Option<u64>,
    trace: bool,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let (dataset, mut config) = load_inputs(&dataset_path, config_path)?;
    if let Some(steps) = steps {
        config.layout.max_steps = steps;
    }
    if let Some(seed) = seed {
        config.layout.seed = seed;
    }

    let graph = build_gap_graph(&dataset.entities, dataset.primary(), config.graph.min_overlap);
    let observer: &dyn LayoutObserver = if trace { &TraceObserver } else { &NoopObserver };
    let summary = layout_gap_graph(&graph, &config.layout, None, observer);

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!(
        "{} nodes, {} edges, {} steps ({})",
        summary.positions.len(),
        summary.edges.len(),
        summary.steps,
        summary.status()
    );

    if !summary.positions.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Topic", "Primary", "x", "y", "Radius"]);
        for p in &summary.positions {
            let primary = graph
                .nodes
                .iter()
                .any(|n| n.id == p.id && n.is_primary_user_gap);
            table.add_row(vec![
                Cell::new(&p.id),
                Cell::new(if primary { "yes" } else { "" }),
                Cell::new(format!("{:.1}", p.x)),
                Cell::new(format!("{:.1}", p.y)),
                Cell::new(format!("{:.1}", p.radius)),
            ]);
        }
        println!("{table}");
    }

    if !summary.edges.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Edge", "Overlap", "Strength", "Color"]);
        for e in &summary.edges {
            table.add_row(vec![
                Cell::new(format!("{} - {}", e.source, e.target)),
                Cell::new(format!("{:.0}%", e.overlap_strength)),
                Cell::new(e.strength.label()),
                Cell::new(&e.color),
            ]);
        }
        println!("{table}");
    }

    Ok(())
}

//! Quick analysis example: minimal programmatic usage of gapscope.
//!
//! Analyzes a small inline cohort through the engine, then lays out its
//! gap graph by calling `ForceLayout::step` from the caller's own loop.
//!
//! ```bash
//! cargo run -p gapscope-core --example quick_analysis
//! ```

use std::path::Path;

use gapscope_core::aggregate::build_gap_graph;
use gapscope_core::config::GapscopeConfig;
use gapscope_core::engine::AnalyticsEngine;
use gapscope_core::layout::ForceLayout;
use gapscope_core::parser::parse_dataset_str;

const COHORT: &str = r#"
[dataset]
id = "quick"
name = "Quick Cohort"
primary_entity = "ana"

[[entities]]
id = "ana"
name = "Ana"
completed_units = 30
weak_topics = [
    { topic = "Fractions", intensity = 0.8, time_lost_minutes = 40.0 },
    { topic = "Ratios", intensity = 0.6, time_lost_minutes = 25.0 },
    { topic = "Percentages", intensity = 0.5, time_lost_minutes = 15.0 },
]

[[entities]]
id = "ben"
name = "Ben"
completed_units = 27
weak_topics = [
    { topic = "Fractions", intensity = 0.7, time_lost_minutes = 35.0 },
    { topic = "Ratios", intensity = 0.9, time_lost_minutes = 50.0 },
    { topic = "Percentages", intensity = 0.4, time_lost_minutes = 10.0 },
]

[[entities]]
id = "cleo"
name = "Cleo"
completed_units = 12
weak_topics = [{ topic = "Geometry", intensity = 0.5, time_lost_minutes = 20.0 }]

[[series]]
id = "ana-quiz"
entity = "ana"
label = "Weekly quiz"
points = [{ value = 52.0 }, { value = 58.0 }, { value = 61.0 }, { value = 67.0 }]
"#;

fn main() -> anyhow::Result<()> {
    // Parse the dataset and use default settings
    let dataset = parse_dataset_str(COHORT, Path::new("quick.toml"))?;
    println!("Loaded dataset: {} ({} learners)", dataset.name, dataset.entities.len());
    let config = GapscopeConfig::default();

    // Run every analysis and print the markdown summary
    let mut engine = AnalyticsEngine::new(config.clone());
    let report = engine.analyze(&dataset)?;
    print!("{}", report.to_markdown());

    // Drive the layout tick by tick; `step` never mutates its input
    let graph = build_gap_graph(&dataset.entities, dataset.primary(), config.graph.min_overlap);
    let layout = ForceLayout::new(&graph, config.layout.clone());
    let mut state = layout.initial_state(config.layout.seed);
    while state.tick < 50 {
        state = layout.step(&state);
        if state.tick % 10 == 0 {
            println!(
                "tick {:>3}  alpha {:.3}  max displacement {:.2}",
                state.tick, state.alpha, state.max_displacement
            );
        }
    }

    for p in state.positions() {
        println!("{:<12} ({:>6.1}, {:>6.1})  r={:.1}", p.id, p.x, p.y, p.radius);
    }
    Ok(())
}

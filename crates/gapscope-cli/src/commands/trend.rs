//! The `gapscope trend` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use gapscope_core::engine::series_trends;

use super::load_inputs;

pub fn execute(
    dataset_path: PathBuf,
    series: Option<String>,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let (mut dataset, config) = load_inputs(&dataset_path, config_path)?;

    if let Some(id) = &series {
        dataset.series.retain(|s| &s.id == id);
        anyhow::ensure!(!dataset.series.is_empty(), "series not found: {id}");
    }

    let trends = series_trends(&dataset, config.trend.flat_slope_threshold)?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&trends)?);
        return Ok(());
    }

    if trends.is_empty() {
        println!("No series in dataset.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Series", "Points", "Slope", "Intercept", "r", "Direction"]);
    for t in &trends {
        table.add_row(vec![
            Cell::new(&t.series_id),
            Cell::new(t.points),
            Cell::new(format!("{:+.3}", t.trend.slope)),
            Cell::new(format!("{:.2}", t.trend.intercept)),
            Cell::new(format!("{:.3}", t.trend.correlation)),
            Cell::new(t.direction),
        ]);
    }
    println!("{table}");

    Ok(())
}

//! The `gapscope sync` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use gapscope_core::sync::peer_sync;

use super::{display_name, load_inputs};

pub fn execute(dataset_path: PathBuf, format: String, config_path: Option<PathBuf>) -> Result<()> {
    let (dataset, config) = load_inputs(&dataset_path, config_path)?;
    let pairs = peer_sync(&dataset, config.sync.minutes_per_unit);

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&pairs)?);
        return Ok(());
    }

    if pairs.is_empty() {
        println!("Not enough entities to compare.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Learner", "Peer", "Elapsed", "Score", "Band"]);
    for pair in &pairs {
        table.add_row(vec![
            Cell::new(display_name(&dataset, &pair.entity_a)),
            Cell::new(display_name(&dataset, &pair.entity_b)),
            Cell::new(format!("{:.0} / {:.0} min", pair.elapsed_a, pair.elapsed_b)),
            Cell::new(format!("{:.1}", pair.result.score)),
            Cell::new(pair.result.band),
        ]);
    }
    println!("{table}");

    Ok(())
}

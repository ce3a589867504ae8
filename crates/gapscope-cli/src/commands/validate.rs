//! The `gapscope validate` command.

use std::path::PathBuf;

use anyhow::Result;

use gapscope_core::parser;

pub fn execute(dataset_path: PathBuf) -> Result<()> {
    let datasets = if dataset_path.is_dir() {
        parser::load_dataset_directory(&dataset_path)?
    } else {
        vec![parser::parse_dataset(&dataset_path)?]
    };

    let mut total_warnings = 0;

    for dataset in &datasets {
        let name = if dataset.name.is_empty() {
            &dataset.id
        } else {
            &dataset.name
        };
        println!(
            "Dataset: {} ({} entities, {} series)",
            name,
            dataset.entities.len(),
            dataset.series.len()
        );

        let warnings = parser::validate_dataset(dataset);
        for w in &warnings {
            let prefix = w
                .subject
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All datasets valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}

pub mod analyze;
pub mod cluster;
pub mod init;
pub mod layout;
pub mod sync;
pub mod trend;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::Result;

use gapscope_core::config::{load_config_from, GapscopeConfig};
use gapscope_core::model::Dataset;
use gapscope_core::parser;

/// Load a dataset file and the effective configuration.
pub(crate) fn load_inputs(
    dataset_path: &Path,
    config_path: Option<PathBuf>,
) -> Result<(Dataset, GapscopeConfig)> {
    let config = load_config_from(config_path.as_deref())?;
    let dataset = parser::parse_dataset(dataset_path)?;
    tracing::debug!(
        dataset = %dataset.id,
        entities = dataset.entities.len(),
        "loaded dataset"
    );
    Ok((dataset, config))
}

/// Entity display name, falling back to its id.
pub(crate) fn display_name<'a>(dataset: &'a Dataset, id: &'a str) -> &'a str {
    dataset
        .entity(id)
        .map(|e| e.name.as_str())
        .filter(|name| !name.is_empty())
        .unwrap_or(id)
}

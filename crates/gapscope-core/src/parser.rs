//! Dataset file parser.
//!
//! Loads datasets from TOML or JSON files and directories, checks their
//! referential integrity, and validates them for non-fatal issues.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::aggregate::reindex_series;
use crate::error::DatasetError;
use crate::model::{Dataset, Entity, TimeSeries};

/// On-disk encoding of a dataset file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Toml,
    Json,
}

impl DatasetFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, DatasetError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(DatasetFormat::Toml),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(DatasetFormat::Json),
            _ => Err(DatasetError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Intermediate structure shared by TOML and JSON dataset files.
#[derive(Debug, Deserialize)]
struct DatasetFile {
    dataset: DatasetHeader,
    #[serde(default)]
    entities: Vec<Entity>,
    #[serde(default)]
    series: Vec<TimeSeries>,
}

#[derive(Debug, Deserialize)]
struct DatasetHeader {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    primary_entity: Option<String>,
}

/// Parse a single dataset file.
pub fn parse_dataset(path: &Path) -> Result<Dataset> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read dataset file: {}", path.display()))?;

    parse_dataset_str(&content, path)
}

/// Parse dataset content; the format is taken from `source_path`'s extension.
pub fn parse_dataset_str(content: &str, source_path: &Path) -> Result<Dataset> {
    let parsed: DatasetFile = match DatasetFormat::from_path(source_path)? {
        DatasetFormat::Toml => toml::from_str(content)
            .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?,
        DatasetFormat::Json => serde_json::from_str(content)
            .with_context(|| format!("failed to parse JSON: {}", source_path.display()))?,
    };

    let dataset = Dataset {
        id: parsed.dataset.id,
        name: parsed.dataset.name,
        primary_entity: parsed.dataset.primary_entity,
        entities: parsed.entities,
        series: parsed.series,
    };

    check_integrity(&dataset)
        .with_context(|| format!("invalid dataset: {}", source_path.display()))?;
    Ok(dataset)
}

/// Reject datasets whose references cannot be resolved.
pub fn check_integrity(dataset: &Dataset) -> Result<(), DatasetError> {
    let mut ids = HashSet::new();
    for entity in &dataset.entities {
        if !ids.insert(entity.id.as_str()) {
            return Err(DatasetError::DuplicateEntity(entity.id.clone()));
        }
    }

    if let Some(primary) = &dataset.primary_entity {
        if !ids.contains(primary.as_str()) {
            return Err(DatasetError::UnknownPrimary(primary.clone()));
        }
    }

    for series in &dataset.series {
        if let Some(entity) = &series.entity {
            if !ids.contains(entity.as_str()) {
                return Err(DatasetError::UnknownSeriesEntity {
                    series: series.id.clone(),
                    entity: entity.clone(),
                });
            }
        }
        reindex_series(series)?;
    }

    Ok(())
}

/// Recursively load all `.toml` and `.json` dataset files from a directory.
pub fn load_dataset_directory(dir: &Path) -> Result<Vec<Dataset>> {
    let mut datasets = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut paths = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    paths.sort();

    for path in paths {
        if path.is_dir() {
            datasets.extend(load_dataset_directory(&path)?);
        } else if DatasetFormat::from_path(&path).is_ok() {
            match parse_dataset(&path) {
                Ok(dataset) => datasets.push(dataset),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(datasets)
}

/// A non-fatal issue found in a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationWarning {
    /// The entity or series the warning refers to, if any.
    pub subject: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate a dataset for values that will be clamped or ignored.
pub fn validate_dataset(dataset: &Dataset) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if dataset.entities.is_empty() {
        warnings.push(ValidationWarning {
            subject: None,
            message: "dataset has no entities".into(),
        });
    }

    for entity in &dataset.entities {
        let mut seen = HashSet::new();
        for gap in &entity.weak_topics {
            if gap.topic.trim().is_empty() {
                warnings.push(ValidationWarning {
                    subject: Some(entity.id.clone()),
                    message: "weak topic with empty label".into(),
                });
                continue;
            }
            if !seen.insert(gap.topic.as_str()) {
                warnings.push(ValidationWarning {
                    subject: Some(entity.id.clone()),
                    message: format!("topic '{}' listed more than once", gap.topic),
                });
            }
            if !(0.0..=1.0).contains(&gap.intensity) {
                warnings.push(ValidationWarning {
                    subject: Some(entity.id.clone()),
                    message: format!(
                        "intensity {} for '{}' is outside [0, 1] and will be clamped",
                        gap.intensity, gap.topic
                    ),
                });
            }
            if gap.time_lost_minutes.is_some_and(|t| t < 0.0 || t.is_nan()) {
                warnings.push(ValidationWarning {
                    subject: Some(entity.id.clone()),
                    message: format!("time lost for '{}' is negative and will be ignored", gap.topic),
                });
            }
        }
    }

    for series in &dataset.series {
        match series.points.len() {
            0 => warnings.push(ValidationWarning {
                subject: Some(series.id.clone()),
                message: "series has no points".into(),
            }),
            1 => warnings.push(ValidationWarning {
                subject: Some(series.id.clone()),
                message: "series has a single point; its trend will be flat".into(),
            }),
            _ => {}
        }
    }

    warnings
}

//! Dataset error types.
//!
//! The analytics modules never fail: degenerate input produces neutral
//! results. These errors describe datasets that are structurally unusable and
//! are raised while loading them, before any analysis runs.

use thiserror::Error;

/// Structural problems in a dataset file.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DatasetError {
    /// Two entities share the same id.
    #[error("duplicate entity id: {0}")]
    DuplicateEntity(String),

    /// `primary_entity` names an entity that is not in the dataset.
    #[error("primary entity not found: {0}")]
    UnknownPrimary(String),

    /// A series is attached to an entity that is not in the dataset.
    #[error("series '{series}' references unknown entity '{entity}'")]
    UnknownSeriesEntity { series: String, entity: String },

    /// A series mixes dated points with index-only points.
    #[error("series '{0}' mixes dated and indexed points")]
    MixedSeriesPoints(String),

    /// The file extension is neither `.toml` nor `.json`.
    #[error("unsupported dataset format: {0}")]
    UnsupportedFormat(String),
}

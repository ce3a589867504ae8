//! Engine configuration and loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::clustering::DEFAULT_MIN_SHARED_TOPICS;
use crate::layout::LayoutConfig;
use crate::sync::DEFAULT_MINUTES_PER_UNIT;

/// Top-level gapscope configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GapscopeConfig {
    #[serde(default)]
    pub clustering: ClusteringConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub trend: TrendConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Gap clustering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteringConfig {
    /// Minimum number of shared weak topics for two learners to cluster.
    #[serde(default = "default_min_shared")]
    pub min_shared_topics: usize,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            min_shared_topics: default_min_shared(),
        }
    }
}

fn default_min_shared() -> usize {
    DEFAULT_MIN_SHARED_TOPICS
}

/// Sync score settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Minutes credited per completed unit when deriving elapsed time.
    #[serde(default = "default_minutes_per_unit")]
    pub minutes_per_unit: f64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            minutes_per_unit: default_minutes_per_unit(),
        }
    }
}

fn default_minutes_per_unit() -> f64 {
    DEFAULT_MINUTES_PER_UNIT
}

/// Trend classification settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendConfig {
    /// Slopes within ± this many units per step count as flat.
    #[serde(default = "default_flat_slope")]
    pub flat_slope_threshold: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            flat_slope_threshold: default_flat_slope(),
        }
    }
}

fn default_flat_slope() -> f64 {
    0.5
}

/// Gap-graph derivation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Edges with a lower overlap strength are not drawn or simulated.
    #[serde(default = "default_min_overlap")]
    pub min_overlap: f64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            min_overlap: default_min_overlap(),
        }
    }
}

fn default_min_overlap() -> f64 {
    10.0
}

/// Memoization settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of memoized analyses (0 disables the cache).
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

fn default_capacity() -> usize {
    16
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `gapscope.toml` in the current directory
/// 2. `~/.config/gapscope/config.toml`
///
/// Environment variable overrides: `GAPSCOPE_MIN_SHARED_TOPICS`,
/// `GAPSCOPE_MINUTES_PER_UNIT`, `GAPSCOPE_LAYOUT_SEED`.
pub fn load_config() -> Result<GapscopeConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<GapscopeConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("gapscope.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => GapscopeConfig::default(),
    };

    apply_env_overrides(&mut config)?;
    Ok(config)
}

/// Parse a TOML config string.
pub fn parse_config(content: &str) -> Result<GapscopeConfig> {
    let config: GapscopeConfig = toml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &GapscopeConfig) -> Result<()> {
    let layout = &config.layout;
    anyhow::ensure!(
        config.sync.minutes_per_unit >= 0.0,
        "sync.minutes_per_unit must not be negative"
    );
    anyhow::ensure!(
        layout.min_node_radius >= 0.0 && layout.max_node_radius >= layout.min_node_radius,
        "layout node radii must satisfy 0 <= min_node_radius <= max_node_radius"
    );
    anyhow::ensure!(
        layout.alpha_min > 0.0 && layout.alpha_min < 1.0,
        "layout.alpha_min must be between 0 and 1"
    );
    anyhow::ensure!(
        (0.0..=1.0).contains(&layout.velocity_decay),
        "layout.velocity_decay must be between 0 and 1"
    );
    anyhow::ensure!(layout.decay_steps >= 1, "layout.decay_steps must be at least 1");
    anyhow::ensure!(
        layout.width > 0.0 && layout.height > 0.0,
        "layout canvas must have a positive size"
    );
    Ok(())
}

fn apply_env_overrides(config: &mut GapscopeConfig) -> Result<()> {
    if let Ok(value) = std::env::var("GAPSCOPE_MIN_SHARED_TOPICS") {
        config.clustering.min_shared_topics = value
            .trim()
            .parse()
            .with_context(|| format!("invalid GAPSCOPE_MIN_SHARED_TOPICS: '{value}'"))?;
    }
    if let Ok(value) = std::env::var("GAPSCOPE_MINUTES_PER_UNIT") {
        config.sync.minutes_per_unit = value
            .trim()
            .parse()
            .with_context(|| format!("invalid GAPSCOPE_MINUTES_PER_UNIT: '{value}'"))?;
    }
    if let Ok(value) = std::env::var("GAPSCOPE_LAYOUT_SEED") {
        config.layout.seed = value
            .trim()
            .parse()
            .with_context(|| format!("invalid GAPSCOPE_LAYOUT_SEED: '{value}'"))?;
    }
    validate_config(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("gapscope"))
}

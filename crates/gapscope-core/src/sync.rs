//! Pairwise progress-synchronization score.
//!
//! Two learners are "in sync" when their cumulative elapsed-time proxies are
//! close relative to the larger of the two.

use serde::{Deserialize, Serialize};

use crate::model::{clamp_non_negative, Dataset, Entity};

/// Default minutes credited per completed unit.
pub const DEFAULT_MINUTES_PER_UNIT: f64 = 2.0;

/// Cumulative elapsed-time proxy: `completed_units × minutes_per_unit`.
pub fn elapsed_proxy(completed_units: u32, minutes_per_unit: f64) -> f64 {
    completed_units as f64 * clamp_non_negative(minutes_per_unit)
}

/// `100 − |a − b| / max(a, b) × 100`, clamped to `[0, 100]`.
///
/// Two agents with no progress at all are defined as perfectly in sync.
/// Negative or non-finite inputs are treated as zero progress.
pub fn sync_score(a: f64, b: f64) -> f64 {
    let a = clamp_non_negative(a);
    let b = clamp_non_negative(b);
    let max = a.max(b);
    if max == 0.0 {
        return 100.0;
    }
    (100.0 - (a - b).abs() / max * 100.0).clamp(0.0, 100.0)
}

/// Display band of a sync score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncBand {
    Perfect,
    Excellent,
    Good,
    Fair,
    Poor,
}

impl SyncBand {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 90.0 => SyncBand::Perfect,
            s if s >= 80.0 => SyncBand::Excellent,
            s if s >= 70.0 => SyncBand::Good,
            s if s >= 60.0 => SyncBand::Fair,
            _ => SyncBand::Poor,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SyncBand::Perfect => "Perfect",
            SyncBand::Excellent => "Excellent",
            SyncBand::Good => "Good",
            SyncBand::Fair => "Fair",
            SyncBand::Poor => "Poor",
        }
    }
}

impl std::fmt::Display for SyncBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A sync score with its band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyncResult {
    pub score: f64,
    pub band: SyncBand,
}

impl SyncResult {
    pub fn between(a: f64, b: f64) -> Self {
        let score = sync_score(a, b);
        Self {
            score,
            band: SyncBand::from_score(score),
        }
    }

    pub fn label(&self) -> &'static str {
        self.band.label()
    }
}

/// Sync result between two named entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairSync {
    pub entity_a: String,
    pub entity_b: String,
    pub elapsed_a: f64,
    pub elapsed_b: f64,
    pub result: SyncResult,
}

/// Compare two entities by their completed-unit proxies.
pub fn sync_entities(a: &Entity, b: &Entity, minutes_per_unit: f64) -> PairSync {
    let elapsed_a = elapsed_proxy(a.completed_units, minutes_per_unit);
    let elapsed_b = elapsed_proxy(b.completed_units, minutes_per_unit);
    PairSync {
        entity_a: a.id.clone(),
        entity_b: b.id.clone(),
        elapsed_a,
        elapsed_b,
        result: SyncResult::between(elapsed_a, elapsed_b),
    }
}

/// Sync the primary entity against every peer, or every unordered pair when
/// the dataset declares no primary entity.
pub fn peer_sync(dataset: &Dataset, minutes_per_unit: f64) -> Vec<PairSync> {
    if let Some(primary) = dataset.primary() {
        return dataset
            .entities
            .iter()
            .filter(|e| e.id != primary.id)
            .map(|peer| sync_entities(primary, peer, minutes_per_unit))
            .collect();
    }

    let mut pairs = Vec::new();
    for (i, a) in dataset.entities.iter().enumerate() {
        for b in &dataset.entities[i + 1..] {
            pairs.push(sync_entities(a, b, minutes_per_unit));
        }
    }
    pairs
}

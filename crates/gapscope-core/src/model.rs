//! Core data model types for gapscope.
//!
//! These are the input snapshots (entities, gap graphs, time series) and the
//! derived outputs (clusters, trends) shared by every analytics module.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A learner (or any agent) with weak-topic records and progress counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier for this entity.
    pub id: String,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// Weak-topic records for this entity.
    #[serde(default)]
    pub weak_topics: Vec<WeakTopic>,
    /// Number of completed units (questions, lessons, ...).
    #[serde(default)]
    pub completed_units: u32,
    /// Recorded elapsed study time in minutes, if the host tracks it.
    #[serde(default)]
    pub elapsed_minutes: Option<f64>,
}

impl Entity {
    /// Create an entity with the given topics at full intensity.
    pub fn with_topics(id: impl Into<String>, topics: &[&str]) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            weak_topics: topics.iter().map(|t| WeakTopic::new(*t, 1.0)).collect(),
            completed_units: 0,
            elapsed_minutes: None,
        }
    }

    /// Iterate over the topic labels of this entity (duplicates included).
    pub fn topic_labels(&self) -> impl Iterator<Item = &str> {
        self.weak_topics.iter().map(|g| g.topic.as_str())
    }

    /// Returns `true` if this entity has a weak-topic record for `topic`.
    pub fn has_topic(&self, topic: &str) -> bool {
        self.weak_topics.iter().any(|g| g.topic == topic)
    }
}

/// A weak-topic (gap) record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeakTopic {
    /// Topic label.
    pub topic: String,
    /// How severe the gap is, nominally in `[0, 1]`.
    #[serde(default)]
    pub intensity: f64,
    /// Average time lost on this topic, in minutes.
    #[serde(default)]
    pub time_lost_minutes: Option<f64>,
}

impl WeakTopic {
    pub fn new(topic: impl Into<String>, intensity: f64) -> Self {
        Self {
            topic: topic.into(),
            intensity,
            time_lost_minutes: None,
        }
    }

    /// Intensity clamped to `[0, 1]`.
    pub fn clamped_intensity(&self) -> f64 {
        clamp_unit(self.intensity)
    }

    /// Time lost clamped to be non-negative, if recorded.
    pub fn clamped_time_lost(&self) -> Option<f64> {
        self.time_lost_minutes.map(clamp_non_negative)
    }
}

/// A 2-D position on the layout canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// A node of the gap-overlap graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapNode {
    /// Topic label.
    pub id: String,
    /// Scalar weight (e.g. average time lost).
    #[serde(default)]
    pub weight: f64,
    /// Whether the primary user holds this gap (vs. a peer-only gap).
    #[serde(default)]
    pub is_primary_user_gap: bool,
    /// Known position, used as the starting point of a layout.
    #[serde(default)]
    pub position: Option<Point>,
}

impl GapNode {
    pub fn new(id: impl Into<String>, weight: f64) -> Self {
        Self {
            id: id.into(),
            weight,
            is_primary_user_gap: false,
            position: None,
        }
    }
}

/// An undirected edge of the gap-overlap graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapEdge {
    pub source: String,
    pub target: String,
    /// How often the two topics co-occur, nominally in `[0, 100]`.
    pub overlap_strength: f64,
}

impl GapEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>, overlap_strength: f64) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            overlap_strength,
        }
    }

    /// Overlap strength clamped to `[0, 100]`.
    pub fn clamped_strength(&self) -> f64 {
        clamp_percent(self.overlap_strength)
    }
}

/// Gap-overlap graph fed to the force layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GapGraph {
    #[serde(default)]
    pub nodes: Vec<GapNode>,
    #[serde(default)]
    pub edges: Vec<GapEdge>,
}

/// A topic shared by two or more cluster members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonGap {
    pub topic: String,
    /// Number of cluster members holding this topic.
    pub count: usize,
}

/// A group of entities sharing weak topics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Member ids, seed first, then in input order.
    pub member_ids: Vec<String>,
    /// Topics held by at least two members.
    pub common_gaps: Vec<CommonGap>,
    /// Mean intensity over every gap record of every member.
    pub avg_intensity: f64,
}

impl Cluster {
    pub fn contains(&self, id: &str) -> bool {
        self.member_ids.iter().any(|m| m == id)
    }

    /// Topic labels of the common gaps, in order.
    pub fn common_topics(&self) -> Vec<&str> {
        self.common_gaps.iter().map(|g| g.topic.as_str()).collect()
    }
}

/// A point of an ordinal time series (`index` is `0..n-1` after re-indexing).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub index: usize,
    pub value: f64,
}

/// A date-stamped point, re-indexed by date before fitting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DatedPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// A raw series point as it appears in dataset files.
///
/// Carries either an explicit `index`, a `date`, or neither (input order).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub value: f64,
}

/// A named time series (e.g. weekly mock-exam scores of one learner).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub id: String,
    /// Entity this series belongs to, if any.
    #[serde(default)]
    pub entity: Option<String>,
    /// Display label (e.g. "Mock exam score").
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub points: Vec<SeriesPoint>,
}

/// Least-squares line fit. `correlation` is the absolute Pearson coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrendResult {
    pub slope: f64,
    pub intercept: f64,
    pub correlation: f64,
}

impl TrendResult {
    /// Evaluate the fitted line at `x`.
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// A full input snapshot for one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Unique identifier for this dataset.
    pub id: String,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// Entity the dashboard is rendered for; peer comparisons are made against it.
    #[serde(default)]
    pub primary_entity: Option<String>,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub series: Vec<TimeSeries>,
}

impl Dataset {
    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn primary(&self) -> Option<&Entity> {
        self.primary_entity.as_deref().and_then(|id| self.entity(id))
    }
}

/// Clamp to `[0, 1]`; non-finite values become `0`.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Clamp to `[0, 100]`; non-finite values become `0`.
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Clamp to `[0, inf)`; non-finite values become `0`.
pub fn clamp_non_negative(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

//! Analytics report types with JSON persistence and markdown rendering.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::{EntitySummary, TopicSummary};
use crate::layout::{ClassifiedEdge, NodePosition};
use crate::model::{Cluster, Dataset, TrendResult};
use crate::regression::TrendDirection;
use crate::sync::PairSync;

/// A complete analytics report for one dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Summary of the analyzed dataset.
    pub dataset: DatasetSummary,
    /// Derived metrics.
    pub analysis: Analysis,
    /// Whether the analysis was served from the memo cache.
    #[serde(default)]
    pub cache_hit: bool,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Summary of a dataset (without its records).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub id: String,
    pub name: String,
    pub primary_entity: Option<String>,
    pub entity_count: usize,
    pub series_count: usize,
}

impl DatasetSummary {
    pub fn of(dataset: &Dataset) -> Self {
        Self {
            id: dataset.id.clone(),
            name: dataset.name.clone(),
            primary_entity: dataset.primary_entity.clone(),
            entity_count: dataset.entities.len(),
            series_count: dataset.series.len(),
        }
    }
}

/// Every derived metric of one analysis pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub clusters: Vec<Cluster>,
    /// Entities in no cluster, in input order.
    pub unclustered: Vec<String>,
    pub entities: Vec<EntitySummary>,
    pub trends: Vec<SeriesTrend>,
    pub sync: Vec<PairSync>,
    pub topics: Vec<TopicSummary>,
    pub layout: LayoutSummary,
}

/// Trend of one time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesTrend {
    pub series_id: String,
    pub entity: Option<String>,
    pub label: String,
    /// Number of points that entered the fit.
    pub points: usize,
    pub trend: TrendResult,
    pub direction: TrendDirection,
}

/// Final gap-graph layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutSummary {
    pub positions: Vec<NodePosition>,
    pub edges: Vec<ClassifiedEdge>,
    pub steps: usize,
    /// Last step moved every node less than `epsilon`.
    pub converged: bool,
    /// Alpha dropped below `alpha_min` before the layout settled.
    #[serde(default)]
    pub cooled: bool,
    /// Whether the run restarted from a previous layout of the same dataset.
    #[serde(default)]
    pub warm_started: bool,
}

impl LayoutSummary {
    /// Why the simulation stopped.
    pub fn status(&self) -> &'static str {
        if self.converged {
            "converged"
        } else if self.cooled {
            "cooled"
        } else {
            "step budget exhausted"
        }
    }
}

impl AnalyticsReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: AnalyticsReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let analysis = &self.analysis;
        let mut md = String::new();

        let title = if self.dataset.name.is_empty() {
            &self.dataset.id
        } else {
            &self.dataset.name
        };
        md.push_str(&format!("# Gap analysis: {title}\n\n"));
        md.push_str(&format!(
            "**Summary:** {} entities, {} clusters, {} unclustered, {} series\n\n",
            self.dataset.entity_count,
            analysis.clusters.len(),
            analysis.unclustered.len(),
            self.dataset.series_count
        ));

        if !analysis.clusters.is_empty() {
            md.push_str("## Clusters\n\n");
            md.push_str("| # | Members | Common gaps | Avg intensity |\n");
            md.push_str("|---|---------|-------------|---------------|\n");
            for (i, cluster) in analysis.clusters.iter().enumerate() {
                let gaps: Vec<String> = cluster
                    .common_gaps
                    .iter()
                    .map(|g| format!("{} ({})", g.topic, g.count))
                    .collect();
                md.push_str(&format!(
                    "| {} | {} | {} | {:.2} |\n",
                    i + 1,
                    cluster.member_ids.join(", "),
                    gaps.join(", "),
                    cluster.avg_intensity
                ));
            }
            md.push('\n');
        }

        if !analysis.trends.is_empty() {
            md.push_str("## Trends\n\n");
            md.push_str("| Series | Points | Slope | Intercept | r | Direction |\n");
            md.push_str("|--------|--------|-------|-----------|---|-----------|\n");
            for t in &analysis.trends {
                md.push_str(&format!(
                    "| {} | {} | {:+.3} | {:.2} | {:.3} | {} |\n",
                    t.series_id,
                    t.points,
                    t.trend.slope,
                    t.trend.intercept,
                    t.trend.correlation,
                    t.direction
                ));
            }
            md.push('\n');
        }

        if !analysis.sync.is_empty() {
            md.push_str("## Sync\n\n");
            md.push_str("| Pair | Elapsed | Score | Band |\n");
            md.push_str("|------|---------|-------|------|\n");
            for s in &analysis.sync {
                md.push_str(&format!(
                    "| {} / {} | {:.0} / {:.0} | {:.1} | {} |\n",
                    s.entity_a, s.entity_b, s.elapsed_a, s.elapsed_b, s.result.score, s.result.band
                ));
            }
            md.push('\n');
        }

        if !analysis.topics.is_empty() {
            md.push_str("## Topics\n\n");
            md.push_str("| Topic | Learners | Avg time lost | Avg intensity |\n");
            md.push_str("|-------|----------|---------------|---------------|\n");
            for t in &analysis.topics {
                md.push_str(&format!(
                    "| {} | {} | {:.1} | {:.2} |\n",
                    t.topic, t.learner_count, t.avg_time_lost, t.avg_intensity
                ));
            }
            md.push('\n');
        }

        let layout = &analysis.layout;
        md.push_str(&format!(
            "Layout: {} nodes, {} edges, {} steps ({})\n",
            layout.positions.len(),
            layout.edges.len(),
            layout.steps,
            layout.status()
        ));

        md
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CommonGap;
    use crate::sync::SyncResult;

    fn make_report() -> AnalyticsReport {
        AnalyticsReport {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            dataset: DatasetSummary {
                id: "cohort".into(),
                name: "Spring Cohort".into(),
                primary_entity: Some("a".into()),
                entity_count: 3,
                series_count: 1,
            },
            analysis: Analysis {
                clusters: vec![Cluster {
                    member_ids: vec!["a".into(), "b".into()],
                    common_gaps: vec![CommonGap {
                        topic: "Optics".into(),
                        count: 2,
                    }],
                    avg_intensity: 0.55,
                }],
                unclustered: vec!["c".into()],
                trends: vec![SeriesTrend {
                    series_id: "a-scores".into(),
                    entity: Some("a".into()),
                    label: "Mock exam".into(),
                    points: 4,
                    trend: TrendResult {
                        slope: 2.0,
                        intercept: 60.0,
                        correlation: 0.98,
                    },
                    direction: TrendDirection::Improving,
                }],
                sync: vec![PairSync {
                    entity_a: "a".into(),
                    entity_b: "b".into(),
                    elapsed_a: 80.0,
                    elapsed_b: 72.0,
                    result: SyncResult::between(80.0, 72.0),
                }],
                ..Default::default()
            },
            cache_hit: false,
            duration_ms: 3,
        }
    }

    #[test]
    fn json_roundtrip() {
        let report = make_report();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("report.json");
        report.save_json(&path).unwrap();
        let loaded = AnalyticsReport::load_json(&path).unwrap();
        assert_eq!(loaded.id, report.id);
        assert_eq!(loaded.analysis, report.analysis);
    }

    #[test]
    fn markdown_output() {
        let md = make_report().to_markdown();
        assert!(md.contains("# Gap analysis: Spring Cohort"));
        assert!(md.contains("| 1 | a, b | Optics (2) | 0.55 |"));
        assert!(md.contains("| a-scores | 4 | +2.000 | 60.00 | 0.980 | improving |"));
        assert!(md.contains("| a / b | 80 / 72 | 90.0 | Perfect |"));
        // empty sections are omitted
        assert!(!md.contains("## Topics"));
    }

    #[test]
    fn load_missing_file_fails() {
        let err = AnalyticsReport::load_json(Path::new("/nonexistent/report.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read report"));
    }
}

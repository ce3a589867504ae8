//! Central analytics orchestrator.
//!
//! Runs every analysis over a dataset snapshot, memoizes the result by input
//! fingerprint, and remembers the last layout of each dataset so a changed
//! dataset restarts its simulation from where the previous one settled.

use std::collections::{HashMap, VecDeque};
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Utc;
use uuid::Uuid;

use crate::aggregate::{build_gap_graph, reindex_series, summarize_entity, topic_rollup};
use crate::cache::{CacheStats, Fingerprint, MemoCache};
use crate::clustering::{cluster_by_shared_gaps, unclustered_ids};
use crate::config::GapscopeConfig;
use crate::error::DatasetError;
use crate::layout::{ForceLayout, LayoutConfig, LayoutObserver, NodePosition, NoopObserver};
use crate::model::{Dataset, GapGraph};
use crate::parser::check_integrity;
use crate::regression::{fit_points, TrendDirection};
use crate::report::{Analysis, AnalyticsReport, DatasetSummary, LayoutSummary, SeriesTrend};
use crate::sync::peer_sync;

/// The central analytics engine.
pub struct AnalyticsEngine {
    config: GapscopeConfig,
    cache: MemoCache<Analysis>,
    last_layouts: HashMap<String, Vec<NodePosition>>,
    /// Dataset ids by last use, least recent first.
    layout_order: VecDeque<String>,
}

impl AnalyticsEngine {
    pub fn new(config: GapscopeConfig) -> Self {
        let cache = MemoCache::new(config.cache.capacity);
        Self {
            config,
            cache,
            last_layouts: HashMap::new(),
            layout_order: VecDeque::new(),
        }
    }

    pub fn config(&self) -> &GapscopeConfig {
        &self.config
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Last layout produced for `dataset_id`, if any.
    pub fn last_layout(&self, dataset_id: &str) -> Option<&[NodePosition]> {
        self.last_layouts.get(dataset_id).map(Vec::as_slice)
    }

    /// Drop the remembered layout of `dataset_id`, so its next analysis
    /// starts cold. Returns whether a layout was remembered.
    pub fn forget_layout(&mut self, dataset_id: &str) -> bool {
        self.layout_order.retain(|id| id != dataset_id);
        self.last_layouts.remove(dataset_id).is_some()
    }

    /// Keep at most as many layouts as the cache holds analyses, and at
    /// least one.
    fn remember_layout(&mut self, dataset_id: &str, positions: Vec<NodePosition>) {
        self.layout_order.retain(|id| id != dataset_id);
        self.layout_order.push_back(dataset_id.to_string());
        self.last_layouts.insert(dataset_id.to_string(), positions);

        let capacity = self.config.cache.capacity.max(1);
        while self.layout_order.len() > capacity {
            if let Some(evicted) = self.layout_order.pop_front() {
                tracing::debug!(dataset = %evicted, "dropping remembered layout");
                self.last_layouts.remove(&evicted);
            }
        }
    }

    /// Analyze a dataset.
    pub fn analyze(&mut self, dataset: &Dataset) -> Result<AnalyticsReport> {
        self.analyze_observed(dataset, &NoopObserver)
    }

    /// Analyze a dataset, reporting every layout step to `observer`.
    ///
    /// Cache hits skip the simulation, so the observer only sees steps of
    /// fresh analyses.
    pub fn analyze_observed(
        &mut self,
        dataset: &Dataset,
        observer: &dyn LayoutObserver,
    ) -> Result<AnalyticsReport> {
        let start = Instant::now();
        check_integrity(dataset).with_context(|| format!("invalid dataset: {}", dataset.id))?;

        let key = Fingerprint::of(dataset)?.combine(Fingerprint::of(&self.config)?);

        let (analysis, cache_hit) = match self.cache.get(key) {
            Some(analysis) => (analysis, true),
            None => {
                let previous = self.last_layouts.get(&dataset.id).map(Vec::as_slice);
                let analysis = compute_analysis(dataset, &self.config, previous, observer)?;
                (self.cache.insert(key, analysis), false)
            }
        };

        self.remember_layout(&dataset.id, analysis.layout.positions.clone());

        let report = AnalyticsReport {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            dataset: DatasetSummary::of(dataset),
            analysis: (*analysis).clone(),
            cache_hit,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        tracing::info!(
            dataset = %dataset.id,
            clusters = report.analysis.clusters.len(),
            cache_hit,
            duration_ms = report.duration_ms,
            "analysis complete"
        );
        Ok(report)
    }
}

/// Run every analysis over `dataset`.
///
/// `previous` positions, when given, warm-start the layout.
pub fn compute_analysis(
    dataset: &Dataset,
    config: &GapscopeConfig,
    previous: Option<&[NodePosition]>,
    observer: &dyn LayoutObserver,
) -> Result<Analysis, DatasetError> {
    let entities = &dataset.entities;

    tracing::info!(entities = entities.len(), "clustering");
    let clusters = cluster_by_shared_gaps(entities, config.clustering.min_shared_topics);
    let unclustered = unclustered_ids(entities, &clusters);

    tracing::info!(series = dataset.series.len(), "fitting trends");
    let trends = series_trends(dataset, config.trend.flat_slope_threshold)?;

    tracing::info!("scoring sync");
    let sync = peer_sync(dataset, config.sync.minutes_per_unit);
    let summaries = entities
        .iter()
        .map(|e| summarize_entity(e, config.sync.minutes_per_unit))
        .collect();
    let topics = topic_rollup(entities);

    let graph = build_gap_graph(entities, dataset.primary(), config.graph.min_overlap);
    tracing::info!(
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        "laying out gap graph"
    );
    let layout = layout_gap_graph(&graph, &config.layout, previous, observer);

    Ok(Analysis {
        clusters,
        unclustered,
        entities: summaries,
        trends,
        sync,
        topics,
        layout,
    })
}

/// Fit a trend to every series of `dataset`, in dataset order.
pub fn series_trends(
    dataset: &Dataset,
    flat_slope_threshold: f64,
) -> Result<Vec<SeriesTrend>, DatasetError> {
    dataset
        .series
        .iter()
        .map(|series| {
            let points = reindex_series(series)?;
            let trend = fit_points(&points);
            Ok(SeriesTrend {
                series_id: series.id.clone(),
                entity: series.entity.clone(),
                label: series.label.clone(),
                points: points.iter().filter(|p| p.value.is_finite()).count(),
                direction: TrendDirection::classify(&trend, flat_slope_threshold),
                trend,
            })
        })
        .collect()
}

/// Lay out `graph`, restarting from `previous` positions when available.
pub fn layout_gap_graph(
    graph: &GapGraph,
    config: &LayoutConfig,
    previous: Option<&[NodePosition]>,
    observer: &dyn LayoutObserver,
) -> LayoutSummary {
    let layout = ForceLayout::new(graph, config.clone());
    let (state, warm_started) = match previous {
        Some(prev) if !prev.is_empty() => (layout.warm_start(prev, config.seed), true),
        _ => (layout.initial_state(config.seed), false),
    };
    let run = layout.run_observed(state, config.max_steps, config.epsilon, observer);

    LayoutSummary {
        positions: run.state.positions(),
        edges: layout.edges().to_vec(),
        steps: run.steps,
        converged: run.converged,
        cooled: run.cooled,
        warm_started,
    }
}

//! Force-directed layout of the gap-overlap graph.
//!
//! A velocity-Verlet relaxation in the style of d3-force: link springs whose
//! rest length shrinks with overlap strength, uniform many-body repulsion,
//! radius-based collision and a weak centering pull. A decaying `alpha`
//! temperature scales the spring and charge forces so the system cools to a
//! fixed point.
//!
//! The physics is a pure function, [`ForceLayout::step`]; the caller owns the
//! loop. [`ForceLayout::run`] and [`ForceLayout::steps`] are convenience
//! drivers on top of it.

use std::collections::HashMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::model::{clamp_non_negative, clamp_percent, GapGraph, Point};

/// Tuning for the simulation and the node/edge visual mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Canvas width; the layout is centered on `(width / 2, height / 2)`.
    pub width: f64,
    pub height: f64,
    /// Rendered radius of the lightest node.
    pub min_node_radius: f64,
    /// Rendered radius of the heaviest node.
    pub max_node_radius: f64,
    /// Link rest length at zero overlap.
    pub link_base_distance: f64,
    /// Rest-length reduction per point of overlap strength.
    pub link_distance_scale: f64,
    /// Floor for the link rest length.
    pub min_link_distance: f64,
    /// Many-body charge; negative values repel.
    pub charge_strength: f64,
    /// Distance below which the charge stops growing.
    pub charge_distance_min: f64,
    /// Extra spacing added to the sum of two radii.
    pub collision_margin: f64,
    pub collision_strength: f64,
    /// Fraction of the centroid offset removed per step.
    pub center_strength: f64,
    pub alpha_min: f64,
    pub alpha_target: f64,
    /// Number of steps for alpha to cool from 1 to `alpha_min`.
    pub decay_steps: u32,
    /// Fraction of velocity lost per step.
    pub velocity_decay: f64,
    /// Alpha used when restarting from known positions.
    pub reheat_alpha: f64,
    /// Radius of the disk used for fresh node placement.
    pub initial_radius: f64,
    /// Step budget for [`ForceLayout::run`].
    pub max_steps: usize,
    /// Max per-node displacement below which the layout counts as converged.
    pub epsilon: f64,
    /// Seed for placement and coincident-node jitter.
    pub seed: u64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            min_node_radius: 20.0,
            max_node_radius: 40.0,
            link_base_distance: 150.0,
            link_distance_scale: 1.0,
            min_link_distance: 30.0,
            charge_strength: -300.0,
            charge_distance_min: 1.0,
            collision_margin: 10.0,
            collision_strength: 1.0,
            center_strength: 0.1,
            alpha_min: 0.001,
            alpha_target: 0.0,
            decay_steps: 300,
            velocity_decay: 0.4,
            reheat_alpha: 0.3,
            initial_radius: 100.0,
            max_steps: 300,
            epsilon: 0.01,
            seed: 42,
        }
    }
}

impl LayoutConfig {
    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// Per-step alpha decay so that alpha reaches `alpha_min` after `decay_steps`.
    pub fn alpha_decay(&self) -> f64 {
        let alpha_min = self.alpha_min.clamp(f64::MIN_POSITIVE, 1.0);
        1.0 - alpha_min.powf(1.0 / self.decay_steps.max(1) as f64)
    }

    /// Target rest length of a link with the given overlap strength.
    pub fn link_distance(&self, overlap_strength: f64) -> f64 {
        let overlap = clamp_percent(overlap_strength);
        (self.link_base_distance - overlap * self.link_distance_scale).max(self.min_link_distance)
    }
}

/// Rendered radius of a node: `min + (weight / max_weight) × (max − min)`.
pub fn node_radius(weight: f64, max_weight: f64, min_radius: f64, max_radius: f64) -> f64 {
    let weight = clamp_non_negative(weight);
    if max_weight <= 0.0 || !max_weight.is_finite() {
        return min_radius;
    }
    let ratio = (weight / max_weight).clamp(0.0, 1.0);
    min_radius + ratio * (max_radius - min_radius)
}

/// Visual class of an edge, by overlap strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeStrength {
    /// Overlap ≥ 60.
    Strong,
    /// Overlap in 40–59.
    Medium,
    /// Overlap < 40.
    Weak,
}

impl EdgeStrength {
    /// Classify a (clamped) overlap strength.
    pub fn classify(overlap_strength: f64) -> Self {
        let overlap = clamp_percent(overlap_strength);
        if overlap >= 60.0 {
            EdgeStrength::Strong
        } else if overlap >= 40.0 {
            EdgeStrength::Medium
        } else {
            EdgeStrength::Weak
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            EdgeStrength::Strong => "#ef4444",
            EdgeStrength::Medium => "#f59e0b",
            EdgeStrength::Weak => "#10b981",
        }
    }

    pub fn thickness(&self) -> f64 {
        match self {
            EdgeStrength::Strong => 4.0,
            EdgeStrength::Medium => 3.0,
            EdgeStrength::Weak => 2.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EdgeStrength::Strong => "strong",
            EdgeStrength::Medium => "medium",
            EdgeStrength::Weak => "weak",
        }
    }
}

/// An edge that survived endpoint resolution, with its visual class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedEdge {
    pub source: String,
    pub target: String,
    /// Clamped to `[0, 100]`.
    pub overlap_strength: f64,
    pub strength: EdgeStrength,
    pub color: String,
    pub thickness: f64,
}

/// A node's position as read by the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePosition {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

/// Kinematic state of one node.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NodeState {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
}

/// Simulation snapshot. Always valid to read, converged or not.
#[derive(Debug, Clone)]
pub struct LayoutState {
    ids: Arc<[String]>,
    radii: Arc<[f64]>,
    pub nodes: Vec<NodeState>,
    pub alpha: f64,
    pub tick: u64,
    /// Largest per-node move during the last step (`INFINITY` before the first).
    pub max_displacement: f64,
    seed: u64,
}

impl LayoutState {
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn positions(&self) -> Vec<NodePosition> {
        self.ids
            .iter()
            .zip(self.radii.iter())
            .zip(self.nodes.iter())
            .map(|((id, &radius), node)| NodePosition {
                id: id.clone(),
                x: node.x,
                y: node.y,
                radius,
            })
            .collect()
    }

    pub fn position(&self, id: &str) -> Option<Point> {
        self.ids
            .iter()
            .position(|n| n == id)
            .map(|i| Point::new(self.nodes[i].x, self.nodes[i].y))
    }

    /// Returns `true` once the last step moved every node less than `epsilon`.
    pub fn is_settled(&self, epsilon: f64) -> bool {
        self.max_displacement < epsilon
    }
}

/// Outcome of a driven run.
#[derive(Debug, Clone)]
pub struct LayoutRun {
    pub state: LayoutState,
    pub steps: usize,
    /// Last step moved every node less than epsilon.
    pub converged: bool,
    /// Alpha fell below `alpha_min`.
    pub cooled: bool,
}

/// Receives every intermediate state of a driven run (e.g. for live redraw).
pub trait LayoutObserver {
    fn on_step(&self, state: &LayoutState);
    fn on_finish(&self, run: &LayoutRun);
}

/// Observer that ignores everything.
pub struct NoopObserver;

impl LayoutObserver for NoopObserver {
    fn on_step(&self, _: &LayoutState) {}
    fn on_finish(&self, _: &LayoutRun) {}
}

#[derive(Debug, Clone)]
struct Link {
    source: usize,
    target: usize,
    distance: f64,
    strength: f64,
    /// Share of the correction applied to the target.
    bias: f64,
}

/// A prepared, immutable simulation over one graph.
#[derive(Debug, Clone)]
pub struct ForceLayout {
    config: LayoutConfig,
    ids: Arc<[String]>,
    radii: Arc<[f64]>,
    initial: Vec<Option<Point>>,
    index: HashMap<String, usize>,
    links: Vec<Link>,
    edges: Vec<ClassifiedEdge>,
    alpha_decay: f64,
}

impl ForceLayout {
    /// Resolve nodes and edges of `graph`.
    ///
    /// Duplicate node ids keep the first occurrence. Edges with a missing
    /// endpoint and self-loops are skipped.
    pub fn new(graph: &GapGraph, config: LayoutConfig) -> Self {
        let mut ids: Vec<String> = Vec::with_capacity(graph.nodes.len());
        let mut weights = Vec::with_capacity(graph.nodes.len());
        let mut initial = Vec::with_capacity(graph.nodes.len());
        let mut index = HashMap::new();

        for node in &graph.nodes {
            if index.contains_key(&node.id) {
                tracing::debug!(node = %node.id, "duplicate gap node ignored");
                continue;
            }
            index.insert(node.id.clone(), ids.len());
            ids.push(node.id.clone());
            weights.push(clamp_non_negative(node.weight));
            initial.push(node.position.filter(|p| p.x.is_finite() && p.y.is_finite()));
        }

        let max_weight = weights.iter().copied().fold(0.0, f64::max);
        let radii: Vec<f64> = weights
            .iter()
            .map(|&w| {
                node_radius(w, max_weight, config.min_node_radius, config.max_node_radius)
            })
            .collect();

        let mut resolved = Vec::new();
        let mut edges = Vec::new();
        for edge in &graph.edges {
            let (Some(&source), Some(&target)) = (index.get(&edge.source), index.get(&edge.target))
            else {
                tracing::debug!(
                    source = %edge.source,
                    target = %edge.target,
                    "skipping edge with missing endpoint"
                );
                continue;
            };
            if source == target {
                tracing::debug!(node = %edge.source, "skipping self-loop");
                continue;
            }
            let overlap = edge.clamped_strength();
            let class = EdgeStrength::classify(overlap);
            edges.push(ClassifiedEdge {
                source: edge.source.clone(),
                target: edge.target.clone(),
                overlap_strength: overlap,
                strength: class,
                color: class.color().to_string(),
                thickness: class.thickness(),
            });
            resolved.push((source, target, overlap));
        }

        let mut degree = vec![0usize; ids.len()];
        for &(s, t, _) in &resolved {
            degree[s] += 1;
            degree[t] += 1;
        }

        let links = resolved
            .into_iter()
            .map(|(source, target, overlap)| {
                let (ds, dt) = (degree[source] as f64, degree[target] as f64);
                Link {
                    source,
                    target,
                    distance: config.link_distance(overlap),
                    strength: overlap / 100.0 / ds.min(dt),
                    bias: ds / (ds + dt),
                }
            })
            .collect();

        let alpha_decay = config.alpha_decay();

        Self {
            config,
            ids: Arc::from(ids),
            radii: Arc::from(radii),
            initial,
            index,
            links,
            edges,
            alpha_decay,
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn node_ids(&self) -> &[String] {
        &self.ids
    }

    /// Edges that take part in the simulation, classified for display.
    pub fn edges(&self) -> &[ClassifiedEdge] {
        &self.edges
    }

    pub fn radius(&self, id: &str) -> Option<f64> {
        self.index.get(id).map(|&i| self.radii[i])
    }

    /// Fresh state: given positions are kept, other nodes are placed at random
    /// in a disk around the canvas center.
    pub fn initial_state(&self, seed: u64) -> LayoutState {
        let mut rng = StdRng::seed_from_u64(seed);
        let center = self.config.center();
        let nodes = self
            .initial
            .iter()
            .map(|p| {
                let p = p.unwrap_or_else(|| {
                    random_in_disk(center, self.config.initial_radius, &mut rng)
                });
                NodeState {
                    x: p.x,
                    y: p.y,
                    ..Default::default()
                }
            })
            .collect();

        self.state_from(nodes, 1.0, seed)
    }

    /// Restart from previously rendered positions.
    ///
    /// Nodes found in `previous` keep their position; new nodes are placed
    /// near their already-placed neighbours, or at random around the center.
    /// Alpha is reheated to `reheat_alpha` instead of restarting cold.
    pub fn warm_start(&self, previous: &[NodePosition], seed: u64) -> LayoutState {
        let known: HashMap<&str, Point> = previous
            .iter()
            .filter(|p| p.x.is_finite() && p.y.is_finite())
            .map(|p| (p.id.as_str(), Point::new(p.x, p.y)))
            .collect();

        let mut rng = StdRng::seed_from_u64(seed);
        let placed: Vec<Option<Point>> = self
            .ids
            .iter()
            .map(|id| known.get(id.as_str()).copied())
            .collect();

        let center = self.config.center();
        let nodes = (0..self.ids.len())
            .map(|i| {
                let p = match placed[i] {
                    Some(p) => p,
                    None => match self.neighbour_centroid(i, &placed) {
                        Some(c) => random_in_disk(c, self.config.min_link_distance, &mut rng),
                        None => random_in_disk(center, self.config.initial_radius, &mut rng),
                    },
                };
                NodeState {
                    x: p.x,
                    y: p.y,
                    ..Default::default()
                }
            })
            .collect();

        let reused = placed.iter().filter(|p| p.is_some()).count();
        tracing::debug!(reused, fresh = self.ids.len() - reused, "warm-started layout");

        self.state_from(nodes, self.config.reheat_alpha.clamp(0.0, 1.0), seed)
    }

    fn neighbour_centroid(&self, node: usize, placed: &[Option<Point>]) -> Option<Point> {
        let neighbours: Vec<Point> = self
            .links
            .iter()
            .filter_map(|l| {
                if l.source == node {
                    placed[l.target]
                } else if l.target == node {
                    placed[l.source]
                } else {
                    None
                }
            })
            .collect();
        if neighbours.is_empty() {
            return None;
        }
        let n = neighbours.len() as f64;
        Some(Point::new(
            neighbours.iter().map(|p| p.x).sum::<f64>() / n,
            neighbours.iter().map(|p| p.y).sum::<f64>() / n,
        ))
    }

    fn state_from(&self, nodes: Vec<NodeState>, alpha: f64, seed: u64) -> LayoutState {
        LayoutState {
            ids: Arc::clone(&self.ids),
            radii: Arc::clone(&self.radii),
            nodes,
            alpha,
            tick: 0,
            max_displacement: f64::INFINITY,
            seed,
        }
    }

    /// Advance the simulation by one step. Pure: `state` is left untouched.
    ///
    /// A state built for a different node set is re-seated onto this graph
    /// first, keeping the positions of nodes present in both.
    pub fn step(&self, state: &LayoutState) -> LayoutState {
        if !Arc::ptr_eq(&state.ids, &self.ids) && state.ids != self.ids {
            let reseated = self.warm_start(&state.positions(), state.seed);
            return self.step(&LayoutState {
                alpha: state.alpha,
                tick: state.tick,
                ..reseated
            });
        }

        let mut next = state.clone();
        next.tick += 1;
        next.alpha += (self.config.alpha_target - next.alpha) * self.alpha_decay;
        let alpha = next.alpha;

        let mut rng =
            StdRng::seed_from_u64(state.seed ^ next.tick.wrapping_mul(0x9E37_79B9_7F4A_7C15));

        self.apply_links(&mut next.nodes, alpha, &mut rng);
        self.apply_charge(&mut next.nodes, alpha, &mut rng);
        self.apply_collision(&mut next.nodes, &mut rng);

        let keep = 1.0 - self.config.velocity_decay.clamp(0.0, 1.0);
        for node in &mut next.nodes {
            node.vx *= keep;
            node.vy *= keep;
            node.x += node.vx;
            node.y += node.vy;
        }
        self.apply_center(&mut next.nodes);

        next.max_displacement = state
            .nodes
            .iter()
            .zip(&next.nodes)
            .map(|(a, b)| ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt())
            .fold(0.0, f64::max);

        next
    }

    /// Springs toward each link's rest length, using predicted positions.
    fn apply_links(&self, nodes: &mut [NodeState], alpha: f64, rng: &mut StdRng) {
        for link in &self.links {
            let (s, t) = (nodes[link.source], nodes[link.target]);
            let mut dx = t.x + t.vx - s.x - s.vx;
            let mut dy = t.y + t.vy - s.y - s.vy;
            if dx == 0.0 {
                dx = jiggle(rng);
            }
            if dy == 0.0 {
                dy = jiggle(rng);
            }
            let len = (dx * dx + dy * dy).sqrt();
            let k = (len - link.distance) / len * alpha * link.strength;
            dx *= k;
            dy *= k;

            nodes[link.target].vx -= dx * link.bias;
            nodes[link.target].vy -= dy * link.bias;
            nodes[link.source].vx += dx * (1.0 - link.bias);
            nodes[link.source].vy += dy * (1.0 - link.bias);
        }
    }

    /// Uniform pairwise charge (exact, O(n²)).
    fn apply_charge(&self, nodes: &mut [NodeState], alpha: f64, rng: &mut StdRng) {
        let strength = self.config.charge_strength;
        if strength == 0.0 {
            return;
        }
        let min_sq = self.config.charge_distance_min.max(0.0).powi(2);

        for i in 0..nodes.len() {
            for j in (i + 1)..nodes.len() {
                let mut dx = nodes[j].x - nodes[i].x;
                let mut dy = nodes[j].y - nodes[i].y;
                if dx == 0.0 {
                    dx = jiggle(rng);
                }
                if dy == 0.0 {
                    dy = jiggle(rng);
                }
                let mut l = dx * dx + dy * dy;
                if l < min_sq {
                    l = (min_sq * l).sqrt();
                }
                let w = strength * alpha / l;
                nodes[i].vx += dx * w;
                nodes[i].vy += dy * w;
                nodes[j].vx -= dx * w;
                nodes[j].vy -= dy * w;
            }
        }
    }

    /// Push overlapping pairs apart to `r_i + r_j + margin`, lighter nodes moving more.
    fn apply_collision(&self, nodes: &mut [NodeState], rng: &mut StdRng) {
        let strength = self.config.collision_strength.clamp(0.0, 1.0);
        if strength == 0.0 {
            return;
        }
        let margin = clamp_non_negative(self.config.collision_margin);

        for i in 0..nodes.len() {
            for j in (i + 1)..nodes.len() {
                let (ri, rj) = (self.radii[i], self.radii[j]);
                let min_dist = ri + rj + margin;
                let mut dx = (nodes[i].x + nodes[i].vx) - (nodes[j].x + nodes[j].vx);
                let mut dy = (nodes[i].y + nodes[i].vy) - (nodes[j].y + nodes[j].vy);
                let mut l = dx * dx + dy * dy;
                if l >= min_dist * min_dist {
                    continue;
                }
                if dx == 0.0 {
                    dx = jiggle(rng);
                    l += dx * dx;
                }
                if dy == 0.0 {
                    dy = jiggle(rng);
                    l += dy * dy;
                }
                let len = l.sqrt();
                let k = (min_dist - len) / len * strength;
                let (ri2, rj2) = (ri * ri, rj * rj);
                let share_i = if ri2 + rj2 > 0.0 { rj2 / (ri2 + rj2) } else { 0.5 };

                nodes[i].vx += dx * k * share_i;
                nodes[i].vy += dy * k * share_i;
                nodes[j].vx -= dx * k * (1.0 - share_i);
                nodes[j].vy -= dy * k * (1.0 - share_i);
            }
        }
    }

    /// Shift every node so the centroid moves toward the canvas center.
    fn apply_center(&self, nodes: &mut [NodeState]) {
        if nodes.is_empty() {
            return;
        }
        let strength = self.config.center_strength.clamp(0.0, 1.0);
        let center = self.config.center();
        let n = nodes.len() as f64;
        let sx = nodes.iter().map(|p| p.x).sum::<f64>() / n - center.x;
        let sy = nodes.iter().map(|p| p.y).sum::<f64>() / n - center.y;
        for node in nodes.iter_mut() {
            node.x -= sx * strength;
            node.y -= sy * strength;
        }
    }

    /// Iterate intermediate states; never ends on its own.
    pub fn steps(&self, state: LayoutState) -> Steps<'_> {
        Steps {
            layout: self,
            state,
        }
    }

    /// Step until the layout settles below `epsilon`, cools below
    /// `alpha_min`, or `max_steps` is exhausted.
    pub fn run(&self, state: LayoutState, max_steps: usize, epsilon: f64) -> LayoutRun {
        self.run_observed(state, max_steps, epsilon, &NoopObserver)
    }

    pub fn run_observed(
        &self,
        state: LayoutState,
        max_steps: usize,
        epsilon: f64,
        observer: &dyn LayoutObserver,
    ) -> LayoutRun {
        let mut state = state;
        let mut steps = 0;

        while steps < max_steps {
            state = self.step(&state);
            steps += 1;
            observer.on_step(&state);
            if state.is_settled(epsilon) || state.alpha < self.config.alpha_min {
                break;
            }
        }

        let run = LayoutRun {
            converged: state.is_settled(epsilon),
            cooled: state.alpha < self.config.alpha_min,
            state,
            steps,
        };
        tracing::debug!(
            steps = run.steps,
            converged = run.converged,
            cooled = run.cooled,
            "layout run finished"
        );
        observer.on_finish(&run);
        run
    }

    /// Fresh layout driven with the configured budget.
    pub fn solve(&self) -> LayoutRun {
        let state = self.initial_state(self.config.seed);
        self.run(state, self.config.max_steps, self.config.epsilon)
    }
}

/// Iterator over successive simulation states.
pub struct Steps<'a> {
    layout: &'a ForceLayout,
    state: LayoutState,
}

impl Iterator for Steps<'_> {
    type Item = LayoutState;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.layout.step(&self.state);
        self.state = next.clone();
        Some(next)
    }
}

fn jiggle(rng: &mut StdRng) -> f64 {
    (rng.gen::<f64>() - 0.5) * 1e-6
}

fn random_in_disk(center: Point, radius: f64, rng: &mut StdRng) -> Point {
    let radius = clamp_non_negative(radius);
    let r = radius * rng.gen::<f64>().sqrt();
    let theta = rng.gen::<f64>() * std::f64::consts::TAU;
    Point::new(center.x + r * theta.cos(), center.y + r * theta.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GapEdge, GapNode};

    fn graph(nodes: &[(&str, f64)], edges: &[(&str, &str, f64)]) -> GapGraph {
        GapGraph {
            nodes: nodes.iter().map(|(id, w)| GapNode::new(*id, *w)).collect(),
            edges: edges
                .iter()
                .map(|(s, t, o)| GapEdge::new(*s, *t, *o))
                .collect(),
        }
    }

    fn distance(state: &LayoutState, a: &str, b: &str) -> f64 {
        state.position(a).unwrap().distance(&state.position(b).unwrap())
    }

    #[test]
    fn radius_maps_weight_linearly() {
        assert_eq!(node_radius(10.0, 10.0, 20.0, 40.0), 40.0);
        assert_eq!(node_radius(5.0, 10.0, 20.0, 40.0), 30.0);
        assert_eq!(node_radius(0.0, 0.0, 20.0, 40.0), 20.0);
        assert_eq!(node_radius(-3.0, 10.0, 20.0, 40.0), 20.0);
    }

    #[test]
    fn edge_breakpoints() {
        assert_eq!(EdgeStrength::classify(60.0), EdgeStrength::Strong);
        assert_eq!(EdgeStrength::classify(140.0), EdgeStrength::Strong);
        assert_eq!(EdgeStrength::classify(59.9), EdgeStrength::Medium);
        assert_eq!(EdgeStrength::classify(40.0), EdgeStrength::Medium);
        assert_eq!(EdgeStrength::classify(39.9), EdgeStrength::Weak);
        assert_eq!(EdgeStrength::classify(-5.0), EdgeStrength::Weak);
        assert_eq!(EdgeStrength::Strong.color(), "#ef4444");
        assert_eq!(EdgeStrength::Medium.label(), "medium");
    }

    #[test]
    fn link_distance_shrinks_with_overlap() {
        let config = LayoutConfig::default();
        assert_eq!(config.link_distance(10.0), 140.0);
        assert_eq!(config.link_distance(90.0), 60.0);
        assert_eq!(config.link_distance(250.0), 50.0);
        let tight = LayoutConfig {
            link_base_distance: 50.0,
            ..LayoutConfig::default()
        };
        assert_eq!(tight.link_distance(100.0), tight.min_link_distance);
    }

    #[test]
    fn alpha_decay_reaches_min_after_decay_steps() {
        let config = LayoutConfig::default();
        let mut alpha: f64 = 1.0;
        for _ in 0..config.decay_steps {
            alpha += (0.0 - alpha) * config.alpha_decay();
        }
        assert!((alpha - config.alpha_min).abs() < 1e-9);
    }

    #[test]
    fn missing_endpoints_and_self_loops_are_skipped() {
        let g = graph(
            &[("a", 1.0), ("b", 2.0)],
            &[("a", "b", 50.0), ("a", "ghost", 80.0), ("b", "b", 70.0)],
        );
        let layout = ForceLayout::new(&g, LayoutConfig::default());
        assert_eq!(layout.edges().len(), 1);
        assert_eq!(layout.edges()[0].strength, EdgeStrength::Medium);

        let run = layout.solve();
        assert!(run.state.positions().iter().all(|p| p.x.is_finite() && p.y.is_finite()));
    }

    #[test]
    fn empty_graph_converges_immediately() {
        let layout = ForceLayout::new(&GapGraph::default(), LayoutConfig::default());
        let run = layout.solve();
        assert_eq!(run.steps, 1);
        assert!(run.converged);
        assert!(run.state.positions().is_empty());
    }

    #[test]
    fn step_is_pure() {
        let g = graph(&[("a", 1.0), ("b", 1.0)], &[("a", "b", 70.0)]);
        let layout = ForceLayout::new(&g, LayoutConfig::default());
        let state = layout.initial_state(7);
        let before = state.nodes.clone();
        let first = layout.step(&state);
        let again = layout.step(&state);
        assert_eq!(state.nodes, before);
        assert_eq!(first.nodes, again.nodes);
        assert_eq!(first.tick, 1);
        assert!(first.alpha < state.alpha);
    }

    #[test]
    fn coincident_nodes_separate() {
        let mut g = graph(&[("a", 1.0), ("b", 1.0)], &[]);
        for node in &mut g.nodes {
            node.position = Some(Point::new(400.0, 300.0));
        }
        let layout = ForceLayout::new(&g, LayoutConfig::default());
        let run = layout.solve();
        let d = distance(&run.state, "a", "b");
        assert!(d.is_finite());
        assert!(d > 40.0, "nodes still overlapping at {d}");
    }

    #[test]
    fn simulation_converges() {
        let g = graph(
            &[("a", 10.0), ("b", 4.0), ("c", 7.0), ("d", 1.0), ("e", 3.0)],
            &[
                ("a", "b", 80.0),
                ("a", "c", 45.0),
                ("b", "c", 20.0),
                ("c", "d", 65.0),
                ("d", "e", 30.0),
            ],
        );
        let layout = ForceLayout::new(&g, LayoutConfig::default());
        for seed in [1, 2, 3] {
            let last = layout
                .steps(layout.initial_state(seed))
                .take(600)
                .last()
                .unwrap();
            assert!(
                last.max_displacement < 0.05,
                "seed {seed}: still moving {}",
                last.max_displacement
            );
        }
    }

    #[test]
    fn strong_overlap_pulls_closer_than_weak() {
        let g = graph(
            &[("a", 5.0), ("b", 5.0), ("c", 5.0), ("d", 5.0)],
            &[("a", "b", 90.0), ("c", "d", 10.0)],
        );
        let layout = ForceLayout::new(&g, LayoutConfig::default());

        let (mut strong, mut weak) = (0.0, 0.0);
        let seeds = 0..10u64;
        for seed in seeds.clone() {
            let run = layout.run(layout.initial_state(seed), 400, 1e-4);
            strong += distance(&run.state, "a", "b");
            weak += distance(&run.state, "c", "d");
        }
        let n = seeds.count() as f64;
        assert!(
            strong / n < weak / n,
            "strong pair {:.1} vs weak pair {:.1}",
            strong / n,
            weak / n
        );
    }

    #[test]
    fn collision_keeps_minimum_separation() {
        let g = graph(&[("a", 10.0), ("b", 10.0)], &[("a", "b", 100.0)]);
        let config = LayoutConfig {
            link_base_distance: 10.0,
            min_link_distance: 10.0,
            ..LayoutConfig::default()
        };
        let layout = ForceLayout::new(&g, config);
        let run = layout.solve();
        // radii 40 + 40 + margin 10
        assert!(distance(&run.state, "a", "b") > 85.0);
    }

    #[test]
    fn layout_is_recentered() {
        let mut g = graph(&[("a", 1.0), ("b", 1.0), ("c", 1.0)], &[]);
        for (i, node) in g.nodes.iter_mut().enumerate() {
            node.position = Some(Point::new(50.0 + i as f64 * 60.0, 40.0));
        }
        let layout = ForceLayout::new(&g, LayoutConfig::default());
        let run = layout.run(layout.initial_state(0), 300, 1e-6);
        let positions = run.state.positions();
        let cx = positions.iter().map(|p| p.x).sum::<f64>() / 3.0;
        let cy = positions.iter().map(|p| p.y).sum::<f64>() / 3.0;
        assert!((cx - 400.0).abs() < 1.0, "centroid x {cx}");
        assert!((cy - 300.0).abs() < 1.0, "centroid y {cy}");
    }

    #[test]
    fn warm_start_keeps_known_positions() {
        let g = graph(&[("a", 3.0), ("b", 2.0), ("c", 1.0)], &[("a", "b", 70.0)]);
        let layout = ForceLayout::new(&g, LayoutConfig::default());
        let previous = layout.solve().state.positions();

        let mut grown = g.clone();
        grown.nodes.push(GapNode::new("d", 2.0));
        grown.edges.push(GapEdge::new("d", "a", 55.0));
        let next = ForceLayout::new(&grown, LayoutConfig::default());
        let state = next.warm_start(&previous, 9);

        for p in &previous {
            assert_eq!(state.position(&p.id), Some(Point::new(p.x, p.y)));
        }
        let d = state.position("d").unwrap();
        let a = state.position("a").unwrap();
        // placed near its only neighbour
        assert!(d.distance(&a) <= LayoutConfig::default().min_link_distance + 1e-9);
        assert_eq!(state.alpha, LayoutConfig::default().reheat_alpha);
    }

    #[test]
    fn step_reseats_foreign_state() {
        let small = ForceLayout::new(&graph(&[("a", 1.0)], &[]), LayoutConfig::default());
        let big = ForceLayout::new(
            &graph(&[("a", 1.0), ("b", 1.0)], &[]),
            LayoutConfig::default(),
        );
        let state = small.initial_state(3);
        let next = big.step(&state);
        assert_eq!(next.ids(), big.node_ids());
        assert_eq!(next.nodes.len(), 2);
    }

    struct Counter(std::cell::Cell<usize>);

    impl LayoutObserver for Counter {
        fn on_step(&self, _: &LayoutState) {
            self.0.set(self.0.get() + 1);
        }
        fn on_finish(&self, _: &LayoutRun) {}
    }

    #[test]
    fn observer_sees_every_step() {
        let g = graph(&[("a", 1.0), ("b", 1.0)], &[("a", "b", 40.0)]);
        let layout = ForceLayout::new(&g, LayoutConfig::default());
        let counter = Counter(std::cell::Cell::new(0));
        let run = layout.run_observed(layout.initial_state(1), 25, 0.0, &counter);
        assert_eq!(run.steps, 25);
        assert_eq!(counter.0.get(), 25);
        assert!(!run.converged);
    }
}

//! gapscope-core: analytics engine for learner gap dashboards.
//!
//! Turns raw per-learner activity records into derived metrics: clusters of
//! learners sharing weak topics, a force-directed layout of the topic-overlap
//! graph, least-squares trends over short series, and pairwise progress
//! synchronization scores. Every analysis is a pure function over an input
//! snapshot; memoization lives in the explicit [`cache`] layer.

pub mod aggregate;
pub mod cache;
pub mod clustering;
pub mod config;
pub mod engine;
pub mod error;
pub mod layout;
pub mod model;
pub mod parser;
pub mod regression;
pub mod report;
pub mod sync;

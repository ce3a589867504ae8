//! Ordinary least-squares trend fitting over short ordered series.
//!
//! The x-axis is always the ordinal position `0..n-1`; dated or sparsely
//! indexed series are re-indexed first.

use serde::{Deserialize, Serialize};

use crate::aggregate::{reindex_dated, reindex_points};
use crate::model::{DatedPoint, TimeSeriesPoint, TrendResult};

/// Fit `y = mx + b` over `values`, with `x = 0..n-1`.
///
/// m = Sxy / Sxx
/// b = ȳ − m·x̄
/// r = |Sxy| / sqrt(Sxx·Syy)
///
/// where `Sxy = Σ(x−x̄)(y−ȳ)` and the other sums likewise are centered.
///
/// Non-finite values are dropped. Fewer than two points, a constant series,
/// or a degenerate denominator yield a zero slope and correlation instead
/// of NaN.
pub fn fit_trend(values: &[f64]) -> TrendResult {
    let ys: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();

    let first = match ys.first() {
        Some(&first) => first,
        None => return TrendResult::default(),
    };
    if ys.iter().all(|&y| y == first) {
        return TrendResult {
            slope: 0.0,
            intercept: first,
            correlation: 0.0,
        };
    }

    let n = ys.len() as f64;
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = ys.iter().sum::<f64>() / n;

    let mut s_xy = 0.0;
    let mut s_xx = 0.0;
    let mut s_yy = 0.0;
    for (i, &y) in ys.iter().enumerate() {
        let dx = i as f64 - mean_x;
        let dy = y - mean_y;
        s_xy += dx * dy;
        s_xx += dx * dx;
        s_yy += dy * dy;
    }

    let slope = if s_xx > 0.0 { s_xy / s_xx } else { 0.0 };
    let intercept = mean_y - slope * mean_x;

    let denominator = (s_xx * s_yy).sqrt();
    let correlation = if denominator.is_finite() && denominator > 0.0 {
        (s_xy.abs() / denominator).clamp(0.0, 1.0)
    } else {
        0.0
    };

    TrendResult {
        slope: finite_or_zero(slope),
        intercept: finite_or_zero(intercept),
        correlation,
    }
}

/// Fit an indexed series after sorting by index and re-indexing to `0..n-1`.
pub fn fit_points(points: &[TimeSeriesPoint]) -> TrendResult {
    let values: Vec<f64> = reindex_points(points).iter().map(|p| p.value).collect();
    fit_trend(&values)
}

/// Fit a date-stamped series after ordering by date.
pub fn fit_dated(points: &[DatedPoint]) -> TrendResult {
    let values: Vec<f64> = reindex_dated(points).iter().map(|p| p.value).collect();
    fit_trend(&values)
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Coarse direction of a fitted trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Improving,
    Declining,
    Flat,
}

impl TrendDirection {
    /// Classify a trend; slopes within `±flat_threshold` per step are flat.
    pub fn classify(trend: &TrendResult, flat_threshold: f64) -> Self {
        let threshold = flat_threshold.abs();
        if trend.slope > threshold {
            TrendDirection::Improving
        } else if trend.slope < -threshold {
            TrendDirection::Declining
        } else {
            TrendDirection::Flat
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TrendDirection::Improving => "improving",
            TrendDirection::Declining => "declining",
            TrendDirection::Flat => "flat",
        }
    }
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

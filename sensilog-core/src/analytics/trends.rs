//! Recency trends and period comparison
//!
//! Relative changes are `None` when the baseline is zero; absolute deltas
//! (headshot percentage, win rate) are always defined.

use serde::Serialize;

use super::metrics::{aggregate, PerformanceMetrics};
use crate::types::MatchRecord;

/// Default number of matches in each trend window.
pub const DEFAULT_TREND_WINDOW: usize = 10;

/// Recent window versus the window immediately before it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendReport {
    /// Relative K/D change in percent; `None` when the older K/D is zero
    pub kd_ratio_trend_percent: Option<f64>,
    /// Headshot percentage delta in points
    pub headshot_trend: f64,
    /// Win rate delta in points
    pub win_rate_trend: f64,
    pub recent_matches: usize,
    pub older_matches: usize,
    pub recent: PerformanceMetrics,
    pub older: PerformanceMetrics,
}

/// Percentage change from `baseline` to `value`.
///
/// Returns `None` for a zero baseline or any non-finite result.
pub fn relative_change(baseline: f64, value: f64) -> Option<f64> {
    if baseline == 0.0 {
        return None;
    }
    let change = (value - baseline) / baseline * 100.0;
    change.is_finite().then_some(change)
}

/// Compare the last `window` matches against the `window` matches before them.
///
/// `matches` must be ordered oldest first. Returns `None` with fewer than two
/// matches. The older window may be short or empty when history is limited.
pub fn trend(matches: &[MatchRecord], window: usize) -> Option<TrendReport> {
    if matches.len() < 2 {
        return None;
    }
    let window = window.max(1);

    let recent_start = matches.len().saturating_sub(window);
    let older_start = recent_start.saturating_sub(window);

    let recent_slice = &matches[recent_start..];
    let older_slice = &matches[older_start..recent_start];

    let recent = aggregate(recent_slice);
    let older = aggregate(older_slice);

    Some(TrendReport {
        kd_ratio_trend_percent: relative_change(older.avg_kd_ratio, recent.avg_kd_ratio),
        headshot_trend: recent.avg_headshot_percentage - older.avg_headshot_percentage,
        win_rate_trend: recent.win_rate - older.win_rate,
        recent_matches: recent_slice.len(),
        older_matches: older_slice.len(),
        recent,
        older,
    })
}

/// Differences from period A to period B.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    /// Relative change in percent
    pub kd_ratio_diff: Option<f64>,
    /// Relative change in percent
    pub combat_score_diff: Option<f64>,
    /// Relative change in percent
    pub adr_diff: Option<f64>,
    /// Absolute delta in points
    pub headshot_diff: f64,
    /// Absolute delta in points
    pub win_rate_diff: f64,
}

pub fn compare(a: &PerformanceMetrics, b: &PerformanceMetrics) -> ComparisonReport {
    ComparisonReport {
        kd_ratio_diff: relative_change(a.avg_kd_ratio, b.avg_kd_ratio),
        combat_score_diff: relative_change(a.avg_combat_score, b.avg_combat_score),
        adr_diff: relative_change(a.avg_adr, b.avg_adr),
        headshot_diff: b.avg_headshot_percentage - a.avg_headshot_percentage,
        win_rate_diff: b.win_rate - a.win_rate,
    }
}

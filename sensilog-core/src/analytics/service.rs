//! Analytics entry points
//!
//! [`AnalyticsService`] reads a user's records through a [`RecordStore`] and
//! runs segmentation, aggregation, trends and correlation over them. It holds
//! no state between calls.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::correlation::{correlation_map, CorrelationMap, PeriodObservation};
use super::metrics::{aggregate, MatchStats, PerformanceMetrics};
use super::periods::{segment, ConfigurationPeriod};
use super::trends::{compare, trend, ComparisonReport, TrendReport};
use crate::config::AnalyticsConfig;
use crate::error::{Error, Result};
use crate::types::{ConfigurationRecord, DateRange, MatchFilter, MatchRecord};

/// Read access to the records analytics consumes.
pub trait RecordStore {
    /// A user's configurations by `created_at` ascending, ties in insertion order
    fn configurations(&self, user_id: &str) -> Result<Vec<ConfigurationRecord>>;

    /// A user's matches inside `range` (inclusive), by `game_start_time` ascending
    fn matches(&self, user_id: &str, range: &DateRange) -> Result<Vec<MatchRecord>>;

    /// The configuration in force at `at`
    fn configuration_at(
        &self,
        user_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<ConfigurationRecord>>;
}

impl<S: RecordStore + ?Sized> RecordStore for &S {
    fn configurations(&self, user_id: &str) -> Result<Vec<ConfigurationRecord>> {
        (**self).configurations(user_id)
    }

    fn matches(&self, user_id: &str, range: &DateRange) -> Result<Vec<MatchRecord>> {
        (**self).matches(user_id, range)
    }

    fn configuration_at(
        &self,
        user_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<ConfigurationRecord>> {
        (**self).configuration_at(user_id, at)
    }
}

/// Performance for one configuration period.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSummary {
    pub configuration_id: String,
    pub sensitivity: f64,
    pub dpi: u32,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub match_count: usize,
    pub performance: PerformanceMetrics,
}

impl From<&ConfigurationPeriod<'_>> for PeriodSummary {
    fn from(period: &ConfigurationPeriod<'_>) -> Self {
        Self {
            configuration_id: period.configuration_id().to_string(),
            sensitivity: period.sensitivity(),
            dpi: period.dpi(),
            start: period.start,
            end: period.end,
            match_count: period.matches.len(),
            performance: aggregate(period.matches.iter().copied()),
        }
    }
}

/// Full analytics report for a user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceAnalytics {
    pub settings_periods: Vec<PeriodSummary>,
    /// `None` with fewer than two matches
    pub overall_trends: Option<TrendReport>,
    /// `None` with fewer than two periods
    pub correlations: Option<CorrelationMap>,
}

/// A closed time window to compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ComparisonWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if end < start {
            return Err(Error::Validation(format!(
                "window end {} precedes start {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    fn range(&self) -> DateRange {
        DateRange::between(self.start, self.end)
    }
}

/// One side of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowPerformance {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub match_count: usize,
    /// Configuration in force at the end of the window
    pub settings: Option<ConfigurationRecord>,
    pub performance: PerformanceMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceComparison {
    pub period1: WindowPerformance,
    pub period2: WindowPerformance,
    /// Changes from `period1` to `period2`
    pub comparison: ComparisonReport,
}

/// Computes analytics reports over a [`RecordStore`].
pub struct AnalyticsService<S> {
    store: S,
    config: AnalyticsConfig,
}

impl<S: RecordStore> AnalyticsService<S> {
    pub fn new(store: S, config: AnalyticsConfig) -> Self {
        Self { store, config }
    }

    /// Per-period performance, overall trends and parameter correlations.
    ///
    /// `range` bounds the matches considered; every configuration is used
    /// for segmentation regardless of the range.
    pub fn performance_analytics(
        &self,
        user_id: &str,
        range: &DateRange,
        now: DateTime<Utc>,
    ) -> Result<PerformanceAnalytics> {
        let configurations = self.store.configurations(user_id)?;
        let matches = self.store.matches(user_id, range)?;

        let periods = segment(&configurations, &matches, now);
        let settings_periods: Vec<PeriodSummary> =
            periods.iter().map(PeriodSummary::from).collect();

        let observations: Vec<PeriodObservation> = settings_periods
            .iter()
            .map(|p| PeriodObservation {
                sensitivity: p.sensitivity,
                dpi: p.dpi,
                performance: p.performance,
            })
            .collect();

        let overall_trends = trend(&matches, self.config.trend_window);
        let correlations = correlation_map(&observations);

        tracing::debug!(
            user_id,
            configurations = configurations.len(),
            matches = matches.len(),
            periods = settings_periods.len(),
            has_trends = overall_trends.is_some(),
            "Computed performance analytics"
        );

        Ok(PerformanceAnalytics {
            settings_periods,
            overall_trends,
            correlations,
        })
    }

    /// Compare performance between two windows.
    pub fn compare_performance(
        &self,
        user_id: &str,
        period1: &ComparisonWindow,
        period2: &ComparisonWindow,
    ) -> Result<PerformanceComparison> {
        let first = self.window_performance(user_id, period1)?;
        let second = self.window_performance(user_id, period2)?;
        let comparison = compare(&first.performance, &second.performance);

        tracing::debug!(
            user_id,
            period1_matches = first.match_count,
            period2_matches = second.match_count,
            "Compared performance windows"
        );

        Ok(PerformanceComparison {
            period1: first,
            period2: second,
            comparison,
        })
    }

    /// Match count and aggregate metrics for a filtered match set.
    pub fn match_stats(&self, user_id: &str, filter: &MatchFilter) -> Result<MatchStats> {
        let matches: Vec<MatchRecord> = self
            .store
            .matches(user_id, &filter.range)?
            .into_iter()
            .filter(|m| {
                filter.agent_name.as_ref().map_or(true, |a| &m.agent_name == a)
                    && filter.map_name.as_ref().map_or(true, |map| &m.map_name == map)
            })
            .collect();

        tracing::debug!(user_id, matches = matches.len(), "Computed match stats");

        Ok(MatchStats::from_matches(&matches))
    }

    fn window_performance(
        &self,
        user_id: &str,
        window: &ComparisonWindow,
    ) -> Result<WindowPerformance> {
        let matches = self.store.matches(user_id, &window.range())?;
        let settings = self.store.configuration_at(user_id, window.end)?;

        Ok(WindowPerformance {
            start: window.start,
            end: window.end,
            match_count: matches.len(),
            settings,
            performance: aggregate(&matches),
        })
    }
}

//! Analytics module for sensilog
//!
//! Relates configuration changes to match performance:
//! - [`periods`]: partitions matches into configuration periods
//! - [`metrics`]: reduces a match set to [`PerformanceMetrics`]
//! - [`trends`]: recent-versus-older trends and period comparison
//! - [`correlation`]: Pearson correlation of parameters against metrics
//!
//! The functions in these modules are pure. [`AnalyticsService`] is the entry
//! point that reads records through a [`RecordStore`] and assembles reports.

pub mod correlation;
pub mod metrics;
pub mod periods;
pub mod service;
pub mod trends;

pub use correlation::{
    correlate, correlation_map, pearson, ConfigParameter, Correlation, CorrelationMap,
    PerformanceMetric,
};
pub use metrics::{aggregate, MatchStats, PerformanceMetrics};
pub use periods::{segment, ConfigurationPeriod};
pub use service::{
    AnalyticsService, ComparisonWindow, PerformanceAnalytics, PerformanceComparison,
    PeriodSummary, RecordStore, WindowPerformance,
};
pub use trends::{compare, relative_change, trend, ComparisonReport, TrendReport};

#[cfg(test)]
pub(crate) mod test_support {
    //! Record builders for analytics tests. Offsets are minutes from a fixed epoch.

    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::RecordStore;
    use crate::error::Result;
    use crate::types::{ConfigurationRecord, DateRange, MatchRecord, NewConfiguration};

    pub fn ts(offset: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() + Duration::minutes(offset)
    }

    pub fn config_at(id: &str, offset: i64, sensitivity: f64) -> ConfigurationRecord {
        NewConfiguration::new(sensitivity, 800).into_record(id.to_string(), "u1", ts(offset))
    }

    pub fn stat_line(offset: i64, kills: u32, deaths: u32, team_won: bool) -> MatchRecord {
        let start = ts(offset);
        MatchRecord {
            id: format!("m{}", offset),
            user_id: "u1".to_string(),
            match_id: format!("ext-{}", offset),
            game_start_time: start,
            game_end_time: start + Duration::minutes(30),
            map_name: "Bind".to_string(),
            game_mode: "competitive".to_string(),
            agent_name: "Omen".to_string(),
            rank_tier: None,
            rr: None,
            kills,
            deaths,
            assists: 3,
            damage_dealt: 2_500,
            headshot_count: 8,
            bodyshot_count: 30,
            legshot_count: 2,
            rounds_played: 20,
            team_won,
            headshot_percentage: Some(20.0),
            combat_score: Some(210.0),
            adr: Some(125.0),
            kd_ratio: Some(if deaths > 0 {
                f64::from(kills) / f64::from(deaths)
            } else {
                f64::from(kills)
            }),
        }
    }

    pub fn match_at(offset: i64) -> MatchRecord {
        stat_line(offset, 15, 12, offset % 2 == 0)
    }

    /// In-memory store holding a single user's records.
    #[derive(Default)]
    pub struct MemoryStore {
        pub configurations: Vec<ConfigurationRecord>,
        pub matches: Vec<MatchRecord>,
    }

    impl RecordStore for MemoryStore {
        fn configurations(&self, _user_id: &str) -> Result<Vec<ConfigurationRecord>> {
            let mut configs = self.configurations.clone();
            configs.sort_by_key(|c| c.created_at);
            Ok(configs)
        }

        fn matches(&self, _user_id: &str, range: &DateRange) -> Result<Vec<MatchRecord>> {
            let mut matches: Vec<_> = self
                .matches
                .iter()
                .filter(|m| range.contains(m.game_start_time))
                .cloned()
                .collect();
            matches.sort_by_key(|m| m.game_start_time);
            Ok(matches)
        }

        fn configuration_at(
            &self,
            user_id: &str,
            at: DateTime<Utc>,
        ) -> Result<Option<ConfigurationRecord>> {
            Ok(self
                .configurations(user_id)?
                .into_iter()
                .filter(|c| c.created_at <= at)
                .last())
        }
    }
}

//! Configuration period segmentation
//!
//! Splits a user's match history into the windows during which each
//! configuration was active. A period runs from its configuration's
//! `created_at` (inclusive) to the next configuration's `created_at`
//! (exclusive), or to `now` for the latest configuration.

use chrono::{DateTime, Utc};

use crate::types::{ConfigurationRecord, MatchRecord};

/// Matches played while one configuration was active.
#[derive(Debug, Clone)]
pub struct ConfigurationPeriod<'a> {
    pub configuration: &'a ConfigurationRecord,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub matches: Vec<&'a MatchRecord>,
}

impl ConfigurationPeriod<'_> {
    pub fn configuration_id(&self) -> &str {
        &self.configuration.id
    }

    pub fn sensitivity(&self) -> f64 {
        self.configuration.sensitivity
    }

    pub fn dpi(&self) -> u32 {
        self.configuration.dpi
    }
}

/// Partition `matches` into configuration periods.
///
/// Configurations are ordered by `created_at` with a stable sort, so records
/// sharing a timestamp keep their input order (the earlier one yields an
/// empty window). Periods without matches are dropped, as are matches played
/// before the first configuration or at/after `now`.
pub fn segment<'a>(
    configurations: &'a [ConfigurationRecord],
    matches: &'a [MatchRecord],
    now: DateTime<Utc>,
) -> Vec<ConfigurationPeriod<'a>> {
    let mut ordered: Vec<&ConfigurationRecord> = configurations.iter().collect();
    ordered.sort_by_key(|c| c.created_at);

    let mut periods = Vec::new();

    for (i, &configuration) in ordered.iter().enumerate() {
        let start = configuration.created_at;
        let end = ordered.get(i + 1).map_or(now, |next| next.created_at);

        let in_period: Vec<&MatchRecord> = matches
            .iter()
            .filter(|m| m.game_start_time >= start && m.game_start_time < end)
            .collect();

        if in_period.is_empty() {
            continue;
        }

        periods.push(ConfigurationPeriod {
            configuration,
            start,
            end,
            matches: in_period,
        });
    }

    periods
}

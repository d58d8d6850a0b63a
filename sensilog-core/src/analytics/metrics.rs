//! Performance metrics aggregation
//!
//! Reduces any set of matches to the fixed-shape [`PerformanceMetrics`].

use serde::Serialize;

use crate::types::MatchRecord;

/// Summary statistics over a set of matches.
///
/// Every field is `0.0` for an empty match set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub avg_kills: f64,
    pub avg_deaths: f64,
    pub avg_assists: f64,
    /// Total kills over total deaths (total kills when nobody died)
    pub avg_kd_ratio: f64,
    pub avg_headshot_percentage: f64,
    pub avg_combat_score: f64,
    pub avg_adr: f64,
    /// Percentage of matches won, 0-100
    pub win_rate: f64,
}

#[derive(Default)]
struct Totals {
    count: u64,
    kills: u64,
    deaths: u64,
    assists: u64,
    wins: u64,
    headshot_percentage: f64,
    combat_score: f64,
    adr: f64,
}

impl Totals {
    fn add(mut self, m: &MatchRecord) -> Self {
        self.count += 1;
        self.kills += u64::from(m.kills);
        self.deaths += u64::from(m.deaths);
        self.assists += u64::from(m.assists);
        if m.team_won {
            self.wins += 1;
        }
        self.headshot_percentage += m.headshot_percentage.unwrap_or(0.0);
        self.combat_score += m.combat_score.unwrap_or(0.0);
        self.adr += m.adr.unwrap_or(0.0);
        self
    }
}

/// Aggregate a set of matches into [`PerformanceMetrics`].
///
/// Absent per-match values count as zero.
pub fn aggregate<'a, I>(matches: I) -> PerformanceMetrics
where
    I: IntoIterator<Item = &'a MatchRecord>,
{
    let totals = matches.into_iter().fold(Totals::default(), Totals::add);

    if totals.count == 0 {
        return PerformanceMetrics::default();
    }

    let n = totals.count as f64;
    let kills = totals.kills as f64;
    let avg_kd_ratio = if totals.deaths > 0 {
        kills / totals.deaths as f64
    } else {
        kills
    };

    PerformanceMetrics {
        avg_kills: kills / n,
        avg_deaths: totals.deaths as f64 / n,
        avg_assists: totals.assists as f64 / n,
        avg_kd_ratio,
        avg_headshot_percentage: totals.headshot_percentage / n,
        avg_combat_score: totals.combat_score / n,
        avg_adr: totals.adr / n,
        win_rate: totals.wins as f64 / n * 100.0,
    }
}

/// Match count plus aggregate metrics, as returned by filtered statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchStats {
    pub total_matches: usize,
    pub performance: PerformanceMetrics,
}

impl MatchStats {
    pub fn from_matches(matches: &[MatchRecord]) -> Self {
        Self {
            total_matches: matches.len(),
            performance: aggregate(matches),
        }
    }
}

//! Core domain types for sensilog
//!
//! | Term | Definition |
//! |------|------------|
//! | **Configuration** | A snapshot of device/sensitivity settings, active from `created_at` until the next one |
//! | **Match** | One completed match with the player's combat statistics |
//! | **Linked account** | A local user bound to a third-party game account via OAuth |
//!
//! Records are written once at the ingestion boundary (`New*` forms are
//! validated and converted there) and are read-only inputs to analytics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================
// Configuration records
// ============================================

/// One snapshot of a user's device and sensitivity configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationRecord {
    pub id: String,
    pub user_id: String,
    /// The moment this configuration became active
    pub created_at: DateTime<Utc>,
    pub sensitivity: f64,
    pub dpi: u32,
    pub scoped_sensitivity: Option<f64>,
    pub windows_sensitivity: Option<u8>,
    pub windows_acceleration: Option<bool>,
    pub mouse_device: Option<String>,
    pub mousepad: Option<String>,
    pub keyboard_device: Option<String>,
    pub screen_resolution: Option<String>,
    pub aspect_ratio: Option<String>,
    pub display_scaling: Option<String>,
    pub display_mode: Option<String>,
    pub raw_input_buffer: Option<bool>,
    pub inner_deadzone: Option<f64>,
    pub outer_deadzone: Option<f64>,
    pub comment: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ConfigurationRecord {
    /// Effective DPI (sensitivity × DPI).
    pub fn edpi(&self) -> f64 {
        self.sensitivity * f64::from(self.dpi)
    }
}

/// Ingestion form for a configuration record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewConfiguration {
    pub sensitivity: f64,
    pub dpi: u32,
    /// Activation time; defaults to the insertion time
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scoped_sensitivity: Option<f64>,
    #[serde(default)]
    pub windows_sensitivity: Option<u8>,
    #[serde(default)]
    pub windows_acceleration: Option<bool>,
    #[serde(default)]
    pub mouse_device: Option<String>,
    #[serde(default)]
    pub mousepad: Option<String>,
    #[serde(default)]
    pub keyboard_device: Option<String>,
    #[serde(default)]
    pub screen_resolution: Option<String>,
    #[serde(default)]
    pub aspect_ratio: Option<String>,
    #[serde(default)]
    pub display_scaling: Option<String>,
    #[serde(default)]
    pub display_mode: Option<String>,
    #[serde(default)]
    pub raw_input_buffer: Option<bool>,
    #[serde(default)]
    pub inner_deadzone: Option<f64>,
    #[serde(default)]
    pub outer_deadzone: Option<f64>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewConfiguration {
    /// Create a form with only the required fields set.
    pub fn new(sensitivity: f64, dpi: u32) -> Self {
        Self {
            sensitivity,
            dpi,
            ..Default::default()
        }
    }

    /// Reject values outside the ranges the settings form accepts.
    pub fn validate(&self) -> Result<()> {
        if !(self.sensitivity > 0.0 && self.sensitivity <= 10.0) {
            return Err(Error::Validation(format!(
                "sensitivity must be in (0, 10], got {}",
                self.sensitivity
            )));
        }
        if !(100..=30_000).contains(&self.dpi) {
            return Err(Error::Validation(format!(
                "dpi must be between 100 and 30000, got {}",
                self.dpi
            )));
        }
        if let Some(scoped) = self.scoped_sensitivity {
            check_range("scoped_sensitivity", scoped, 0.0, 10.0)?;
        }
        if let Some(windows) = self.windows_sensitivity {
            if !(1..=11).contains(&windows) {
                return Err(Error::Validation(format!(
                    "windows_sensitivity must be between 1 and 11, got {}",
                    windows
                )));
            }
        }
        if let Some(inner) = self.inner_deadzone {
            check_range("inner_deadzone", inner, 0.0, 1.0)?;
        }
        if let Some(outer) = self.outer_deadzone {
            check_range("outer_deadzone", outer, 0.0, 1.0)?;
        }
        Ok(())
    }

    /// Build the stored record.
    pub fn into_record(self, id: String, user_id: &str, now: DateTime<Utc>) -> ConfigurationRecord {
        ConfigurationRecord {
            id,
            user_id: user_id.to_string(),
            created_at: self.created_at.unwrap_or(now),
            sensitivity: self.sensitivity,
            dpi: self.dpi,
            scoped_sensitivity: self.scoped_sensitivity,
            windows_sensitivity: self.windows_sensitivity,
            windows_acceleration: self.windows_acceleration,
            mouse_device: self.mouse_device,
            mousepad: self.mousepad,
            keyboard_device: self.keyboard_device,
            screen_resolution: self.screen_resolution,
            aspect_ratio: self.aspect_ratio,
            display_scaling: self.display_scaling,
            display_mode: self.display_mode,
            raw_input_buffer: self.raw_input_buffer,
            inner_deadzone: self.inner_deadzone,
            outer_deadzone: self.outer_deadzone,
            comment: self.comment,
            tags: self.tags,
        }
    }
}

fn check_range(field: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "{} must be between {} and {}, got {}",
            field, min, max, value
        )))
    }
}

// ============================================
// Match records
// ============================================

/// One completed match played by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub id: String,
    pub user_id: String,
    /// External match identifier, unique per user
    pub match_id: String,
    pub game_start_time: DateTime<Utc>,
    pub game_end_time: DateTime<Utc>,
    pub map_name: String,
    pub game_mode: String,
    pub agent_name: String,
    pub rank_tier: Option<String>,
    pub rr: Option<i32>,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub damage_dealt: u32,
    pub headshot_count: u32,
    pub bodyshot_count: u32,
    pub legshot_count: u32,
    pub rounds_played: u32,
    pub team_won: bool,
    pub headshot_percentage: Option<f64>,
    pub combat_score: Option<f64>,
    pub adr: Option<f64>,
    pub kd_ratio: Option<f64>,
}

/// Ingestion form for a match, carrying raw shot and damage counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMatch {
    pub match_id: String,
    pub game_start_time: DateTime<Utc>,
    pub game_end_time: DateTime<Utc>,
    pub map_name: String,
    pub game_mode: String,
    pub agent_name: String,
    #[serde(default)]
    pub rank_tier: Option<String>,
    #[serde(default)]
    pub rr: Option<i32>,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub combat_score: u32,
    pub damage_dealt: u32,
    pub headshot_count: u32,
    pub bodyshot_count: u32,
    pub legshot_count: u32,
    pub rounds_played: u32,
    pub team_won: bool,
}

impl NewMatch {
    pub fn validate(&self) -> Result<()> {
        if self.match_id.trim().is_empty() {
            return Err(Error::Validation("match_id must not be empty".to_string()));
        }
        if self.rounds_played == 0 {
            return Err(Error::Validation(format!(
                "rounds_played must be at least 1 (match {})",
                self.match_id
            )));
        }
        if self.game_end_time < self.game_start_time {
            return Err(Error::Validation(format!(
                "game_end_time precedes game_start_time (match {})",
                self.match_id
            )));
        }
        Ok(())
    }

    /// Percentage of hits that landed on the head, 0 with no hits.
    pub fn headshot_percentage(&self) -> f64 {
        let total = u64::from(self.headshot_count)
            + u64::from(self.bodyshot_count)
            + u64::from(self.legshot_count);
        if total > 0 {
            f64::from(self.headshot_count) / total as f64 * 100.0
        } else {
            0.0
        }
    }

    /// Kills per death; the kill count itself when there are no deaths.
    pub fn kd_ratio(&self) -> f64 {
        if self.deaths > 0 {
            f64::from(self.kills) / f64::from(self.deaths)
        } else {
            f64::from(self.kills)
        }
    }

    /// Average damage per round.
    pub fn adr(&self) -> f64 {
        if self.rounds_played > 0 {
            f64::from(self.damage_dealt) / f64::from(self.rounds_played)
        } else {
            0.0
        }
    }

    /// Build the stored record, deriving the per-match ratios.
    pub fn into_record(self, id: String, user_id: &str) -> MatchRecord {
        let headshot_percentage = self.headshot_percentage();
        let kd_ratio = self.kd_ratio();
        let adr = self.adr();

        MatchRecord {
            id,
            user_id: user_id.to_string(),
            match_id: self.match_id,
            game_start_time: self.game_start_time,
            game_end_time: self.game_end_time,
            map_name: self.map_name,
            game_mode: self.game_mode,
            agent_name: self.agent_name,
            rank_tier: self.rank_tier,
            rr: self.rr,
            kills: self.kills,
            deaths: self.deaths,
            assists: self.assists,
            damage_dealt: self.damage_dealt,
            headshot_count: self.headshot_count,
            bodyshot_count: self.bodyshot_count,
            legshot_count: self.legshot_count,
            rounds_played: self.rounds_played,
            team_won: self.team_won,
            headshot_percentage: Some(headshot_percentage),
            combat_score: Some(f64::from(self.combat_score)),
            adr: Some(adr),
            kd_ratio: Some(kd_ratio),
        }
    }
}

// ============================================
// Query filters
// ============================================

/// Inclusive time range; either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    /// Range with both bounds set.
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start.map_or(true, |s| ts >= s) && self.end.map_or(true, |e| ts <= e)
    }
}

/// Filter for match listings and statistics.
#[derive(Debug, Clone, Default)]
pub struct MatchFilter {
    pub range: DateRange,
    pub agent_name: Option<String>,
    pub map_name: Option<String>,
}

// ============================================
// Linked accounts
// ============================================

/// A local user linked to a third-party game account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedAccount {
    pub user_id: String,
    /// Provider-side account identifier (puuid)
    pub external_id: String,
    pub game_name: String,
    pub tag_line: String,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LinkedAccount {
    /// `gameName#tagLine`
    pub fn riot_id(&self) -> String {
        format!("{}#{}", self.game_name, self.tag_line)
    }

    /// Whether the stored access token is still valid at `now`.
    pub fn has_fresh_token(&self, now: DateTime<Utc>) -> bool {
        self.access_token.is_some() && self.token_expires_at.map_or(false, |exp| exp > now)
    }
}

/// Known peripherals for the settings form, defaults merged with stored values.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviceSuggestions {
    pub mice: Vec<String>,
    pub keyboards: Vec<String>,
    pub mousepads: Vec<String>,
    pub tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_match() -> NewMatch {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 18, 0, 0).unwrap();
        NewMatch {
            match_id: "m-1".to_string(),
            game_start_time: start,
            game_end_time: start + chrono::Duration::minutes(35),
            map_name: "Ascent".to_string(),
            game_mode: "competitive".to_string(),
            agent_name: "Jett".to_string(),
            rank_tier: None,
            rr: None,
            kills: 20,
            deaths: 16,
            assists: 4,
            combat_score: 5_200,
            damage_dealt: 3_300,
            headshot_count: 25,
            bodyshot_count: 70,
            legshot_count: 5,
            rounds_played: 22,
            team_won: true,
        }
    }

    #[test]
    fn test_derived_match_ratios() {
        let m = sample_match();
        assert_eq!(m.headshot_percentage(), 25.0);
        assert_eq!(m.kd_ratio(), 1.25);
        assert_eq!(m.adr(), 150.0);

        let record = m.into_record("id-1".to_string(), "u1");
        assert_eq!(record.combat_score, Some(5_200.0));
        assert_eq!(record.adr, Some(150.0));
        assert_eq!(record.user_id, "u1");
    }

    #[test]
    fn test_zero_shots_and_deaths() {
        let mut m = sample_match();
        m.headshot_count = 0;
        m.bodyshot_count = 0;
        m.legshot_count = 0;
        m.deaths = 0;
        assert_eq!(m.headshot_percentage(), 0.0);
        assert_eq!(m.kd_ratio(), 20.0);
    }

    #[test]
    fn test_headshot_percentage_with_huge_shot_counts() {
        let mut value = serde_json::to_value(sample_match()).unwrap();
        value["headshotCount"] = serde_json::json!(4_294_967_295u32);
        value["bodyshotCount"] = serde_json::json!(1);
        value["legshotCount"] = serde_json::json!(0);
        let m: NewMatch = serde_json::from_value(value).unwrap();

        assert!(m.validate().is_ok());
        let pct = m.headshot_percentage();
        assert!(pct > 99.9 && pct < 100.0);

        let record = m.into_record("id-1".to_string(), "u1");
        assert_eq!(record.headshot_percentage, Some(pct));
    }

    #[test]
    fn test_match_validation() {
        assert!(sample_match().validate().is_ok());

        let mut m = sample_match();
        m.rounds_played = 0;
        assert!(matches!(m.validate(), Err(Error::Validation(_))));

        let mut m = sample_match();
        m.game_end_time = m.game_start_time - chrono::Duration::minutes(1);
        assert!(m.validate().is_err());
    }

    #[test]
    fn test_configuration_validation() {
        assert!(NewConfiguration::new(0.35, 800).validate().is_ok());
        assert!(NewConfiguration::new(0.0, 800).validate().is_err());
        assert!(NewConfiguration::new(0.35, 50).validate().is_err());
        assert!(NewConfiguration::new(f64::NAN, 800).validate().is_err());

        let mut config = NewConfiguration::new(0.35, 800);
        config.inner_deadzone = Some(1.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_edpi() {
        let now = Utc::now();
        let record = NewConfiguration::new(0.4, 800).into_record("c1".to_string(), "u1", now);
        assert!((record.edpi() - 320.0).abs() < 1e-9);
        assert_eq!(record.created_at, now);
    }

    #[test]
    fn test_date_range_inclusive() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
        let range = DateRange::between(start, end);
        assert!(range.contains(start));
        assert!(range.contains(end));
        assert!(!range.contains(end + chrono::Duration::seconds(1)));
        assert!(DateRange::default().contains(start));
    }
}

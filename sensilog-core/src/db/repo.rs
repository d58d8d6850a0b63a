//! Database repository layer
//!
//! Provides query and insert operations for all entity types.

use crate::analytics::RecordStore;
use crate::error::{Error, Result};
use crate::types::*;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::Mutex;

const DEFAULT_MICE: &[&str] = &[
    "Logitech G Pro X Superlight",
    "Razer Viper Ultimate",
    "Zowie EC2",
    "Finalmouse Starlight-12",
    "SteelSeries Rival 3",
];

const DEFAULT_KEYBOARDS: &[&str] = &[
    "Wooting 60HE",
    "SteelSeries Apex Pro",
    "Razer Huntsman V2",
    "Logitech G Pro X",
    "Corsair K70",
];

const DEFAULT_MOUSEPADS: &[&str] = &[
    "Artisan Zero",
    "Logitech G640",
    "SteelSeries QcK",
    "Razer Strider",
    "Zowie GSR",
];

/// Outcome of a bulk match import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Matches written to the store
    pub inserted: usize,
    /// Matches skipped because the user already has that `match_id`
    pub duplicates: usize,
}

/// Format a timestamp for storage; fixed width so text order is time order.
pub(crate) fn ts_to_sql(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn ts_from_row(row: &Row, column: &str) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(column)?;
    parse_ts(row, column, &raw)
}

fn opt_ts_from_row(row: &Row, column: &str) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(column)?;
    raw.map(|s| parse_ts(row, column, &s)).transpose()
}

fn parse_ts(row: &Row, column: &str, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            let idx = row.as_ref().column_index(column).unwrap_or(0);
            rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
        })
}

/// Database handle (single connection behind a mutex)
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        super::schema::run_migrations(&conn)
    }

    // ============================================
    // Configuration operations
    // ============================================

    /// Validate and store a new configuration record for `user_id`.
    ///
    /// `now` is used as the activation time when the form leaves it unset.
    pub fn create_configuration(
        &self,
        user_id: &str,
        form: NewConfiguration,
        now: DateTime<Utc>,
    ) -> Result<ConfigurationRecord> {
        form.validate()?;
        let record = form.into_record(uuid::Uuid::new_v4().to_string(), user_id, now);

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO configurations (id, user_id, created_at, sensitivity, dpi,
                                        scoped_sensitivity, windows_sensitivity, windows_acceleration,
                                        mouse_device, mousepad, keyboard_device, screen_resolution,
                                        aspect_ratio, display_scaling, display_mode, raw_input_buffer,
                                        inner_deadzone, outer_deadzone, comment)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)
            "#,
            params![
                record.id,
                record.user_id,
                ts_to_sql(record.created_at),
                record.sensitivity,
                record.dpi,
                record.scoped_sensitivity,
                record.windows_sensitivity,
                record.windows_acceleration,
                record.mouse_device,
                record.mousepad,
                record.keyboard_device,
                record.screen_resolution,
                record.aspect_ratio,
                record.display_scaling,
                record.display_mode,
                record.raw_input_buffer,
                record.inner_deadzone,
                record.outer_deadzone,
                record.comment,
            ],
        )?;

        for tag in record.tags.iter().collect::<BTreeSet<_>>() {
            tx.execute(
                "INSERT INTO configuration_tags (configuration_id, tag) VALUES (?1, ?2)",
                params![record.id, tag],
            )?;
        }
        tx.commit()?;

        tracing::debug!(
            user_id,
            configuration_id = %record.id,
            sensitivity = record.sensitivity,
            dpi = record.dpi,
            "Stored configuration"
        );

        Ok(record)
    }

    /// Get a configuration by ID, scoped to its owner
    pub fn get_configuration(&self, user_id: &str, id: &str) -> Result<Option<ConfigurationRecord>> {
        let conn = self.conn.lock().unwrap();
        let record = conn
            .query_row(
                "SELECT * FROM configurations WHERE id = ?1 AND user_id = ?2",
                params![id, user_id],
                Self::row_to_configuration,
            )
            .optional()?;

        match record {
            Some(mut record) => {
                record.tags = Self::load_tags(&conn, &record.id)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// List a user's configurations, newest first
    pub fn list_configurations(&self, user_id: &str) -> Result<Vec<ConfigurationRecord>> {
        let mut records = self.configurations_ascending(user_id)?;
        records.reverse();
        Ok(records)
    }

    /// The most recently activated configuration
    pub fn latest_configuration(&self, user_id: &str) -> Result<Option<ConfigurationRecord>> {
        Ok(self.configurations_ascending(user_id)?.pop())
    }

    /// The configuration in force at `at` (latest with `created_at <= at`)
    pub fn configuration_active_at(
        &self,
        user_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<ConfigurationRecord>> {
        let conn = self.conn.lock().unwrap();
        let record = conn
            .query_row(
                r#"
                SELECT * FROM configurations
                WHERE user_id = ?1 AND created_at <= ?2
                ORDER BY created_at DESC, seq DESC
                LIMIT 1
                "#,
                params![user_id, ts_to_sql(at)],
                Self::row_to_configuration,
            )
            .optional()?;

        match record {
            Some(mut record) => {
                record.tags = Self::load_tags(&conn, &record.id)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Delete a configuration; `NotFound` if the user has no such record
    pub fn delete_configuration(&self, user_id: &str, id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            "DELETE FROM configurations WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        if deleted == 0 {
            return Err(Error::not_found("configuration", id));
        }
        Ok(())
    }

    /// Configurations ordered by activation time, ties in insertion order
    pub(crate) fn configurations_ascending(&self, user_id: &str) -> Result<Vec<ConfigurationRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT * FROM configurations WHERE user_id = ? ORDER BY created_at ASC, seq ASC",
        )?;
        let mut records = stmt
            .query_map([user_id], Self::row_to_configuration)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut tags = Self::load_user_tags(&conn, user_id)?;
        for record in &mut records {
            if let Some(t) = tags.remove(&record.id) {
                record.tags = t;
            }
        }

        Ok(records)
    }

    fn load_tags(conn: &Connection, configuration_id: &str) -> Result<Vec<String>> {
        let mut stmt = conn.prepare(
            "SELECT tag FROM configuration_tags WHERE configuration_id = ? ORDER BY tag",
        )?;
        let tags = stmt
            .query_map([configuration_id], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(tags)
    }

    fn load_user_tags(conn: &Connection, user_id: &str) -> Result<HashMap<String, Vec<String>>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT ct.configuration_id, ct.tag
            FROM configuration_tags ct
            JOIN configurations c ON c.id = ct.configuration_id
            WHERE c.user_id = ?
            ORDER BY ct.tag
            "#,
        )?;
        let rows = stmt
            .query_map([user_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut tags: HashMap<String, Vec<String>> = HashMap::new();
        for (configuration_id, tag) in rows {
            tags.entry(configuration_id).or_default().push(tag);
        }
        Ok(tags)
    }

    fn row_to_configuration(row: &Row) -> rusqlite::Result<ConfigurationRecord> {
        Ok(ConfigurationRecord {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            created_at: ts_from_row(row, "created_at")?,
            sensitivity: row.get("sensitivity")?,
            dpi: row.get("dpi")?,
            scoped_sensitivity: row.get("scoped_sensitivity")?,
            windows_sensitivity: row.get("windows_sensitivity")?,
            windows_acceleration: row.get("windows_acceleration")?,
            mouse_device: row.get("mouse_device")?,
            mousepad: row.get("mousepad")?,
            keyboard_device: row.get("keyboard_device")?,
            screen_resolution: row.get("screen_resolution")?,
            aspect_ratio: row.get("aspect_ratio")?,
            display_scaling: row.get("display_scaling")?,
            display_mode: row.get("display_mode")?,
            raw_input_buffer: row.get("raw_input_buffer")?,
            inner_deadzone: row.get("inner_deadzone")?,
            outer_deadzone: row.get("outer_deadzone")?,
            comment: row.get("comment")?,
            tags: Vec::new(),
        })
    }

    /// Peripheral and tag suggestions for the settings form.
    ///
    /// Built-in defaults come first, followed by values other records use.
    pub fn device_suggestions(&self) -> Result<DeviceSuggestions> {
        let conn = self.conn.lock().unwrap();

        let distinct = |column: &str| -> Result<Vec<String>> {
            let sql = format!(
                "SELECT DISTINCT {col} FROM configurations WHERE {col} IS NOT NULL AND {col} != '' ORDER BY {col}",
                col = column
            );
            let mut stmt = conn.prepare(&sql)?;
            let values = stmt
                .query_map([], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            Ok(values)
        };

        let merge = |defaults: &[&str], stored: Vec<String>| -> Vec<String> {
            let mut out: Vec<String> = defaults.iter().map(|s| s.to_string()).collect();
            for value in stored {
                if !out.contains(&value) {
                    out.push(value);
                }
            }
            out
        };

        let mice = merge(DEFAULT_MICE, distinct("mouse_device")?);
        let keyboards = merge(DEFAULT_KEYBOARDS, distinct("keyboard_device")?);
        let mousepads = merge(DEFAULT_MOUSEPADS, distinct("mousepad")?);

        let mut stmt = conn.prepare("SELECT DISTINCT tag FROM configuration_tags ORDER BY tag")?;
        let tags = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;

        Ok(DeviceSuggestions {
            mice,
            keyboards,
            mousepads,
            tags,
        })
    }

    // ============================================
    // Match operations
    // ============================================

    /// Validate and store a single match; duplicates are rejected
    pub fn insert_match(&self, user_id: &str, form: NewMatch) -> Result<MatchRecord> {
        form.validate()?;

        let conn = self.conn.lock().unwrap();
        if Self::match_exists(&conn, user_id, &form.match_id)? {
            return Err(Error::Validation(format!(
                "match {} already recorded",
                form.match_id
            )));
        }

        let record = form.into_record(uuid::Uuid::new_v4().to_string(), user_id);
        Self::write_match(&conn, &record)?;
        Ok(record)
    }

    /// Validate and store a batch of matches in one transaction.
    ///
    /// Every form is validated before anything is written. Matches the user
    /// already has (same `match_id`) are skipped.
    pub fn import_matches(&self, user_id: &str, forms: Vec<NewMatch>) -> Result<ImportSummary> {
        for form in &forms {
            form.validate()?;
        }

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let mut summary = ImportSummary::default();

        for form in forms {
            if Self::match_exists(&tx, user_id, &form.match_id)? {
                summary.duplicates += 1;
                continue;
            }
            let record = form.into_record(uuid::Uuid::new_v4().to_string(), user_id);
            Self::write_match(&tx, &record)?;
            summary.inserted += 1;
        }

        tx.commit()?;

        tracing::info!(
            user_id,
            inserted = summary.inserted,
            duplicates = summary.duplicates,
            "Imported matches"
        );

        Ok(summary)
    }

    fn match_exists(conn: &Connection, user_id: &str, match_id: &str) -> Result<bool> {
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM matches WHERE user_id = ?1 AND match_id = ?2",
                params![user_id, match_id],
                |r| r.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn write_match(conn: &Connection, record: &MatchRecord) -> Result<()> {
        conn.execute(
            r#"
            INSERT INTO matches (id, user_id, match_id, game_start_time, game_end_time, map_name,
                                 game_mode, agent_name, rank_tier, rr, kills, deaths, assists,
                                 damage_dealt, headshot_count, bodyshot_count, legshot_count,
                                 rounds_played, team_won, headshot_percentage, combat_score, adr, kd_ratio)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18,
                    ?19, ?20, ?21, ?22, ?23)
            "#,
            params![
                record.id,
                record.user_id,
                record.match_id,
                ts_to_sql(record.game_start_time),
                ts_to_sql(record.game_end_time),
                record.map_name,
                record.game_mode,
                record.agent_name,
                record.rank_tier,
                record.rr,
                record.kills,
                record.deaths,
                record.assists,
                record.damage_dealt,
                record.headshot_count,
                record.bodyshot_count,
                record.legshot_count,
                record.rounds_played,
                record.team_won,
                record.headshot_percentage,
                record.combat_score,
                record.adr,
                record.kd_ratio,
            ],
        )?;
        Ok(())
    }

    /// Get a match by ID, scoped to its owner
    pub fn get_match(&self, user_id: &str, id: &str) -> Result<Option<MatchRecord>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT * FROM matches WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
            Self::row_to_match,
        )
        .optional()
        .map_err(Error::from)
    }

    /// List a user's matches, newest first
    pub fn list_matches(&self, user_id: &str, filter: &MatchFilter) -> Result<Vec<MatchRecord>> {
        let mut matches = self.query_matches(user_id, filter)?;
        matches.reverse();
        Ok(matches)
    }

    /// Delete a match; `NotFound` if the user has no such record
    pub fn delete_match(&self, user_id: &str, id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            "DELETE FROM matches WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        if deleted == 0 {
            return Err(Error::not_found("match", id));
        }
        Ok(())
    }

    /// Matches matching `filter`, oldest first
    pub(crate) fn query_matches(&self, user_id: &str, filter: &MatchFilter) -> Result<Vec<MatchRecord>> {
        let conn = self.conn.lock().unwrap();

        let mut sql = String::from("SELECT * FROM matches WHERE user_id = ?");
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(user_id.to_string())];

        if let Some(start) = filter.range.start {
            sql.push_str(" AND game_start_time >= ?");
            params.push(Box::new(ts_to_sql(start)));
        }

        if let Some(end) = filter.range.end {
            sql.push_str(" AND game_start_time <= ?");
            params.push(Box::new(ts_to_sql(end)));
        }

        if let Some(agent) = &filter.agent_name {
            sql.push_str(" AND agent_name = ?");
            params.push(Box::new(agent.clone()));
        }

        if let Some(map) = &filter.map_name {
            sql.push_str(" AND map_name = ?");
            params.push(Box::new(map.clone()));
        }

        sql.push_str(" ORDER BY game_start_time ASC, rowid ASC");

        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let mut stmt = conn.prepare(&sql)?;
        let matches = stmt
            .query_map(params_refs.as_slice(), Self::row_to_match)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(matches)
    }

    fn row_to_match(row: &Row) -> rusqlite::Result<MatchRecord> {
        Ok(MatchRecord {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            match_id: row.get("match_id")?,
            game_start_time: ts_from_row(row, "game_start_time")?,
            game_end_time: ts_from_row(row, "game_end_time")?,
            map_name: row.get("map_name")?,
            game_mode: row.get("game_mode")?,
            agent_name: row.get("agent_name")?,
            rank_tier: row.get("rank_tier")?,
            rr: row.get("rr")?,
            kills: row.get("kills")?,
            deaths: row.get("deaths")?,
            assists: row.get("assists")?,
            damage_dealt: row.get("damage_dealt")?,
            headshot_count: row.get("headshot_count")?,
            bodyshot_count: row.get("bodyshot_count")?,
            legshot_count: row.get("legshot_count")?,
            rounds_played: row.get("rounds_played")?,
            team_won: row.get("team_won")?,
            headshot_percentage: row.get("headshot_percentage")?,
            combat_score: row.get("combat_score")?,
            adr: row.get("adr")?,
            kd_ratio: row.get("kd_ratio")?,
        })
    }

    // ============================================
    // Linked account operations
    // ============================================

    /// Insert or update the linked account for `account.user_id`
    pub fn upsert_account(&self, account: &LinkedAccount) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO users (id, external_id, game_name, tag_line, riot_id, access_token,
                               refresh_token, token_expires_at, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(id) DO UPDATE SET
                external_id = excluded.external_id,
                game_name = excluded.game_name,
                tag_line = excluded.tag_line,
                riot_id = excluded.riot_id,
                access_token = excluded.access_token,
                refresh_token = excluded.refresh_token,
                token_expires_at = excluded.token_expires_at,
                updated_at = excluded.updated_at
            "#,
            params![
                account.user_id,
                account.external_id,
                account.game_name,
                account.tag_line,
                account.riot_id(),
                account.access_token,
                account.refresh_token,
                account.token_expires_at.map(ts_to_sql),
                ts_to_sql(account.created_at),
                ts_to_sql(account.updated_at),
            ],
        )?;
        Ok(())
    }

    /// Get the linked account for a local user
    pub fn get_account(&self, user_id: &str) -> Result<Option<LinkedAccount>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT * FROM users WHERE id = ?",
            [user_id],
            Self::row_to_account,
        )
        .optional()
        .map_err(Error::from)
    }

    /// Find the local user a `gameName#tagLine` is linked to
    pub fn get_account_by_riot_id(&self, riot_id: &str) -> Result<Option<LinkedAccount>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT * FROM users WHERE riot_id = ?",
            [riot_id],
            Self::row_to_account,
        )
        .optional()
        .map_err(Error::from)
    }

    /// Replace the stored token pair
    pub fn update_tokens(
        &self,
        user_id: &str,
        access_token: &str,
        refresh_token: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            r#"
            UPDATE users
            SET access_token = ?2, refresh_token = ?3, token_expires_at = ?4, updated_at = ?5
            WHERE id = ?1
            "#,
            params![
                user_id,
                access_token,
                refresh_token,
                ts_to_sql(expires_at),
                ts_to_sql(now)
            ],
        )?;
        if updated == 0 {
            return Err(Error::AccountNotLinked(user_id.to_string()));
        }
        Ok(())
    }

    fn row_to_account(row: &Row) -> rusqlite::Result<LinkedAccount> {
        Ok(LinkedAccount {
            user_id: row.get("id")?,
            external_id: row.get("external_id")?,
            game_name: row.get("game_name")?,
            tag_line: row.get("tag_line")?,
            access_token: row.get("access_token")?,
            refresh_token: row.get("refresh_token")?,
            token_expires_at: opt_ts_from_row(row, "token_expires_at")?,
            created_at: ts_from_row(row, "created_at")?,
            updated_at: ts_from_row(row, "updated_at")?,
        })
    }
}

impl RecordStore for Database {
    fn configurations(&self, user_id: &str) -> Result<Vec<ConfigurationRecord>> {
        self.configurations_ascending(user_id)
    }

    fn matches(&self, user_id: &str, range: &DateRange) -> Result<Vec<MatchRecord>> {
        self.query_matches(
            user_id,
            &MatchFilter {
                range: *range,
                ..Default::default()
            },
        )
    }

    fn configuration_at(
        &self,
        user_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<ConfigurationRecord>> {
        self.configuration_active_at(user_id, at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    fn t(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap()
    }

    fn create_test_match(match_id: &str, start: DateTime<Utc>) -> NewMatch {
        NewMatch {
            match_id: match_id.to_string(),
            game_start_time: start,
            game_end_time: start + Duration::minutes(30),
            map_name: "Bind".to_string(),
            game_mode: "competitive".to_string(),
            agent_name: "Sova".to_string(),
            rank_tier: Some("Gold 2".to_string()),
            rr: Some(45),
            kills: 15,
            deaths: 12,
            assists: 6,
            combat_score: 4_400,
            damage_dealt: 2_640,
            headshot_count: 10,
            bodyshot_count: 38,
            legshot_count: 2,
            rounds_played: 22,
            team_won: false,
        }
    }

    #[test]
    fn test_configuration_crud() {
        let db = test_db();

        let mut form = NewConfiguration::new(0.35, 800);
        form.created_at = Some(t(1));
        form.mouse_device = Some("Zowie EC2".to_string());
        form.tags = vec!["tilted".to_string(), "arm-aim".to_string()];

        let created = db.create_configuration("u1", form, t(2)).unwrap();
        assert_eq!(created.created_at, t(1));

        let fetched = db.get_configuration("u1", &created.id).unwrap().unwrap();
        assert_eq!(fetched.mouse_device.as_deref(), Some("Zowie EC2"));
        assert_eq!(fetched.tags, vec!["arm-aim".to_string(), "tilted".to_string()]);

        // Scoped to the owner
        assert!(db.get_configuration("u2", &created.id).unwrap().is_none());
        assert!(matches!(
            db.delete_configuration("u2", &created.id),
            Err(Error::NotFound { .. })
        ));

        db.delete_configuration("u1", &created.id).unwrap();
        assert!(db.list_configurations("u1").unwrap().is_empty());
    }

    #[test]
    fn test_configuration_ordering_and_ties() {
        let db = test_db();

        let mut first = NewConfiguration::new(0.3, 800);
        first.created_at = Some(t(5));
        let mut tie_a = NewConfiguration::new(0.4, 800);
        tie_a.created_at = Some(t(3));
        let mut tie_b = NewConfiguration::new(0.5, 800);
        tie_b.created_at = Some(t(3));

        let late = db.create_configuration("u1", first, t(0)).unwrap();
        let a = db.create_configuration("u1", tie_a, t(0)).unwrap();
        let b = db.create_configuration("u1", tie_b, t(0)).unwrap();

        let ascending = db.configurations_ascending("u1").unwrap();
        let ids: Vec<_> = ascending.iter().map(|c| c.id.clone()).collect();
        assert_eq!(ids, vec![a.id.clone(), b.id.clone(), late.id.clone()]);

        let newest_first = db.list_configurations("u1").unwrap();
        assert_eq!(newest_first[0].id, late.id);

        assert_eq!(db.latest_configuration("u1").unwrap().unwrap().id, late.id);
        assert_eq!(
            db.configuration_active_at("u1", t(4)).unwrap().unwrap().id,
            b.id
        );
        assert!(db.configuration_active_at("u1", t(2)).unwrap().is_none());
    }

    #[test]
    fn test_invalid_configuration_rejected() {
        let db = test_db();
        let err = db
            .create_configuration("u1", NewConfiguration::new(12.0, 800), t(0))
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_match_insert_and_filters() {
        let db = test_db();

        db.insert_match("u1", create_test_match("a", t(1))).unwrap();
        let mut ascent = create_test_match("b", t(2));
        ascent.map_name = "Ascent".to_string();
        db.insert_match("u1", ascent).unwrap();
        db.insert_match("u1", create_test_match("c", t(3))).unwrap();
        db.insert_match("u2", create_test_match("a", t(1))).unwrap();

        let all = db.list_matches("u1", &MatchFilter::default()).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].match_id, "c");

        let on_bind = db
            .list_matches(
                "u1",
                &MatchFilter {
                    map_name: Some("Bind".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(on_bind.len(), 2);

        let ranged = db
            .query_matches(
                "u1",
                &MatchFilter {
                    range: DateRange::between(t(2), t(3)),
                    ..Default::default()
                },
            )
            .unwrap();
        let ids: Vec<_> = ranged.iter().map(|m| m.match_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn test_match_round_trip_keeps_derived_fields() {
        let db = test_db();
        let stored = db.insert_match("u1", create_test_match("a", t(1))).unwrap();
        let fetched = db.get_match("u1", &stored.id).unwrap().unwrap();

        assert_eq!(fetched, stored);
        assert_eq!(fetched.headshot_percentage, Some(20.0));
        assert_eq!(fetched.adr, Some(120.0));
    }

    #[test]
    fn test_duplicate_match_handling() {
        let db = test_db();
        db.insert_match("u1", create_test_match("a", t(1))).unwrap();

        assert!(matches!(
            db.insert_match("u1", create_test_match("a", t(1))),
            Err(Error::Validation(_))
        ));

        let summary = db
            .import_matches(
                "u1",
                vec![create_test_match("a", t(1)), create_test_match("b", t(2))],
            )
            .unwrap();
        assert_eq!(
            summary,
            ImportSummary {
                inserted: 1,
                duplicates: 1
            }
        );
    }

    #[test]
    fn test_import_is_all_or_nothing_on_invalid_input() {
        let db = test_db();
        let mut bad = create_test_match("bad", t(2));
        bad.rounds_played = 0;

        assert!(db
            .import_matches("u1", vec![create_test_match("ok", t(1)), bad])
            .is_err());
        assert!(db.list_matches("u1", &MatchFilter::default()).unwrap().is_empty());
    }

    #[test]
    fn test_account_upsert_and_tokens() {
        let db = test_db();
        let account = LinkedAccount {
            user_id: "u1".to_string(),
            external_id: "puuid-1".to_string(),
            game_name: "Flick".to_string(),
            tag_line: "EUW".to_string(),
            access_token: Some("at".to_string()),
            refresh_token: Some("rt".to_string()),
            token_expires_at: Some(t(2)),
            created_at: t(1),
            updated_at: t(1),
        };
        db.upsert_account(&account).unwrap();

        let by_riot_id = db.get_account_by_riot_id("Flick#EUW").unwrap().unwrap();
        assert_eq!(by_riot_id.user_id, "u1");

        db.update_tokens("u1", "at2", "rt2", t(5), t(3)).unwrap();
        let refreshed = db.get_account("u1").unwrap().unwrap();
        assert_eq!(refreshed.access_token.as_deref(), Some("at2"));
        assert_eq!(refreshed.token_expires_at, Some(t(5)));
        assert_eq!(refreshed.created_at, t(1));

        assert!(matches!(
            db.update_tokens("nobody", "a", "r", t(5), t(3)),
            Err(Error::AccountNotLinked(_))
        ));
    }

    #[test]
    fn test_device_suggestions_merge_defaults() {
        let db = test_db();
        let mut form = NewConfiguration::new(0.35, 800);
        form.mouse_device = Some("Custom Mouse".to_string());
        form.keyboard_device = Some("Wooting 60HE".to_string());
        form.tags = vec!["scrims".to_string()];
        db.create_configuration("u1", form, t(0)).unwrap();

        let suggestions = db.device_suggestions().unwrap();
        assert_eq!(suggestions.mice.len(), DEFAULT_MICE.len() + 1);
        assert_eq!(suggestions.mice.last().map(String::as_str), Some("Custom Mouse"));
        assert_eq!(suggestions.keyboards.len(), DEFAULT_KEYBOARDS.len());
        assert_eq!(suggestions.tags, vec!["scrims".to_string()]);
    }
}

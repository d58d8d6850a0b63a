//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.
//! Timestamps are stored as fixed-width RFC 3339 text (microseconds, `Z`
//! suffix) so that lexicographic order equals chronological order.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: users, configurations, matches
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id                TEXT PRIMARY KEY,
        external_id       TEXT NOT NULL,
        game_name         TEXT NOT NULL,
        tag_line          TEXT NOT NULL,
        riot_id           TEXT NOT NULL UNIQUE,
        access_token      TEXT,
        refresh_token     TEXT,
        token_expires_at  DATETIME,
        created_at        DATETIME NOT NULL,
        updated_at        DATETIME NOT NULL
    );

    -- seq preserves insertion order for configurations sharing a created_at
    CREATE TABLE IF NOT EXISTS configurations (
        seq                  INTEGER PRIMARY KEY AUTOINCREMENT,
        id                   TEXT NOT NULL UNIQUE,
        user_id              TEXT NOT NULL,
        created_at           DATETIME NOT NULL,
        sensitivity          REAL NOT NULL,
        dpi                  INTEGER NOT NULL,
        scoped_sensitivity   REAL,
        windows_sensitivity  INTEGER,
        windows_acceleration INTEGER,
        mouse_device         TEXT,
        mousepad             TEXT,
        keyboard_device      TEXT,
        screen_resolution    TEXT,
        aspect_ratio         TEXT,
        display_scaling      TEXT,
        display_mode         TEXT,
        raw_input_buffer     INTEGER,
        inner_deadzone       REAL,
        outer_deadzone       REAL,
        comment              TEXT
    );

    CREATE INDEX IF NOT EXISTS idx_configurations_user_time
        ON configurations(user_id, created_at, seq);

    CREATE TABLE IF NOT EXISTS matches (
        id                  TEXT PRIMARY KEY,
        user_id             TEXT NOT NULL,
        match_id            TEXT NOT NULL,
        game_start_time     DATETIME NOT NULL,
        game_end_time       DATETIME NOT NULL,
        map_name            TEXT NOT NULL,
        game_mode           TEXT NOT NULL,
        agent_name          TEXT NOT NULL,
        rank_tier           TEXT,
        rr                  INTEGER,
        kills               INTEGER NOT NULL,
        deaths              INTEGER NOT NULL,
        assists             INTEGER NOT NULL,
        damage_dealt        INTEGER NOT NULL,
        headshot_count      INTEGER NOT NULL,
        bodyshot_count      INTEGER NOT NULL,
        legshot_count       INTEGER NOT NULL,
        rounds_played       INTEGER NOT NULL,
        team_won            INTEGER NOT NULL,
        headshot_percentage REAL,
        combat_score        REAL,
        adr                 REAL,
        kd_ratio            REAL,

        UNIQUE(user_id, match_id)
    );

    CREATE INDEX IF NOT EXISTS idx_matches_user_start ON matches(user_id, game_start_time);
    "#,
    // Version 2: free-form tags on configurations
    r#"
    CREATE TABLE IF NOT EXISTS configuration_tags (
        configuration_id TEXT NOT NULL REFERENCES configurations(id) ON DELETE CASCADE,
        tag              TEXT NOT NULL,

        PRIMARY KEY (configuration_id, tag)
    );

    CREATE INDEX IF NOT EXISTS idx_configuration_tags_tag ON configuration_tags(tag);
    "#,
];

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version: i32 = conn
        .query_row("PRAGMA user_version", [], |r| r.get(0))
        .unwrap_or(0);

    tracing::info!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking database migrations"
    );

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration)?;
            conn.execute(&format!("PRAGMA user_version = {}", version), [])?;
        }
    }

    if current_version < SCHEMA_VERSION {
        tracing::info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Migrations complete"
        );
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> crate::error::Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}

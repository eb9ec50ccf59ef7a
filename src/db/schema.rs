// Database schema — table creation and migrations.
//
// A `schema_version` table records the applied schema version so later
// migrations can be added without touching existing databases.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Create all tables if they don't exist yet. Safe to call on every startup.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Submitted reports about suspicious content
        CREATE TABLE IF NOT EXISTS cases (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            platform TEXT NOT NULL,
            url TEXT NOT NULL,
            evidence_type TEXT NOT NULL,       -- Screenshot/Image, Post Text, Image Match
            file_bytes BLOB,                   -- uploaded screenshot, if any
            post_text TEXT,
            image_match_url TEXT,
            reason TEXT NOT NULL,
            notes TEXT,
            submitted_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Archive of harvested posts, one row per (platform, id)
        CREATE TABLE IF NOT EXISTS harvested_posts (
            platform TEXT NOT NULL,
            id TEXT NOT NULL,
            username TEXT NOT NULL,
            content TEXT NOT NULL,
            timestamp TEXT NOT NULL,           -- RFC 3339
            engagement INTEGER NOT NULL DEFAULT 0,
            url TEXT NOT NULL DEFAULT '',
            source TEXT NOT NULL,
            title TEXT,
            community TEXT,
            harvested_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (platform, id)
        );

        CREATE INDEX IF NOT EXISTS idx_cases_submitted
            ON cases(submitted_at);

        CREATE INDEX IF NOT EXISTS idx_posts_timestamp
            ON harvested_posts(timestamp);
        ",
    )
    .context("Failed to create database tables")?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [1],
    )?;

    Ok(())
}

/// Count user tables (shown by `rumour init`).
pub fn table_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

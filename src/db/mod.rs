// Database layer — SQLite storage for submitted cases and archived posts.
//
// rusqlite with the "bundled" feature, so there's no system SQLite
// dependency. The file lives wherever RUMOUR_DB_PATH points (defaults to
// ./rumour.db).

pub mod models;
pub mod queries;
pub mod schema;
pub mod sqlite;
pub mod traits;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;

pub use sqlite::SqliteStore;
pub use traits::Store;

/// Open (or create) the database and run migrations.
pub fn initialize(db_path: &str) -> Result<Connection> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory for database: {}", db_path))?;
        }
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path))?;

    conn.pragma_update(None, "journal_mode", "WAL")?;
    schema::create_tables(&conn)?;

    Ok(conn)
}

/// Open an existing database (fails if it doesn't exist yet).
pub fn open(db_path: &str) -> Result<Connection> {
    if !Path::new(db_path).exists() {
        anyhow::bail!("Database not found at {}. Run `rumour init` first.", db_path);
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path))?;

    conn.pragma_update(None, "journal_mode", "WAL")?;
    // Pick up tables added since the file was created
    schema::create_tables(&conn)?;

    Ok(conn)
}

/// Create the database if needed and wrap it as a Store.
pub fn initialize_store(db_path: &str) -> Result<Arc<dyn Store>> {
    Ok(Arc::new(SqliteStore::new(initialize(db_path)?)))
}

/// Open an existing database as a Store.
pub fn open_store(db_path: &str) -> Result<Arc<dyn Store>> {
    Ok(Arc::new(SqliteStore::new(open(db_path)?)))
}

// Database layer: SQLite storage for generated questions and quiz progress.
//
// We use rusqlite with the "bundled" feature so there's no system SQLite
// dependency. The database file lives wherever QCM_DB_PATH points
// (defaults to ./data/qcm_database.db).

pub mod models;
pub mod progress;
pub mod queries;
pub mod schema;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

/// Open (or create) the database and run migrations.
///
/// Called by `qcm-forge init` and by `generate`, which may be the first
/// command ever run against a fresh data directory.
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
        anyhow::bail!(
            "Database not found at {}. Run `qcm-forge init` or `qcm-forge generate` first.",
            db_path
        );
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path))?;

    conn.pragma_update(None, "journal_mode", "WAL")?;

    // Older files may predate the progress tables.
    schema::create_tables(&conn)?;

    Ok(conn)
}

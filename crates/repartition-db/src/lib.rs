//! # repartition-db
//!
//! SQLite store for the distribution engine: the centrally shared rule set,
//! the history of computed distributions and a few settings. One database
//! file, `$REPARTITION_DATA_DIR/repartition.db`.
//!
//! ## Schema
//!
//! - WAL mode
//! - Foreign keys enforced
//! - All timestamps are Unix epoch seconds (u64)
//! - Schema version stored in `PRAGMA user_version`

pub mod migrations;
pub mod queries;
pub mod schema;

use rusqlite::Connection;
use std::path::Path;

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Database error types.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid rule set: {0}")]
    Rules(#[from] repartition_engine::RuleError),

    /// Refused to store a distribution that failed verification.
    #[error("distribution for case '{case_id}' is not verified: {}", .messages.join("; "))]
    Unverified {
        case_id: String,
        messages: Vec<String>,
    },
}

impl From<serde_json::Error> for DbError {
    fn from(e: serde_json::Error) -> Self {
        DbError::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DbError>;

/// Open or create the database at the given path.
///
/// Configures WAL mode, foreign keys, and runs any pending migrations.
pub fn open(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    configure(&conn)?;
    migrations::run(&conn)?;
    Ok(conn)
}

/// Open an in-memory database (for testing).
pub fn open_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure(&conn)?;
    migrations::run(&conn)?;
    Ok(conn)
}

/// Unix seconds to the signed column representation.
pub(crate) fn to_sql_time(ts: u64) -> Result<i64> {
    i64::try_from(ts).map_err(|_| DbError::Constraint(format!("timestamp {ts} out of range")))
}

/// Stored timestamp back to Unix seconds.
pub(crate) fn from_sql_time(ts: i64) -> Result<u64> {
    u64::try_from(ts).map_err(|_| DbError::Serialization(format!("negative timestamp {ts}")))
}

fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;",
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_memory() {
        let conn = open_memory().expect("open in-memory db");
        let version: u32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .expect("get user_version");
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let conn = open_memory().expect("open");
        let fk: i32 = conn
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))
            .expect("get foreign_keys");
        assert_eq!(fk, 1);
    }

    #[test]
    fn test_open_file_twice() {
        let dir = std::env::temp_dir().join(format!("repartition-db-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("create dir");
        let path = dir.join("repartition.db");
        {
            let conn = open(&path).expect("first open");
            queries::settings::set_tolerance(&conn, 25).expect("set");
        }
        let conn = open(&path).expect("reopen runs no migration");
        assert_eq!(
            queries::settings::tolerance(&conn).expect("get"),
            25
        );
        drop(conn);
        let _ = std::fs::remove_dir_all(&dir);
    }
}

//! Verification settings.
//!
//! Stored as text in the `settings` table; the typed accessors below are the
//! only readers outside tests.

use rusqlite::Connection;

use repartition_engine::DEFAULT_TOLERANCE;
use repartition_types::Amount;

use crate::{DbError, Result};

/// Largest accepted gap between total and distributed amounts.
pub const VERIFICATION_TOLERANCE: &str = "verification_tolerance";

/// Whether unverified distributions may be stored in the history.
pub const PERSIST_UNVERIFIED: &str = "persist_unverified";

/// Values seeded by the initial migration.
pub const DEFAULTS: [(&str, &str); 2] = [(VERIFICATION_TOLERANCE, "10"), (PERSIST_UNVERIFIED, "false")];

/// Raw value of a setting.
pub fn get(conn: &Connection, key: &str) -> Result<String> {
    conn.query_row(
        "SELECT value FROM settings WHERE key = ?1",
        [key],
        |row| row.get(0),
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DbError::NotFound(format!("setting '{key}'")),
        other => DbError::Sqlite(other),
    })
}

/// Store a raw setting value.
pub fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
        rusqlite::params![key, value],
    )?;
    Ok(())
}

/// Verification tolerance, [`DEFAULT_TOLERANCE`] when unset.
///
/// # Errors
///
/// - [`DbError::Serialization`] if the stored value is not a non-negative
///   amount
pub fn tolerance(conn: &Connection) -> Result<Amount> {
    match get(conn, VERIFICATION_TOLERANCE) {
        Ok(v) => match v.trim().parse::<Amount>() {
            Ok(t) if t >= 0 => Ok(t),
            _ => Err(DbError::Serialization(format!(
                "{VERIFICATION_TOLERANCE}: not a non-negative amount: '{v}'"
            ))),
        },
        Err(DbError::NotFound(_)) => Ok(DEFAULT_TOLERANCE),
        Err(e) => Err(e),
    }
}

/// Change the verification tolerance.
pub fn set_tolerance(conn: &Connection, tolerance: Amount) -> Result<()> {
    if tolerance < 0 {
        return Err(DbError::Constraint(format!(
            "{VERIFICATION_TOLERANCE} must not be negative, got {tolerance}"
        )));
    }
    set(conn, VERIFICATION_TOLERANCE, &tolerance.to_string())
}

/// Whether unverified distributions may be recorded, `false` when unset.
///
/// # Errors
///
/// - [`DbError::Serialization`] for anything but `true`/`false`/`1`/`0`
pub fn persist_unverified(conn: &Connection) -> Result<bool> {
    match get(conn, PERSIST_UNVERIFIED) {
        Ok(v) => match v.trim() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            other => Err(DbError::Serialization(format!(
                "{PERSIST_UNVERIFIED}: not a boolean: '{other}'"
            ))),
        },
        Err(DbError::NotFound(_)) => Ok(false),
        Err(e) => Err(e),
    }
}

pub fn set_persist_unverified(conn: &Connection, allow: bool) -> Result<()> {
    set(conn, PERSIST_UNVERIFIED, if allow { "true" } else { "false" })
}

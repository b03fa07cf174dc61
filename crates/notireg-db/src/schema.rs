//! SQL schema for the settings store.
//!
//! Column names and order are shared with the platform notification service
//! that reads this file, so they must not change.

use rusqlite::Connection;

use crate::Result;

/// Name of the settings table.
pub const TABLE: &str = "notification_setting";

/// Settings table, one row per application.
pub const CREATE_NOTIFICATION_SETTING: &str = r#"
CREATE TABLE IF NOT EXISTS notification_setting (
    appid TEXT PRIMARY KEY NOT NULL,
    notification TEXT,
    sounds TEXT,
    contents TEXT,
    badge TEXT,
    pkgid TEXT,
    reserved1 TEXT,
    reserved2 TEXT
);
"#;

/// Whether the settings table exists.
pub fn table_exists(conn: &Connection) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
        [TABLE],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Create the settings table inside a transaction if it is missing.
///
/// Returns `true` when the table was created. On failure the transaction is
/// rolled back and nothing is left behind.
pub fn ensure(conn: &mut Connection) -> Result<bool> {
    if table_exists(conn)? {
        return Ok(false);
    }

    let tx = conn.transaction()?;
    tx.execute_batch(CREATE_NOTIFICATION_SETTING)?;
    tx.commit()?;

    tracing::info!("Created {TABLE} table");
    Ok(true)
}

//! Notification setting query functions.

use notireg_types::{Section, SettingsRecord};
use rusqlite::{Connection, Row};

use crate::{DbError, Result};

const SELECT_COLUMNS: &str = "SELECT appid, notification, sounds, contents, badge, pkgid, reserved1, reserved2
     FROM notification_setting";

/// Insert a record, replacing any existing row with the same app id.
pub fn upsert(conn: &Connection, record: &SettingsRecord) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO notification_setting
             (appid, notification, sounds, contents, badge, pkgid, reserved1, reserved2)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, NULL)",
        rusqlite::params![
            record.app_id,
            record.notification,
            record.sounds,
            record.contents,
            record.badge,
            record.pkg_id,
        ],
    )?;
    Ok(())
}

/// Delete the row for one app id. Returns the number of rows removed (0 or 1).
pub fn delete_by_app_id(conn: &Connection, app_id: &str) -> Result<usize> {
    let removed = conn.execute("DELETE FROM notification_setting WHERE appid = ?1", [app_id])?;
    Ok(removed)
}

/// Delete every row owned by a package. Returns the number of rows removed.
pub fn delete_by_package(conn: &Connection, pkg_id: &str) -> Result<usize> {
    let removed = conn.execute(
        "DELETE FROM notification_setting
         WHERE appid IN (SELECT appid FROM notification_setting WHERE pkgid = ?1)",
        [pkg_id],
    )?;
    Ok(removed)
}

/// Count the rows owned by a package.
pub fn count_by_package(conn: &Connection, pkg_id: &str) -> Result<usize> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM notification_setting WHERE pkgid = ?1",
        [pkg_id],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}

/// Get the record for an app id.
pub fn get(conn: &Connection, app_id: &str) -> Result<SettingsRecord> {
    conn.query_row(&format!("{SELECT_COLUMNS} WHERE appid = ?1"), [app_id], read_record)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                DbError::NotFound(format!("settings for '{app_id}'"))
            }
            other => DbError::Sqlite(other),
        })
}

/// List every record owned by a package, ordered by app id.
pub fn list_by_package(conn: &Connection, pkg_id: &str) -> Result<Vec<SettingsRecord>> {
    let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} WHERE pkgid = ?1 ORDER BY appid"))?;

    let rows = stmt
        .query_map([pkg_id], read_record)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Map a row to a record. NULL toggles, written by older tools, read back as
/// their default value.
fn read_record(row: &Row<'_>) -> rusqlite::Result<SettingsRecord> {
    let toggle = |idx: usize, section: Section| -> rusqlite::Result<String> {
        Ok(row
            .get::<_, Option<String>>(idx)?
            .unwrap_or_else(|| section.default_value().to_string()))
    };

    Ok(SettingsRecord {
        app_id: row.get(0)?,
        notification: toggle(1, Section::Notification)?,
        sounds: toggle(2, Section::Sounds)?,
        contents: toggle(3, Section::Contents)?,
        badge: toggle(4, Section::Badge)?,
        pkg_id: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        reserved1: row.get(6)?,
        reserved2: row.get(7)?,
    })
}

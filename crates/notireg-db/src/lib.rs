//! # notireg-db
//!
//! Storage layer for per-application notification settings.
//! Manages the single SQLite file holding the `notification_setting` table.
//!
//! ## Connection lifecycle
//!
//! Nothing holds a connection between hook invocations. A hook opens the
//! store on entry through [`Store::session`] and the session closes it again
//! when dropped, on every exit path.

pub mod queries;
pub mod schema;

use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use notireg_types::SettingsRecord;
use rusqlite::Connection;

/// Database location used on the target platform.
pub const DEFAULT_DB_PATH: &str = "/opt/usr/dbspace/.notification_parser.db";

/// Database error types.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("cannot stat {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store path is not a regular file: {0}")]
    NotRegularFile(PathBuf),

    #[error("not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

/// Open the settings database at `path`, creating it when absent.
///
/// The path must be a regular file if it exists at all; symlinks and
/// directories are refused. The table is created when missing.
pub fn open(path: &Path) -> Result<Connection> {
    check_regular_file(path)?;

    let mut conn = Connection::open(path)?;
    configure(&conn)?;

    let len = std::fs::symlink_metadata(path)
        .map_err(|source| DbError::Io {
            path: path.to_path_buf(),
            source,
        })?
        .len();
    if len == 0 {
        tracing::warn!(path = %path.display(), "settings store is empty, creating schema");
    }

    schema::ensure(&mut conn)?;
    Ok(conn)
}

/// Open an in-memory database (for testing).
pub fn open_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory()?;
    configure(&conn)?;
    schema::ensure(&mut conn)?;
    Ok(conn)
}

/// Configure SQLite pragmas.
fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
    Ok(())
}

fn check_regular_file(path: &Path) -> Result<()> {
    match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_file() => Ok(()),
        Ok(_) => Err(DbError::NotRegularFile(path.to_path_buf())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(DbError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Handle to the settings database.
///
/// Holds at most one connection, opened lazily by any operation and released
/// by [`Store::disconnect`].
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    conn: Option<Connection>,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            conn: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Return the open connection, opening it first if needed.
    pub fn connect(&mut self) -> Result<&mut Connection> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => {
                tracing::trace!(path = %self.path.display(), "opening settings store");
                open(&self.path)?
            }
        };
        Ok(self.conn.insert(conn))
    }

    /// Close the connection if one is open.
    pub fn disconnect(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| DbError::Sqlite(e))?;
        }
        Ok(())
    }

    /// Connect and return a guard that disconnects when dropped.
    pub fn session(&mut self) -> Result<StoreSession<'_>> {
        self.connect()?;
        Ok(StoreSession { store: self })
    }

    /// Create the settings table if it does not exist yet.
    ///
    /// Returns whether the table was created by this call.
    pub fn ensure_schema(&mut self) -> Result<bool> {
        schema::ensure(self.connect()?)
    }

    pub fn upsert(&mut self, record: &SettingsRecord) -> Result<()> {
        queries::settings::upsert(self.connect()?, record)
    }

    pub fn delete_by_app_id(&mut self, app_id: &str) -> Result<usize> {
        queries::settings::delete_by_app_id(self.connect()?, app_id)
    }

    pub fn delete_by_package(&mut self, pkg_id: &str) -> Result<usize> {
        queries::settings::delete_by_package(self.connect()?, pkg_id)
    }

    pub fn count_by_package(&mut self, pkg_id: &str) -> Result<usize> {
        queries::settings::count_by_package(self.connect()?, pkg_id)
    }

    pub fn get(&mut self, app_id: &str) -> Result<SettingsRecord> {
        queries::settings::get(self.connect()?, app_id)
    }

    pub fn list_by_package(&mut self, pkg_id: &str) -> Result<Vec<SettingsRecord>> {
        queries::settings::list_by_package(self.connect()?, pkg_id)
    }
}

/// A connected [`Store`] scoped to one hook invocation.
pub struct StoreSession<'a> {
    store: &'a mut Store,
}

impl Deref for StoreSession<'_> {
    type Target = Store;

    fn deref(&self) -> &Store {
        &*self.store
    }
}

impl DerefMut for StoreSession<'_> {
    fn deref_mut(&mut self) -> &mut Store {
        &mut *self.store
    }
}

impl Drop for StoreSession<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.store.disconnect() {
            tracing::warn!(error = %e, "failed to close settings store");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_memory() {
        let conn = open_memory().expect("open in-memory db");
        assert!(schema::table_exists(&conn).expect("check table"));
    }

    #[test]
    fn test_open_creates_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.db");

        let conn = open(&path).expect("open");
        assert!(path.is_file());
        assert!(schema::table_exists(&conn).expect("check table"));
    }

    #[test]
    fn test_open_empty_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.db");
        std::fs::write(&path, b"").expect("create empty file");

        let conn = open(&path).expect("open");
        assert!(schema::table_exists(&conn).expect("check table"));
    }

    #[test]
    fn test_open_directory_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = open(dir.path());
        assert!(matches!(result, Err(DbError::NotRegularFile(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_open_symlink_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("real.db");
        let link = dir.path().join("link.db");
        open(&target).expect("create target");
        std::os::unix::fs::symlink(&target, &link).expect("symlink");

        let result = open(&link);
        assert!(matches!(result, Err(DbError::NotRegularFile(_))));
    }

    #[test]
    fn test_session_disconnects_on_drop() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = Store::new(dir.path().join("settings.db"));
        assert!(!store.is_connected());

        {
            let mut session = store.session().expect("session");
            assert!(session.is_connected());
            session
                .upsert(&SettingsRecord::with_defaults("app", "pkg"))
                .expect("upsert");
        }

        assert!(!store.is_connected());
        // Data survives the reconnect.
        assert_eq!(store.count_by_package("pkg").expect("count"), 1);
        assert!(store.is_connected());
        store.disconnect().expect("disconnect");
        store.disconnect().expect("second disconnect is a no-op");
    }

    #[test]
    fn test_ensure_schema_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = Store::new(dir.path().join("settings.db"));
        assert!(!store.ensure_schema().expect("first"));
        assert!(!store.ensure_schema().expect("second"));

        let conn = store.connect().expect("connect");
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                [schema::TABLE],
                |row| row.get(0),
            )
            .expect("count tables");
        assert_eq!(tables, 1);
    }

    #[test]
    fn test_connect_failure_leaves_store_disconnected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = Store::new(dir.path());
        assert!(store.session().is_err());
        assert!(!store.is_connected());
    }
}

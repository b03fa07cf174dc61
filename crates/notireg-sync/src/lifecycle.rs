//! Package lifecycle hooks.
//!
//! The host calls the hooks serially, PRE → ACTION → POST for each of
//! install, upgrade and uninstall. Every hook that touches the store opens
//! it on entry and closes it before returning.

use notireg_db::Store;
use tracing::{debug, error, warn};

use crate::catalog::{AppCatalog, CatalogError};
use crate::Result;

/// The nine host hooks.
///
/// Hooks without settings work default to logging the call and succeeding.
pub trait Lifecycle {
    fn pre_install(&mut self, pkg_id: &str) -> Result<()> {
        debug!(pkg_id, "pre-install");
        Ok(())
    }

    fn install(&mut self, manifest: &str, pkg_id: &str) -> Result<()>;

    fn post_install(&mut self, pkg_id: &str) -> Result<()> {
        debug!(pkg_id, "post-install");
        Ok(())
    }

    fn pre_upgrade(&mut self, pkg_id: &str) -> Result<()>;

    fn upgrade(&mut self, manifest: &str, pkg_id: &str) -> Result<()>;

    fn post_upgrade(&mut self, pkg_id: &str) -> Result<()> {
        debug!(pkg_id, "post-upgrade");
        Ok(())
    }

    fn pre_uninstall(&mut self, pkg_id: &str) -> Result<()> {
        debug!(pkg_id, "pre-uninstall");
        Ok(())
    }

    /// The manifest is not consulted; the package's apps come from the host.
    fn uninstall(&mut self, manifest: &str, pkg_id: &str) -> Result<()>;

    fn post_uninstall(&mut self, pkg_id: &str) -> Result<()> {
        debug!(pkg_id, "post-uninstall");
        Ok(())
    }
}

/// Lifecycle hooks backed by the settings store.
pub struct LifecycleSync<C> {
    store: Store,
    catalog: C,
}

impl<C: AppCatalog> LifecycleSync<C> {
    pub fn new(store: Store, catalog: C) -> Self {
        Self { store, catalog }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    pub fn into_store(self) -> Store {
        self.store
    }

    /// Store the settings declared by `manifest` for `pkg_id`.
    ///
    /// Nothing is written unless the whole manifest extracts cleanly.
    pub fn install_data(&mut self, manifest: &str, pkg_id: &str) -> Result<()> {
        let mut session = self.store.session()?;

        let record = notireg_manifest::extract(manifest, pkg_id).inspect_err(|e| {
            error!(pkg_id, error = %e, "cannot read notification settings from manifest");
        })?;

        session.upsert(&record).inspect_err(|e| {
            error!(app_id = %record.app_id, pkg_id, error = %e, "failed to store settings");
        })?;

        debug!(app_id = %record.app_id, pkg_id, "stored notification settings");
        Ok(())
    }

    /// Drop every row of `pkg_id` so the upgraded manifest starts clean.
    ///
    /// Returns the number of rows removed.
    pub fn clear_package(&mut self, pkg_id: &str) -> Result<usize> {
        let mut session = self.store.session()?;

        let count = session.count_by_package(pkg_id)?;
        debug!(pkg_id, count, "apps registered before upgrade");
        if count == 0 {
            return Ok(0);
        }

        let removed = session.delete_by_package(pkg_id)?;
        debug!(pkg_id, removed, "cleared package settings");
        Ok(removed)
    }

    /// Delete the row of every app the catalog yields for `pkg_id`.
    ///
    /// Apps enumerated before a catalog failure are still removed; the
    /// failure itself is only logged. An unknown package is an error.
    pub fn remove_package_apps(&mut self, pkg_id: &str) -> Result<usize> {
        let mut session = self.store.session()?;

        let mut removed = 0;
        let walked = self.catalog.for_each_app(pkg_id, &mut |app_id| {
            removed += delete_app(&mut session, pkg_id, app_id);
        });

        match walked {
            Ok(()) => Ok(removed),
            Err(e @ CatalogError::UnknownPackage(_)) => {
                error!(pkg_id, error = %e, "package not found");
                Err(e.into())
            }
            Err(e) => {
                warn!(pkg_id, removed, error = %e, "app enumeration stopped early");
                Ok(removed)
            }
        }
    }
}

/// Delete one app's row, logging instead of failing. Returns rows removed.
fn delete_app(store: &mut Store, pkg_id: &str, app_id: &str) -> usize {
    match store.delete_by_app_id(app_id) {
        Ok(n) => {
            debug!(app_id, pkg_id, rows = n, "deleted notification settings");
            n
        }
        Err(e) => {
            warn!(app_id, pkg_id, error = %e, "failed to delete settings, skipping");
            0
        }
    }
}

impl<C: AppCatalog> Lifecycle for LifecycleSync<C> {
    fn install(&mut self, manifest: &str, pkg_id: &str) -> Result<()> {
        debug!(pkg_id, "install");
        self.install_data(manifest, pkg_id)
    }

    fn pre_upgrade(&mut self, pkg_id: &str) -> Result<()> {
        debug!(pkg_id, "pre-upgrade");
        self.clear_package(pkg_id).map(|_| ())
    }

    fn upgrade(&mut self, manifest: &str, pkg_id: &str) -> Result<()> {
        debug!(pkg_id, "upgrade");
        self.install_data(manifest, pkg_id)
    }

    fn uninstall(&mut self, _manifest: &str, pkg_id: &str) -> Result<()> {
        debug!(pkg_id, "uninstall");

        self.remove_package_apps(pkg_id).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use notireg_types::Status;

    use super::*;
    use crate::catalog::StaticCatalog;
    use crate::SyncError;

    const MANIFEST_A: &str = r#"<manifest>
        <settings appid="pkg.a">
            <notification section="badge">off</notification>
        </settings>
    </manifest>"#;

    /// Yields its apps, then reports an enumeration failure.
    struct InterruptedCatalog(Vec<&'static str>);

    impl AppCatalog for InterruptedCatalog {
        fn for_each_app(
            &self,
            pkg_id: &str,
            f: &mut dyn FnMut(&str),
        ) -> std::result::Result<(), CatalogError> {
            self.0.iter().for_each(|app_id| f(app_id));
            Err(CatalogError::Enumeration {
                pkg_id: pkg_id.to_string(),
                reason: "iterator aborted".to_string(),
            })
        }
    }

    fn sync_at(path: &Path, catalog: StaticCatalog) -> LifecycleSync<StaticCatalog> {
        LifecycleSync::new(Store::new(path), catalog)
    }

    #[test]
    fn test_install_stores_record() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut sync = sync_at(&dir.path().join("s.db"), StaticCatalog::new());

        sync.install(MANIFEST_A, "pkg").expect("install");
        assert!(!sync.store().is_connected());

        let record = sync.store_mut().get("pkg.a").expect("get");
        assert_eq!(record.badge, "off");
        assert_eq!(record.sounds, "on");
        assert_eq!(record.pkg_id, "pkg");
    }

    #[test]
    fn test_install_twice_replaces_row() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut sync = sync_at(&dir.path().join("s.db"), StaticCatalog::new());

        sync.install(MANIFEST_A, "pkg").expect("install");
        sync.upgrade(MANIFEST_A, "pkg").expect("upgrade without pre-upgrade");
        assert_eq!(sync.store_mut().count_by_package("pkg").expect("count"), 1);
    }

    #[test]
    fn test_install_missing_appid_writes_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut sync = sync_at(&dir.path().join("s.db"), StaticCatalog::new());

        let err = sync
            .install("<manifest><settings/></manifest>", "pkg")
            .expect_err("must fail");
        assert_eq!(err.status(), Status::InvalidArgument);
        assert!(!sync.store().is_connected());
        assert_eq!(sync.store_mut().count_by_package("pkg").expect("count"), 0);
    }

    #[test]
    fn test_connect_failure_fails_hook() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut sync = sync_at(dir.path(), StaticCatalog::new());

        let err = sync.install(MANIFEST_A, "pkg").expect_err("must fail");
        assert!(matches!(err, SyncError::Store(_)));
        assert_eq!(err.status(), Status::InvalidState);
        assert!(!sync.store().is_connected());
    }

    #[test]
    fn test_pre_upgrade_clears_package() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut sync = sync_at(&dir.path().join("s.db"), StaticCatalog::new());
        sync.install(MANIFEST_A, "pkg").expect("install");

        sync.pre_upgrade("pkg").expect("pre-upgrade");
        assert_eq!(sync.store_mut().count_by_package("pkg").expect("count"), 0);

        assert_eq!(sync.clear_package("pkg").expect("nothing left"), 0);
    }

    #[test]
    fn test_uninstall_unknown_package() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut sync = sync_at(&dir.path().join("s.db"), StaticCatalog::new());

        let err = sync.uninstall("", "ghost").expect_err("must fail");
        assert_eq!(err.status(), Status::InvalidArgument);
    }

    #[test]
    fn test_uninstall_enumeration_failure_is_not_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut sync = LifecycleSync::new(
            Store::new(dir.path().join("s.db")),
            InterruptedCatalog(Vec::new()),
        );
        sync.uninstall("", "pkg").expect("enumeration failure is logged only");
    }

    #[test]
    fn test_uninstall_removes_apps_enumerated_before_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("s.db");
        {
            let mut store = Store::new(&path);
            for app in ["a1", "a2", "a3"] {
                let record = notireg_types::SettingsRecord::with_defaults(app, "pkg");
                store.upsert(&record).expect("seed");
            }
        }

        let mut sync = LifecycleSync::new(Store::new(&path), InterruptedCatalog(vec!["a1", "a2"]));
        sync.uninstall("", "pkg").expect("uninstall succeeds");
        assert_eq!(sync.remove_package_apps("pkg").expect("nothing left"), 0);

        let store = sync.store_mut();
        assert!(matches!(store.get("a1"), Err(notireg_db::DbError::NotFound(_))));
        assert!(matches!(store.get("a2"), Err(notireg_db::DbError::NotFound(_))));
        assert!(store.get("a3").is_ok());
    }

    #[test]
    fn test_uninstall_continues_after_failed_delete() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("s.db");
        {
            let conn = notireg_db::open(&path).expect("open");
            for app in ["a1", "a2"] {
                let record = notireg_types::SettingsRecord::with_defaults(app, "pkg");
                notireg_db::queries::settings::upsert(&conn, &record).expect("seed");
            }
            conn.execute_batch(
                "CREATE TRIGGER fail_a1 BEFORE DELETE ON notification_setting
                 WHEN old.appid = 'a1'
                 BEGIN SELECT RAISE(ABORT, 'transient failure'); END;",
            )
            .expect("trigger");
        }

        let mut sync = sync_at(&path, StaticCatalog::single("pkg", ["a1", "a2"]));
        sync.uninstall("", "pkg").expect("uninstall is best-effort");

        let store = sync.store_mut();
        assert!(store.get("a1").is_ok());
        assert!(matches!(
            store.get("a2"),
            Err(notireg_db::DbError::NotFound(_))
        ));
    }

    #[test]
    fn test_pass_through_hooks() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut sync = sync_at(&dir.path().join("s.db"), StaticCatalog::new());
        sync.pre_install("pkg").expect("pre-install");
        sync.post_install("pkg").expect("post-install");
        sync.post_upgrade("pkg").expect("post-upgrade");
        sync.pre_uninstall("pkg").expect("pre-uninstall");
        sync.post_uninstall("pkg").expect("post-uninstall");
        assert!(!dir.path().join("s.db").exists());
    }
}

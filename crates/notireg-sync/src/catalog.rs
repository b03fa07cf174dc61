//! Application enumeration supplied by the package-manager host.

use std::collections::HashMap;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("unknown package: {0}")]
    UnknownPackage(String),

    #[error("app enumeration failed for {pkg_id}: {reason}")]
    Enumeration { pkg_id: String, reason: String },
}

/// Lists the applications a package owns.
pub trait AppCatalog {
    /// Call `f` once per app id of `pkg_id`.
    ///
    /// Apps yielded before an `Err` is returned have already been visited;
    /// `UnknownPackage` must be reported before any app is yielded.
    fn for_each_app(&self, pkg_id: &str, f: &mut dyn FnMut(&str)) -> Result<(), CatalogError>;
}

/// Catalog backed by a fixed package → apps table.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    packages: HashMap<String, Vec<String>>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog holding a single package.
    pub fn single<I, S>(pkg_id: impl Into<String>, app_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut catalog = Self::new();
        catalog.insert(pkg_id, app_ids);
        catalog
    }

    pub fn insert<I, S>(&mut self, pkg_id: impl Into<String>, app_ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.packages
            .insert(pkg_id.into(), app_ids.into_iter().map(Into::into).collect());
    }
}

impl AppCatalog for StaticCatalog {
    fn for_each_app(&self, pkg_id: &str, f: &mut dyn FnMut(&str)) -> Result<(), CatalogError> {
        let apps = self
            .packages
            .get(pkg_id)
            .ok_or_else(|| CatalogError::UnknownPackage(pkg_id.to_string()))?;
        apps.iter().for_each(|app_id| f(app_id));
        Ok(())
    }
}

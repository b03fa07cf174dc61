//! # notireg-sync
//!
//! Keeps the settings store in step with package install, upgrade and
//! uninstall. The host drives the [`Lifecycle`] hooks; [`LifecycleSync`]
//! implements them over a [`notireg_db::Store`].

pub mod catalog;
pub mod lifecycle;

pub use catalog::{AppCatalog, CatalogError, StaticCatalog};
pub use lifecycle::{Lifecycle, LifecycleSync};

use notireg_db::DbError;
use notireg_manifest::ManifestError;
use notireg_types::Status;

/// Hook failures.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("manifest: {0}")]
    Manifest(#[from] ManifestError),

    #[error("store: {0}")]
    Store(#[from] DbError),

    #[error("package catalog: {0}")]
    Catalog(#[from] CatalogError),
}

pub type Result<T> = std::result::Result<T, SyncError>;

impl SyncError {
    /// Status code reported to the host for this failure.
    pub fn status(&self) -> Status {
        match self {
            Self::Manifest(_) | Self::Catalog(_) => Status::InvalidArgument,
            Self::Store(DbError::NotRegularFile(_)) => Status::InvalidState,
            Self::Store(_) => Status::Io,
        }
    }
}

/// Collapse a hook result into the host status code.
pub fn status_of(result: &Result<()>) -> Status {
    match result {
        Ok(()) => Status::Ok,
        Err(e) => e.status(),
    }
}

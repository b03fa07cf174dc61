//! # notireg-types
//!
//! Shared domain types used across the notireg workspace: the per-application
//! notification settings record and the status codes returned to the
//! package-manager host.

pub mod record;
pub mod status;

pub use record::{Section, SettingsRecord};
pub use status::Status;

/// Toggle value meaning "enabled".
pub const ON: &str = "on";

/// Toggle value meaning "disabled".
pub const OFF: &str = "off";

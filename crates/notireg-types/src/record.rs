//! Notification settings record.

use serde::{Deserialize, Serialize};

use crate::{OFF, ON};

/// One row of the `notification_setting` table.
///
/// Every toggle holds its text value verbatim (normally `"on"` or `"off"`).
/// A record produced by extraction never has an unset toggle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsRecord {
    pub app_id: String,
    pub notification: String,
    pub sounds: String,
    pub contents: String,
    pub badge: String,
    pub pkg_id: String,
    /// Unused; kept for storage-format compatibility.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserved1: Option<String>,
    /// Unused; kept for storage-format compatibility.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserved2: Option<String>,
}

impl SettingsRecord {
    /// Record for `app_id` with every toggle at its default value.
    pub fn with_defaults(app_id: impl Into<String>, pkg_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            notification: Section::Notification.default_value().to_string(),
            sounds: Section::Sounds.default_value().to_string(),
            contents: Section::Contents.default_value().to_string(),
            badge: Section::Badge.default_value().to_string(),
            pkg_id: pkg_id.into(),
            reserved1: None,
            reserved2: None,
        }
    }

    /// Mutable access to the field a section routes into.
    pub fn field_mut(&mut self, section: Section) -> &mut String {
        match section {
            Section::Notification => &mut self.notification,
            Section::Sounds => &mut self.sounds,
            Section::Contents => &mut self.contents,
            Section::Badge => &mut self.badge,
        }
    }
}

/// The four settings a manifest may declare, keyed by its `section` attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Section {
    Notification,
    Sounds,
    Contents,
    Badge,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Notification,
        Section::Sounds,
        Section::Contents,
        Section::Badge,
    ];

    /// Parse a `section` attribute value. Unknown names yield `None`.
    pub fn from_attr(value: &str) -> Option<Self> {
        match value {
            "notification" => Some(Self::Notification),
            "sounds" => Some(Self::Sounds),
            "contents" => Some(Self::Contents),
            "badge" => Some(Self::Badge),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Notification => "notification",
            Self::Sounds => "sounds",
            Self::Contents => "contents",
            Self::Badge => "badge",
        }
    }

    /// Value stored when the manifest does not declare this section.
    pub fn default_value(self) -> &'static str {
        match self {
            Self::Contents => OFF,
            Self::Notification | Self::Sounds | Self::Badge => ON,
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

//! # notireg-manifest
//!
//! Extracts notification settings from a package manifest.
//!
//! The settings element is the first child element of the document root:
//!
//! ```xml
//! <manifest>
//!   <settings appid="org.example.mail">
//!     <notification section="badge">off</notification>
//!     <notification section="sounds">off</notification>
//!   </settings>
//! </manifest>
//! ```
//!
//! Only the element's direct `notification` children are read. Sections the
//! manifest leaves out get their default value.

use notireg_types::{Section, SettingsRecord};
use roxmltree::{Document, Node};

/// Attribute on the settings element naming the owning application.
pub const APPID_ATTR: &str = "appid";

/// Element name of a single setting.
pub const SETTING_ELEMENT: &str = "notification";

/// Attribute on a setting element selecting which field it sets.
pub const SECTION_ATTR: &str = "section";

/// Manifest extraction errors.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("malformed manifest: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("manifest root has no child element")]
    MissingSettingsElement,

    #[error("settings element <{0}> has no appid attribute")]
    MissingAppId(String),
}

pub type Result<T> = std::result::Result<T, ManifestError>;

/// Parse manifest text and extract the settings record for `pkg_id`.
pub fn extract(manifest: &str, pkg_id: &str) -> Result<SettingsRecord> {
    let doc = Document::parse(manifest)?;
    extract_document(&doc, pkg_id)
}

/// Extract the settings record from an already parsed manifest.
pub fn extract_document(doc: &Document<'_>, pkg_id: &str) -> Result<SettingsRecord> {
    let settings = doc
        .root_element()
        .children()
        .find(Node::is_element)
        .ok_or(ManifestError::MissingSettingsElement)?;

    let app_id = settings
        .attribute(APPID_ATTR)
        .ok_or_else(|| ManifestError::MissingAppId(settings.tag_name().name().to_string()))?;

    let mut record = SettingsRecord::with_defaults(app_id, pkg_id);

    for child in settings
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == SETTING_ELEMENT)
    {
        let Some(attr) = child.attribute(SECTION_ATTR) else {
            continue;
        };
        let Some(section) = Section::from_attr(attr) else {
            tracing::trace!(section = attr, app_id, "ignoring unknown section");
            continue;
        };
        *record.field_mut(section) = text_content(child);
    }

    tracing::debug!(
        app_id,
        pkg_id,
        notification = %record.notification,
        sounds = %record.sounds,
        contents = %record.contents,
        badge = %record.badge,
        "extracted notification settings"
    );
    Ok(record)
}

/// Concatenated text of every descendant text node, untrimmed.
fn text_content(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .collect()
}

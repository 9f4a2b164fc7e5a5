//! Types for metadata lookups.

use serde::{Deserialize, Serialize};

/// Release metadata for one torrent.
///
/// Values are raw as reported by the provider: the title may still contain
/// HTML character references and the year may be malformed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseMetadata {
    /// Hardware/software vendor, when the provider reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    /// Platform name as reported (e.g., "PS4", "Switch", "Windows").
    pub platform: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    /// Release type such as "DLC", "Update" or "Patch".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_type: Option<String>,
}

impl ReleaseMetadata {
    /// Create metadata with only platform and title set.
    pub fn new(platform: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            manufacturer: None,
            platform: platform.into(),
            title: title.into(),
            year: None,
            release_type: None,
        }
    }

    /// Set the manufacturer.
    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    /// Set the release year.
    pub fn with_year(mut self, year: impl ToString) -> Self {
        self.year = Some(year.to_string());
        self
    }

    /// Set the release type.
    pub fn with_release_type(mut self, release_type: impl Into<String>) -> Self {
        self.release_type = Some(release_type.into());
        self
    }
}

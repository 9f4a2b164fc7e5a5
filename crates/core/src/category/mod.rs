//! Category derivation.
//!
//! Turns release metadata into a `Manufacturer/Platform/Title (Year)` path.
//! Everything here is pure: the same metadata always yields the same string.

mod platforms;
mod sanitize;

pub use platforms::{
    ManufacturerEntry, PlatformEntry, PlatformPath, PlatformTable, UNKNOWN_MANUFACTURER,
};
pub use sanitize::{
    contains_forbidden, decode_html, normalize_year, sanitize_segment, FORBIDDEN_CHARS,
};

use thiserror::Error;

use crate::config::SyncConfig;
use crate::metadata::ReleaseMetadata;

/// Separator between category levels.
pub const SEPARATOR: &str = "/";

/// Errors that can occur while deriving a category.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CategoryError {
    #[error("Title is empty after sanitization (raw: '{0}')")]
    EmptyTitle(String),

    #[error("Platform is empty after sanitization (raw: '{0}')")]
    EmptyPlatform(String),
}

/// Optional extra levels around the base path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryOptions {
    /// Leading segment, e.g. "Games".
    pub prefix: Option<String>,
    /// Append the release type as a trailing segment.
    pub include_release_type: bool,
}

impl From<&SyncConfig> for CategoryOptions {
    fn from(config: &SyncConfig) -> Self {
        Self {
            prefix: config.category_prefix.clone(),
            include_release_type: config.include_release_type,
        }
    }
}

/// Derives category strings from release metadata.
#[derive(Debug, Clone, Default)]
pub struct CategoryDeriver {
    table: PlatformTable,
    options: CategoryOptions,
}

impl CategoryDeriver {
    pub fn new(table: PlatformTable, options: CategoryOptions) -> Self {
        Self { table, options }
    }

    /// Build the category for `metadata`.
    pub fn derive(&self, metadata: &ReleaseMetadata) -> Result<String, CategoryError> {
        derive_category(metadata, &self.table, &self.options)
    }
}

/// Build `[Prefix/]Manufacturer/Platform/Title[ (Year)][/ReleaseType]`.
pub fn derive_category(
    metadata: &ReleaseMetadata,
    table: &PlatformTable,
    options: &CategoryOptions,
) -> Result<String, CategoryError> {
    let title = sanitize_segment(&decode_html(&metadata.title));
    if title.is_empty() {
        return Err(CategoryError::EmptyTitle(metadata.title.clone()));
    }

    let raw_platform = decode_html(&metadata.platform);
    let raw_manufacturer = metadata.manufacturer.as_deref().map(decode_html);

    let path = table.resolve(raw_manufacturer.as_deref(), &raw_platform);

    let platform = sanitize_segment(&path.platform);
    if platform.is_empty() {
        return Err(CategoryError::EmptyPlatform(metadata.platform.clone()));
    }

    let manufacturer = match sanitize_segment(&path.manufacturer) {
        m if m.is_empty() => UNKNOWN_MANUFACTURER.to_string(),
        m => m,
    };

    let leaf = match normalize_year(metadata.year.as_deref()) {
        Some(year) => format!("{} ({})", title, year),
        None => title,
    };

    let mut segments = Vec::with_capacity(5);
    if let Some(prefix) = options.prefix.as_deref().map(sanitize_segment) {
        if !prefix.is_empty() {
            segments.push(prefix);
        }
    }
    segments.push(manufacturer);
    segments.push(platform);
    segments.push(leaf);
    if options.include_release_type {
        if let Some(release_type) = metadata.release_type.as_deref().and_then(release_type_segment) {
            segments.push(release_type);
        }
    }

    Ok(segments.join(SEPARATOR))
}

/// Canonical spelling for the common release types, sanitized text otherwise.
fn release_type_segment(release_type: &str) -> Option<String> {
    let segment = match release_type.trim().to_lowercase().as_str() {
        "" => return None,
        "update" => "Update".to_string(),
        "dlc" => "DLC".to_string(),
        "patch" => "Patch".to_string(),
        _ => sanitize_segment(release_type),
    };
    if segment.is_empty() {
        None
    } else {
        Some(segment)
    }
}

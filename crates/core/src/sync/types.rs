//! Types for the category sync run.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::torrent_client::TorrentClientError;

/// Errors that abort a sync run.
///
/// Anything that goes wrong for a single torrent is recorded in the report
/// instead.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Logging in to the torrent client or the tracker API failed.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The torrent list could not be fetched.
    #[error("failed to list torrents: {0}")]
    ListTorrents(#[source] TorrentClientError),
}

/// Categories known to exist in the torrent client.
///
/// Seeded from the client at the start of a run and extended as categories
/// are created, so each category is created at most once per run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownCategories(BTreeSet<String>);

impl KnownCategories {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, category: &str) -> bool {
        self.0.contains(category)
    }

    /// Returns `true` if the category was not known before.
    pub fn insert(&mut self, category: impl Into<String>) -> bool {
        self.0.insert(category.into())
    }

    pub fn remove(&mut self, category: &str) -> bool {
        self.0.remove(category)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl FromIterator<String> for KnownCategories {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<&'a str> for KnownCategories {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(str::to_string).collect())
    }
}

/// Why a torrent was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Carries the sorted tag from an earlier run.
    AlreadySorted,
    /// Not from the target tracker.
    OtherTracker,
    /// Has a category and overwriting is disabled.
    AlreadyCategorized,
    /// The tracker does not know the hash.
    NotFound,
    /// The derived category is already assigned.
    Unchanged,
    /// Dry run, nothing written.
    DryRun,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SkipReason::AlreadySorted => "already sorted",
            SkipReason::OtherTracker => "other tracker",
            SkipReason::AlreadyCategorized => "already categorized",
            SkipReason::NotFound => "not found on tracker",
            SkipReason::Unchanged => "category unchanged",
            SkipReason::DryRun => "dry run",
        };
        f.write_str(s)
    }
}

/// What happened to one torrent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TorrentOutcome {
    Updated { category: String },
    Skipped { reason: SkipReason },
    Failed { error: String },
}

impl TorrentOutcome {
    pub fn skipped(reason: SkipReason) -> Self {
        TorrentOutcome::Skipped { reason }
    }

    pub fn failed(error: impl fmt::Display) -> Self {
        TorrentOutcome::Failed {
            error: error.to_string(),
        }
    }

    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            TorrentOutcome::Skipped { reason } => Some(*reason),
            _ => None,
        }
    }
}

/// Outcome for a single torrent, keyed by hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentResult {
    pub hash: String,
    pub name: String,
    #[serde(flatten)]
    pub outcome: TorrentOutcome,
}

/// Per-torrent results of a run, in processing order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncReport {
    pub results: Vec<TorrentResult>,
}

impl SyncReport {
    pub fn record(&mut self, hash: &str, name: &str, outcome: TorrentOutcome) {
        self.results.push(TorrentResult {
            hash: hash.to_string(),
            name: name.to_string(),
            outcome,
        });
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn updated(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, TorrentOutcome::Updated { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, TorrentOutcome::Skipped { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, TorrentOutcome::Failed { .. }))
            .count()
    }

    /// Number of torrents skipped for `reason`.
    pub fn skipped_for(&self, reason: SkipReason) -> usize {
        self.results
            .iter()
            .filter(|r| r.outcome.skip_reason() == Some(reason))
            .count()
    }

    /// Result for the torrent with `hash`, if it was processed.
    pub fn get(&self, hash: &str) -> Option<&TorrentResult> {
        self.results.iter().find(|r| r.hash == hash)
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} updated, {} skipped, {} failed ({} torrents)",
            self.updated(),
            self.skipped(),
            self.failed(),
            self.total()
        )
    }
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub report: SyncReport,
    /// Known categories after the run, including any created by it.
    pub known_categories: KnownCategories,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_categories_insert_and_contains() {
        let mut known: KnownCategories = ["Sony/PlayStation 4/Bloodborne (2015)"].into_iter().collect();
        assert!(known.contains("Sony/PlayStation 4/Bloodborne (2015)"));
        assert!(!known.contains("Sony/PlayStation 4"));

        assert!(known.insert("Nintendo/Nintendo Switch/Hades (2020)"));
        assert!(!known.insert("Nintendo/Nintendo Switch/Hades (2020)"));
        assert_eq!(known.len(), 2);

        assert!(known.remove("Nintendo/Nintendo Switch/Hades (2020)"));
        assert_eq!(known.len(), 1);
    }

    #[test]
    fn test_report_counts() {
        let mut report = SyncReport::default();
        report.record(
            "aaa",
            "Odyssey",
            TorrentOutcome::Updated {
                category: "Nintendo/Nintendo Switch/Super Mario Odyssey (2017)".to_string(),
            },
        );
        report.record("bbb", "Linux ISO", TorrentOutcome::skipped(SkipReason::OtherTracker));
        report.record("ccc", "Unknown", TorrentOutcome::skipped(SkipReason::NotFound));
        report.record("ddd", "Broken", TorrentOutcome::failed("API error: 502"));

        assert_eq!(report.total(), 4);
        assert_eq!(report.updated(), 1);
        assert_eq!(report.skipped(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.skipped_for(SkipReason::NotFound), 1);
        assert_eq!(report.skipped_for(SkipReason::DryRun), 0);
        assert_eq!(
            report.get("ddd").map(|r| &r.outcome),
            Some(&TorrentOutcome::Failed {
                error: "API error: 502".to_string()
            })
        );
        assert_eq!(report.to_string(), "1 updated, 2 skipped, 1 failed (4 torrents)");
    }

    #[test]
    fn test_torrent_result_serialization() {
        let result = TorrentResult {
            hash: "abc".to_string(),
            name: "Doom".to_string(),
            outcome: TorrentOutcome::skipped(SkipReason::AlreadyCategorized),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["outcome"], "skipped");
        assert_eq!(json["reason"], "already_categorized");
        assert_eq!(json["hash"], "abc");
    }
}

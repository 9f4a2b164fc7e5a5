//! Category sync for tracker torrents.
//!
//! Walks the torrent list once and, for every torrent from the target
//! tracker, assigns a `Manufacturer/Platform/Title (Year)` category built
//! from the tracker's metadata:
//! - **Fatal**: login and listing failures abort the run
//! - **Per torrent**: lookup, derive and write failures are recorded and the
//!   run moves on

mod config;
mod runner;
mod types;

pub use config::SyncOptions;
pub use runner::CategorySync;
pub use types::{
    KnownCategories, SkipReason, SyncError, SyncOutcome, SyncReport, TorrentOutcome, TorrentResult,
};

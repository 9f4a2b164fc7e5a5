//! Torrent client abstraction.
//!
//! This module provides a `TorrentClient` trait covering the operations the
//! category sync needs: session login, torrent and tracker listing, and
//! category/tag write-back.

mod qbittorrent;
mod types;

pub use qbittorrent::QBittorrentClient;
pub use types::*;

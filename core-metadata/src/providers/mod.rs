//! External Metadata Providers
//!
//! This module contains clients for external metadata services:
//! - MusicBrainz - artist discography used to build a song catalog
//! - iTunes Search - 30 second audio previews
//! - YouTube - a video link for the song
//!
//! All of them talk HTTP through [`bridge_traits::http::HttpClient`], so tests swap
//! in a mock client. MusicBrainz requests are rate limited to comply with
//! the API terms of service.

pub mod itunes;
pub mod musicbrainz;
pub mod youtube;

pub use itunes::ITunesClient;
pub use musicbrainz::MusicBrainzClient;
pub use youtube::YouTubeClient;

use crate::error::Result;
use async_trait::async_trait;
use core_library::{SongDescriptor, SongStore};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Songs produced by one catalog fetch, in discovery order.
pub type CatalogBatch = SongStore;

/// Progress of a long-running fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchProgress {
    pub message: String,
    /// `None` while the total is unknown
    pub percent: Option<u8>,
}

impl FetchProgress {
    pub fn new(message: impl Into<String>, percent: Option<u8>) -> Self {
        Self {
            message: message.into(),
            percent,
        }
    }
}

impl fmt::Display for FetchProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.percent {
            Some(percent) => write!(f, "{} ({}%)", self.message, percent),
            None => f.write_str(&self.message),
        }
    }
}

/// Receives progress updates from a fetch.
pub type ProgressCallback = Arc<dyn Fn(FetchProgress) + Send + Sync>;

/// Builds a song catalog for an artist.
#[async_trait]
pub trait CatalogFetcher: Send + Sync {
    /// Fetch every studio track of `artist`.
    ///
    /// Releases whose secondary types appear in `reject_types` are skipped.
    /// Lookup failures yield an empty or partial batch; only cancellation is
    /// reported as an error, and a cancelled fetch returns no songs.
    async fn fetch(
        &self,
        artist: &str,
        reject_types: &[String],
        cancel: &CancellationToken,
        progress: Option<ProgressCallback>,
    ) -> Result<CatalogBatch>;
}

/// Finds a playable preview for a song.
#[async_trait]
pub trait PreviewResolver: Send + Sync {
    /// Preview URL for `song`, or `None` when nothing suitable exists or the
    /// lookup failed.
    async fn resolve(&self, song: &SongDescriptor) -> Option<String>;
}

/// Finds a video for a song.
#[async_trait]
pub trait VideoResolver: Send + Sync {
    /// Watch URL of the first video found for `song`, or `None` when the
    /// search came back empty or failed.
    async fn find_video(&self, song: &SongDescriptor) -> Option<String>;
}

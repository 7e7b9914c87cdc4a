//! # Catalog & Preview Providers
//!
//! Talks to external music services on behalf of the ranking core.
//!
//! ## Overview
//!
//! This module handles:
//! - Building a deduplicated song catalog for an artist from MusicBrainz
//!   (`providers::musicbrainz`, `normalize`)
//! - Looking up 30 second audio previews on iTunes (`providers::itunes`)
//! - Finding a video on YouTube (`providers::youtube`)
//!
//! Each is exposed behind a trait ([`CatalogFetcher`], [`PreviewResolver`],
//! [`VideoResolver`]) so the service layer and tests can substitute their own.

pub mod error;
pub mod normalize;
pub mod providers;

pub use error::{MetadataError, Result};
pub use normalize::{normalize_title, CatalogBuilder, ReleaseContext};
pub use providers::{
    CatalogBatch, CatalogFetcher, FetchProgress, ITunesClient, MusicBrainzClient, PreviewResolver,
    ProgressCallback, VideoResolver, YouTubeClient,
};

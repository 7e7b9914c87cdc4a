//! # Song Catalog Module
//!
//! Owns the user's song catalog and its on-disk representation.
//!
//! ## Overview
//!
//! This module manages:
//! - The ordered title → record store (`store`)
//! - Album filtering used by matchmaking and leaderboards (`filter`)
//! - Session file load/save with order-preserving JSON (`persistence`)
//! - CSV export of the ranked leaderboard (`export`)
//!
//! Everything here is synchronous and free of internal locking; callers that
//! share a store across tasks wrap it themselves.

pub mod error;
pub mod export;
pub mod filter;
pub mod models;
pub mod persistence;
pub mod store;

pub use error::{LibraryError, Result};
pub use filter::{AlbumFilter, ALL_ALBUMS_LABEL};
pub use models::{
    AlbumSummary, LeaderboardRow, NewSong, PreviewState, SongDescriptor, SongRecord,
    DEFAULT_RATING, UNKNOWN_ALBUM, UNKNOWN_ARTIST, UNKNOWN_YEAR,
};
pub use store::SongStore;

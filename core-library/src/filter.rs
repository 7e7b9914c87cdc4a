//! Album filter view over a [`SongStore`].

use crate::store::SongStore;
use std::fmt;

/// Label shown for the "no filter" choice.
pub const ALL_ALBUMS_LABEL: &str = "All Albums";

/// Which part of the catalog the matchmaker and song leaderboard see.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum AlbumFilter {
    #[default]
    All,
    Album(String),
}

impl AlbumFilter {
    /// Parse a filter label; the [`ALL_ALBUMS_LABEL`] sentinel means no filter.
    pub fn from_label(label: &str) -> Self {
        if label == ALL_ALBUMS_LABEL {
            Self::All
        } else {
            Self::Album(label.to_string())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::All => ALL_ALBUMS_LABEL,
            Self::Album(album) => album,
        }
    }

    pub fn matches(&self, album: &str) -> bool {
        match self {
            Self::All => true,
            Self::Album(wanted) => wanted == album,
        }
    }
}

impl fmt::Display for AlbumFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<&str> for AlbumFilter {
    fn from(label: &str) -> Self {
        Self::from_label(label)
    }
}

/// Distinct album labels in the store, sorted.
pub fn list_albums(store: &SongStore) -> Vec<String> {
    store.albums()
}

/// Titles visible through `filter`, in store order.
pub fn active_keys(store: &SongStore, filter: &AlbumFilter) -> Vec<String> {
    store
        .iter()
        .filter(|(_, record)| filter.matches(&record.album))
        .map(|(title, _)| title.to_string())
        .collect()
}

//! Track title normalization and catalog deduplication.
//!
//! The same song usually shows up on several releases under slightly
//! different titles ("Mama", "Mama (2007 Remaster)", "Mama - Live"). Titles
//! that normalize to the same key are treated as one song and the shortest
//! original title wins.

use core_library::{SongRecord, SongStore};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Qualifier keywords that mark a variant of a song rather than a new song.
pub const VARIANT_KEYWORDS: &[&str] = &[
    "remaster", "mix", "version", "live", "demo", "edit", "mono", "stereo", "remix", "deluxe",
    "expanded",
];

/// Parenthetical or bracketed phrase containing a keyword.
static QUALIFIER_GROUP: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(
        r"(?i)[\(\[][^\)\]]*?(?:{})[^\)\]]*?[\)\]]",
        VARIANT_KEYWORDS.join("|")
    );
    Regex::new(&pattern).expect("qualifier pattern is valid")
});

/// Trailing ` - ...` suffix containing a keyword.
static QUALIFIER_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(r"(?i)\s-\s.*?(?:{}).*?$", VARIANT_KEYWORDS.join("|"));
    Regex::new(&pattern).expect("suffix pattern is valid")
});

/// Deduplication key of a track title.
pub fn normalize_title(title: &str) -> String {
    let lowered = title
        .to_lowercase()
        .replace(['\u{2019}', '\u{2018}', '`'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"");
    let without_groups = QUALIFIER_GROUP.replace_all(&lowered, "");
    let without_suffix = QUALIFIER_SUFFIX.replace_all(&without_groups, "");
    without_suffix.trim().to_string()
}

/// Album-level data shared by every track of one release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseContext {
    /// Display label, `"{title} ({year})"`
    pub album: String,
    pub year: String,
    pub cover_url: Option<String>,
}

/// Collects tracks from many releases into a deduplicated catalog.
#[derive(Debug)]
pub struct CatalogBuilder {
    artist: String,
    rating: f64,
    songs: SongStore,
    canonical: HashMap<String, String>,
}

impl CatalogBuilder {
    pub fn new(artist: impl Into<String>, rating: f64) -> Self {
        Self {
            artist: artist.into(),
            rating,
            songs: SongStore::new(),
            canonical: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    /// Add one track of `release`.
    ///
    /// A shorter title for an already known song re-keys the stored one,
    /// which moves it to the end and takes this release's album and year. A longer or equal title only
    /// contributes a cover when the stored song has none.
    pub fn add_track(&mut self, title: &str, release: &ReleaseContext) {
        let key = normalize_title(title);

        let Some(existing) = self.canonical.get(&key).cloned() else {
            let record = SongRecord::new(&self.artist, &release.album, &release.year, self.rating)
                .with_cover_url(release.cover_url.clone());
            if self.songs.insert(title, record).is_ok() {
                self.canonical.insert(key, title.to_string());
            }
            return;
        };

        if title.chars().count() < existing.chars().count() {
            if self.songs.rename(&existing, title).is_err() {
                return;
            }
            self.canonical.insert(key, title.to_string());
            if let Some(record) = self.songs.get_mut(title) {
                record.cover_url = release.cover_url.clone().or(record.cover_url.take());
                record.album = release.album.clone();
                record.year = release.year.clone();
            }
        } else if let Some(record) = self.songs.get_mut(&existing) {
            if record.cover_url.is_none() && release.cover_url.is_some() {
                record.cover_url = release.cover_url.clone();
                record.album = release.album.clone();
                record.year = release.year.clone();
            }
        }
    }

    pub fn finish(self) -> SongStore {
        self.songs
    }
}

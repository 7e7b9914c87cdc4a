//! Domain models for the song catalog
//!
//! A catalog maps a unique display title to a [`SongRecord`]. The title is the
//! key; records never carry it themselves.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Rating given to songs that have never been compared.
pub const DEFAULT_RATING: f64 = 1200.0;
/// Placeholder artist for manual entries without one.
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
/// Placeholder album for manual entries without one.
pub const UNKNOWN_ALBUM: &str = "Unknown Album";
/// Placeholder year when the release date is unknown.
pub const UNKNOWN_YEAR: &str = "????";

// =============================================================================
// Preview state
// =============================================================================

/// Cached result of a preview lookup.
///
/// On disk `Unknown` is an absent `preview_url` field, `NotFound` is the empty
/// string and `Found` is the URL itself.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PreviewState {
    /// Never looked up.
    #[default]
    Unknown,
    /// Looked up, nothing playable exists.
    NotFound,
    /// Looked up, playable URL.
    Found(String),
}

impl PreviewState {
    /// Build the state recorded after a lookup finished.
    ///
    /// `None` and an empty string both mean "looked up, not found".
    pub fn from_lookup(url: Option<String>) -> Self {
        match url {
            Some(url) if !url.trim().is_empty() => Self::Found(url),
            _ => Self::NotFound,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Found(url) => Some(url),
            _ => None,
        }
    }
}

impl Serialize for PreviewState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Unknown => serializer.serialize_none(),
            Self::NotFound => serializer.serialize_str(""),
            Self::Found(url) => serializer.serialize_str(url),
        }
    }
}

impl<'de> Deserialize<'de> for PreviewState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(match raw {
            None => Self::Unknown,
            Some(url) if url.is_empty() => Self::NotFound,
            Some(url) => Self::Found(url),
        })
    }
}

// =============================================================================
// Song record
// =============================================================================

fn default_rating() -> f64 {
    DEFAULT_RATING
}

fn default_artist() -> String {
    UNKNOWN_ARTIST.to_string()
}

fn default_album() -> String {
    UNKNOWN_ALBUM.to_string()
}

fn default_year() -> String {
    UNKNOWN_YEAR.to_string()
}

/// A ranked song. Field order matches the persisted JSON layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongRecord {
    /// ELO rating
    #[serde(default = "default_rating")]
    pub score: f64,
    /// Number of comparisons this song took part in
    #[serde(default)]
    pub matches: u32,
    /// Album display label, may embed a year, e.g. `"Duke (1980)"`
    #[serde(default = "default_album")]
    pub album: String,
    /// Four-digit year or [`UNKNOWN_YEAR`]
    #[serde(default = "default_year")]
    pub year: String,
    #[serde(default = "default_artist")]
    pub artist: String,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default, skip_serializing_if = "PreviewState::is_unknown")]
    pub preview_url: PreviewState,
}

impl SongRecord {
    /// A fresh record with the given rating and no comparisons.
    pub fn new(
        artist: impl Into<String>,
        album: impl Into<String>,
        year: impl Into<String>,
        rating: f64,
    ) -> Self {
        Self {
            score: rating,
            matches: 0,
            album: album.into(),
            year: year.into(),
            artist: artist.into(),
            cover_url: None,
            preview_url: PreviewState::Unknown,
        }
    }

    pub fn with_cover_url(mut self, cover_url: Option<String>) -> Self {
        self.cover_url = cover_url;
        self
    }

    /// Descriptor handed to a preview resolver.
    pub fn descriptor(&self, title: &str) -> SongDescriptor {
        SongDescriptor {
            artist: self.artist.clone(),
            title: title.to_string(),
            album: self.album.clone(),
        }
    }
}

/// Song identity used for preview lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SongDescriptor {
    pub artist: String,
    pub title: String,
    pub album: String,
}

impl fmt::Display for SongDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} ({})", self.artist, self.title, self.album)
    }
}

/// User-entered song. Blank fields fall back to the unknown placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewSong {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub year: String,
}

impl NewSong {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = artist.into();
        self
    }

    pub fn album(mut self, album: impl Into<String>) -> Self {
        self.album = album.into();
        self
    }

    pub fn year(mut self, year: impl Into<String>) -> Self {
        self.year = year.into();
        self
    }

    /// Trimmed title, or `None` when it is blank.
    pub fn normalized_title(&self) -> Option<String> {
        let title = self.title.trim();
        (!title.is_empty()).then(|| title.to_string())
    }

    /// Build the record, applying placeholders to blank fields.
    pub fn into_record(self, rating: f64) -> SongRecord {
        fn or_placeholder(value: String, placeholder: &str) -> String {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                placeholder.to_string()
            } else {
                trimmed.to_string()
            }
        }

        SongRecord::new(
            or_placeholder(self.artist, UNKNOWN_ARTIST),
            or_placeholder(self.album, UNKNOWN_ALBUM),
            or_placeholder(self.year, UNKNOWN_YEAR),
            rating,
        )
    }
}

/// One row of the song leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardRow {
    /// 1-based position
    pub rank: usize,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub year: String,
    pub score: f64,
    pub matches: u32,
}

/// One row of the album leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlbumSummary {
    pub album: String,
    /// Artist of the first song of the album in catalog order
    pub artist: String,
    pub average_score: f64,
    pub song_count: usize,
    /// First non-null cover in catalog order
    pub cover_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_state_from_lookup() {
        assert_eq!(PreviewState::from_lookup(None), PreviewState::NotFound);
        assert_eq!(
            PreviewState::from_lookup(Some(String::new())),
            PreviewState::NotFound
        );
        assert_eq!(
            PreviewState::from_lookup(Some("https://a/b.m4a".to_string())),
            PreviewState::Found("https://a/b.m4a".to_string())
        );
    }

    #[test]
    fn test_record_serializes_tri_state_preview() {
        let mut record = SongRecord::new("Genesis", "Duke (1980)", "1980", DEFAULT_RATING);

        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("preview_url").is_none());
        assert_eq!(json["cover_url"], serde_json::Value::Null);

        record.preview_url = PreviewState::NotFound;
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["preview_url"], "");

        record.preview_url = PreviewState::Found("https://p/x.m4a".to_string());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["preview_url"], "https://p/x.m4a");
    }

    #[test]
    fn test_record_deserializes_legacy_shapes() {
        let record: SongRecord = serde_json::from_str(
            r#"{"score": 1216, "matches": 1, "album": "Duke (1980)", "year": "1980",
                "artist": "Genesis", "cover_url": null}"#,
        )
        .unwrap();
        assert_eq!(record.score, 1216.0);
        assert_eq!(record.preview_url, PreviewState::Unknown);

        let record: SongRecord =
            serde_json::from_str(r#"{"score": 1200.5, "matches": 0, "preview_url": ""}"#).unwrap();
        assert_eq!(record.preview_url, PreviewState::NotFound);
        assert_eq!(record.artist, UNKNOWN_ARTIST);
        assert_eq!(record.year, UNKNOWN_YEAR);
    }

    #[test]
    fn test_new_song_placeholders() {
        let record = NewSong::new("Mama").artist("  ").into_record(DEFAULT_RATING);
        assert_eq!(record.artist, UNKNOWN_ARTIST);
        assert_eq!(record.album, UNKNOWN_ALBUM);
        assert_eq!(record.year, UNKNOWN_YEAR);
        assert_eq!(record.score, 1200.0);
        assert_eq!(record.matches, 0);
        assert!(record.cover_url.is_none());

        assert_eq!(NewSong::new("   ").normalized_title(), None);
        assert_eq!(
            NewSong::new(" Mama ").normalized_title(),
            Some("Mama".to_string())
        );
    }
}

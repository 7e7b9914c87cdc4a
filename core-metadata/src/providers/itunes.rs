//! iTunes Search API client for audio previews.
//!
//! Queries `{base}/search?term={artist} {title}&media=music&entity=song` and
//! picks a result whose artist and track name loosely match the song. A
//! result that also matches the album ends the search early.

use super::PreviewResolver;
use crate::error::{MetadataError, Result};
use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest};
use core_library::SongDescriptor;
use core_runtime::config::MetadataApiConfig;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResult {
    #[serde(default)]
    artist_name: String,
    #[serde(default)]
    track_name: String,
    #[serde(default)]
    collection_name: String,
    #[serde(default)]
    preview_url: Option<String>,
}

/// Lowercase ASCII letters and digits only.
fn normalize(value: &str) -> String {
    value
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// True when either string contains the other.
fn loosely_matches(a: &str, b: &str) -> bool {
    a.contains(b) || b.contains(a)
}

/// Pick the result to take the preview from.
///
/// The last artist-and-title match wins unless a match on the album as well
/// is found first.
fn best_match<'a>(song: &SongDescriptor, results: &'a [SearchResult]) -> Option<&'a SearchResult> {
    let artist = normalize(&song.artist);
    let title = normalize(&song.title);
    let album = normalize(&song.album);

    let mut best = None;
    for result in results {
        if !loosely_matches(&artist, &normalize(&result.artist_name)) {
            continue;
        }
        if !loosely_matches(&title, &normalize(&result.track_name)) {
            continue;
        }
        best = Some(result);
        if !album.is_empty() && loosely_matches(&album, &normalize(&result.collection_name)) {
            break;
        }
    }
    best
}

/// iTunes Search API client
pub struct ITunesClient {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    result_limit: u32,
    timeout: Duration,
}

impl ITunesClient {
    pub fn new(http_client: Arc<dyn HttpClient>, config: &MetadataApiConfig) -> Self {
        Self {
            http_client,
            base_url: config.itunes_base_url.clone(),
            result_limit: config.itunes_result_limit,
            timeout: config.preview_timeout(),
        }
    }

    async fn search(&self, song: &SongDescriptor) -> Result<Vec<SearchResult>> {
        let request = HttpRequest::get(format!("{}/search", self.base_url))
            .query("term", format!("{} {}", song.artist, song.title))
            .query("media", "music")
            .query("entity", "song")
            .query("limit", self.result_limit.to_string())
            .timeout(self.timeout);

        let response = self.http_client.execute(request).await.map_err(|e| {
            MetadataError::NetworkError(format!("iTunes search failed: {}", e))
        })?;

        if !response.is_success() {
            return Err(MetadataError::HttpError {
                status: response.status,
                body: String::from_utf8_lossy(&response.body).to_string(),
            });
        }

        let parsed: SearchResponse = serde_json::from_slice(&response.body).map_err(|e| {
            MetadataError::JsonParse(format!("Failed to parse iTunes results: {}", e))
        })?;
        Ok(parsed.results)
    }

    /// Preview lookup that keeps the failure reason.
    pub async fn lookup(&self, song: &SongDescriptor) -> Result<Option<String>> {
        let results = self.search(song).await?;
        let url = best_match(song, &results)
            .and_then(|result| result.preview_url.clone())
            .filter(|url| !url.is_empty());
        Ok(url)
    }
}

#[async_trait]
impl PreviewResolver for ITunesClient {
    #[instrument(skip_all, fields(song = %song))]
    async fn resolve(&self, song: &SongDescriptor) -> Option<String> {
        match self.lookup(song).await {
            Ok(Some(url)) => {
                debug!(%url, "Preview found");
                Some(url)
            }
            Ok(None) => {
                debug!("No matching preview");
                None
            }
            Err(e) => {
                warn!(error = %e, "Preview lookup failed");
                None
            }
        }
    }
}

//! YouTube video search.
//!
//! Loads `{base}/results?search_query={artist} {title}` and takes the first
//! video renderer on the page. There is no API key involved; the results page
//! embeds its data as JSON and only the video id is needed from it.

use super::VideoResolver;
use crate::error::{MetadataError, Result};
use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest};
use core_library::SongDescriptor;
use core_runtime::config::MetadataApiConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

static VIDEO_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""videoRenderer"\s*:\s*\{\s*"videoId"\s*:\s*"([A-Za-z0-9_-]{11})""#)
        .expect("valid video id pattern")
});

/// First video id on a results page.
fn first_video_id(page: &str) -> Option<&str> {
    VIDEO_ID
        .captures(page)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

/// YouTube search client
pub struct YouTubeClient {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    timeout: Duration,
}

impl YouTubeClient {
    pub fn new(http_client: Arc<dyn HttpClient>, config: &MetadataApiConfig) -> Self {
        Self {
            http_client,
            base_url: config.youtube_base_url.trim_end_matches('/').to_string(),
            timeout: config.video_timeout(),
        }
    }

    fn watch_url(&self, video_id: &str) -> String {
        format!("{}/watch?v={}", self.base_url, video_id)
    }

    /// Video lookup that keeps the failure reason.
    pub async fn lookup(&self, song: &SongDescriptor) -> Result<Option<String>> {
        let request = HttpRequest::get(format!("{}/results", self.base_url))
            .query("search_query", format!("{} {}", song.artist, song.title))
            .header("Accept-Language", "en-US,en;q=0.9")
            .timeout(self.timeout);

        let response = self.http_client.execute(request).await.map_err(|e| {
            MetadataError::NetworkError(format!("YouTube search failed: {}", e))
        })?;

        if !response.is_success() {
            return Err(MetadataError::HttpError {
                status: response.status,
                body: String::from_utf8_lossy(&response.body).to_string(),
            });
        }

        let page = response.text()?;
        Ok(first_video_id(&page).map(|id| self.watch_url(id)))
    }
}

#[async_trait]
impl VideoResolver for YouTubeClient {
    #[instrument(skip_all, fields(song = %song))]
    async fn find_video(&self, song: &SongDescriptor) -> Option<String> {
        match self.lookup(song).await {
            Ok(Some(url)) => {
                debug!(%url, "Video found");
                Some(url)
            }
            Ok(None) => {
                debug!("No video on results page");
                None
            }
            Err(e) => {
                warn!(error = %e, "Video search failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_video_id_skips_non_video_entries() {
        let page = r#"<script>var ytInitialData = {"contents":[
            {"channelRenderer":{"channelId":"UCgenesis"}},
            {"videoRenderer":{"videoId":"Jx9sH7dJ0xA","title":{"runs":[{"text":"Genesis - Mama"}]}}},
            {"videoRenderer":{"videoId":"zzzzzzzzzzz"}}
        ]};</script>"#;
        assert_eq!(first_video_id(page), Some("Jx9sH7dJ0xA"));
    }

    #[test]
    fn test_first_video_id_tolerates_whitespace() {
        let page = r#"{"videoRenderer": { "videoId": "a-b_c123456" }}"#;
        assert_eq!(first_video_id(page), Some("a-b_c123456"));
    }

    #[test]
    fn test_first_video_id_none_without_results() {
        assert_eq!(first_video_id(r#"{"contents":[]}"#), None);
        assert_eq!(first_video_id(r#"{"videoRenderer":{"videoId":"short"}}"#), None);
        assert_eq!(first_video_id(""), None);
    }
}

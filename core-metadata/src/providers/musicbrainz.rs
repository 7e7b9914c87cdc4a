//! MusicBrainz API Client
//!
//! Builds a song catalog from an artist's discography.
//!
//! ## API Endpoints
//!
//! - **Artist search**: `{base}/artist?query=artist:"{name}"&limit=1&fmt=json`
//! - **Release browse**: `{base}/release?artist={mbid}&type=album&inc=recordings+release-groups&limit=30&offset={n}&fmt=json`
//! - **Cover Art**: `http://coverartarchive.org/release/{mbid}/front-250`
//!
//! ## Rate Limiting
//!
//! MusicBrainz allows roughly one request per second for identified clients.
//! The client waits `rate_limit_delay_ms` (1.5 s by default) between
//! requests and retries transport failures with exponential backoff.
//!
//! ## User Agent Requirement
//!
//! MusicBrainz requires all API clients to identify themselves with a proper User-Agent header:
//! Format: "ApplicationName/Version (ContactUrl)"
//!
//! ## Usage
//!
//! ```ignore
//! use core_metadata::providers::{CatalogFetcher, MusicBrainzClient};
//! use core_runtime::config::MetadataApiConfig;
//! use tokio_util::sync::CancellationToken;
//!
//! let client = MusicBrainzClient::new(http_client, MetadataApiConfig::default());
//! let songs = client
//!     .fetch("Genesis", &["Live".to_string()], &CancellationToken::new(), None)
//!     .await?;
//! ```

use super::{CatalogBatch, CatalogFetcher, FetchProgress, ProgressCallback};
use crate::error::{MetadataError, Result};
use crate::normalize::{CatalogBuilder, ReleaseContext};
use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest, RetryPolicy};
use bridge_traits::time::{Clock, SystemClock};
use core_library::{DEFAULT_RATING, UNKNOWN_YEAR};
use core_runtime::config::MetadataApiConfig;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Cover Art Archive base URL
const COVERART_ARCHIVE_BASE: &str = "http://coverartarchive.org";

/// Upper bound for a single backoff delay
const MAX_BACKOFF: Duration = Duration::from_secs(300);

/// MusicBrainz API client
///
/// Implements [`CatalogFetcher`]. Every request goes through the shared rate
/// limiter, so one client can be used from several tasks.
pub struct MusicBrainzClient {
    http_client: Arc<dyn HttpClient>,
    config: MetadataApiConfig,
    initial_rating: f64,
    rate_limiter: Arc<Mutex<RateLimiter>>,
}

/// Simple rate limiter to enforce delay between requests
struct RateLimiter {
    clock: Arc<dyn Clock>,
    last_request_ms: Option<i64>,
    min_delay: Duration,
}

impl RateLimiter {
    fn new(delay: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            last_request_ms: None,
            min_delay: delay,
        }
    }

    async fn wait_if_needed(&mut self) {
        if let Some(last) = self.last_request_ms {
            let now = self.clock.unix_timestamp_millis();
            let elapsed_ms = now - last;
            let required_ms = self.min_delay.as_millis() as i64;
            if elapsed_ms < required_ms {
                let wait_time = Duration::from_millis((required_ms - elapsed_ms) as u64);
                debug!("Rate limiting: waiting {:?}", wait_time);
                sleep(wait_time).await;
            }
        }
        self.last_request_ms = Some(self.clock.unix_timestamp_millis());
    }
}

#[derive(Debug, Deserialize)]
struct ArtistSearchResponse {
    #[serde(default)]
    artists: Vec<Artist>,
}

#[derive(Debug, Clone, Deserialize)]
struct Artist {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ReleasePage {
    #[serde(default)]
    release_count: Option<u64>,
    #[serde(default)]
    releases: Vec<Release>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct Release {
    id: String,
    title: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    release_group: Option<ReleaseGroup>,
    #[serde(default)]
    cover_art_archive: Option<CoverArtArchive>,
    #[serde(default)]
    media: Vec<Medium>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ReleaseGroup {
    #[serde(default)]
    primary_type: Option<String>,
    #[serde(default)]
    secondary_types: Vec<String>,
    #[serde(default)]
    first_release_date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct CoverArtArchive {
    #[serde(default)]
    front: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct Medium {
    #[serde(default)]
    tracks: Vec<Track>,
}

#[derive(Debug, Clone, Deserialize)]
struct Track {
    #[serde(default)]
    recording: Option<Recording>,
}

#[derive(Debug, Clone, Deserialize)]
struct Recording {
    title: String,
}

impl Release {
    /// Album-level data for this release, or `None` when it is filtered out.
    fn context(&self, reject_types: &[String]) -> Option<ReleaseContext> {
        let rejects = |label: &str| reject_types.iter().any(|t| t == label);

        match self.status.as_deref() {
            Some("Official") => {}
            Some("Bootleg") if !rejects("Bootleg") => {}
            _ => return None,
        }

        let group = self.release_group.as_ref()?;
        if group.primary_type.as_deref() != Some("Album") {
            return None;
        }
        if group.secondary_types.iter().any(|t| rejects(t)) {
            return None;
        }

        let year = group
            .first_release_date
            .as_deref()
            .filter(|d| !d.is_empty())
            .or(self.date.as_deref())
            .filter(|d| !d.is_empty())
            .map(|d| d.chars().take(4).collect::<String>())
            .unwrap_or_else(|| UNKNOWN_YEAR.to_string());

        let cover_url = self
            .cover_art_archive
            .as_ref()
            .filter(|art| art.front)
            .map(|_| format!("{}/release/{}/front-250", COVERART_ARCHIVE_BASE, self.id));

        Some(ReleaseContext {
            album: format!("{} ({})", self.title, year),
            year,
            cover_url,
        })
    }

    fn track_titles(&self) -> impl Iterator<Item = &str> + '_ {
        self.media
            .iter()
            .flat_map(|medium| medium.tracks.iter())
            .filter_map(|track| track.recording.as_ref())
            .map(|recording| recording.title.as_str())
    }
}

impl MusicBrainzClient {
    /// Creates a new MusicBrainz API client
    ///
    /// The user agent, rate limit, page size and retry settings come from
    /// `config`.
    pub fn new(http_client: Arc<dyn HttpClient>, config: MetadataApiConfig) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Self::with_clock(http_client, config, clock)
    }

    pub fn with_clock(
        http_client: Arc<dyn HttpClient>,
        config: MetadataApiConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let limiter = RateLimiter::new(config.rate_limit_delay(), clock);
        Self {
            http_client,
            config,
            initial_rating: DEFAULT_RATING,
            rate_limiter: Arc::new(Mutex::new(limiter)),
        }
    }

    /// Rating given to every fetched song.
    pub fn with_initial_rating(mut self, rating: f64) -> Self {
        self.initial_rating = rating;
        self
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.config.max_retries.max(1),
            base_delay: self.config.retry_base_delay(),
            max_delay: MAX_BACKOFF,
            use_exponential_backoff: true,
        }
    }

    /// Rate-limited GET returning the decoded JSON body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        request: HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<T> {
        if cancel.is_cancelled() {
            return Err(MetadataError::Cancelled);
        }
        self.rate_limiter.lock().await.wait_if_needed().await;

        let request = request
            .query("fmt", "json")
            .header("User-Agent", &self.config.musicbrainz_user_agent)
            .header("Accept", "application/json")
            .timeout(self.config.catalog_timeout());

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(MetadataError::Cancelled),
            response = self.http_client.execute_with_retry(request, self.retry_policy()) => {
                response.map_err(|e| {
                    MetadataError::NetworkError(format!("MusicBrainz request failed: {}", e))
                })?
            }
        };

        match response.status {
            status if (200..300).contains(&status) => {}
            429 | 503 => {
                let retry_after = response
                    .headers
                    .get("Retry-After")
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                return Err(MetadataError::RateLimited {
                    provider: "MusicBrainz".to_string(),
                    retry_after_seconds: retry_after,
                });
            }
            status => {
                return Err(MetadataError::HttpError {
                    status,
                    body: String::from_utf8_lossy(&response.body).to_string(),
                })
            }
        }

        serde_json::from_slice(&response.body)
            .map_err(|e| MetadataError::JsonParse(format!("MusicBrainz response: {}", e)))
    }

    /// Best matching artist for `name`.
    async fn search_artist(&self, name: &str, cancel: &CancellationToken) -> Result<Option<Artist>> {
        let request = HttpRequest::get(format!("{}/artist", self.config.musicbrainz_base_url))
            .query("query", format!("artist:\"{}\"", Self::escape_query(name)))
            .query("limit", "1");

        let response: ArtistSearchResponse = self.get_json(request, cancel).await?;
        Ok(response.artists.into_iter().next())
    }

    /// One page of the artist's album releases.
    async fn browse_releases(
        &self,
        artist_id: &str,
        offset: usize,
        cancel: &CancellationToken,
    ) -> Result<ReleasePage> {
        let request = HttpRequest::get(format!("{}/release", self.config.musicbrainz_base_url))
            .query("artist", artist_id)
            .query("type", "album")
            .query("inc", "recordings release-groups")
            .query("limit", self.config.release_page_size.to_string())
            .query("offset", offset.to_string());

        self.get_json(request, cancel).await
    }

    /// Escapes special characters in Lucene query syntax
    fn escape_query(s: &str) -> String {
        const SPECIAL: &[char] = &[
            '\\', '"', '+', '-', '!', '(', ')', '{', '}', '[', ']', '^', '~', '*', '?', ':', '/',
            '.',
        ];
        let mut escaped = String::with_capacity(s.len());
        for c in s.chars() {
            if SPECIAL.contains(&c) {
                escaped.push('\\');
            }
            escaped.push(c);
        }
        escaped
    }
}

fn report(progress: &Option<ProgressCallback>, message: String, percent: Option<u8>) {
    debug!(%message, ?percent, "Fetch progress");
    if let Some(callback) = progress {
        callback(FetchProgress::new(message, percent));
    }
}

#[async_trait]
impl CatalogFetcher for MusicBrainzClient {
    #[instrument(skip(self, reject_types, cancel, progress))]
    async fn fetch(
        &self,
        artist: &str,
        reject_types: &[String],
        cancel: &CancellationToken,
        progress: Option<ProgressCallback>,
    ) -> Result<CatalogBatch> {
        report(&progress, format!("Searching {}...", artist), None);

        let found = match self.search_artist(artist, cancel).await {
            Ok(Some(found)) => found,
            Ok(None) => {
                info!("No artist found on MusicBrainz for '{}'", artist);
                return Ok(CatalogBatch::new());
            }
            Err(MetadataError::Cancelled) => return Err(MetadataError::Cancelled),
            Err(e) => {
                warn!(error = %e, "Artist search failed");
                report(&progress, format!("Artist search failed: {}", e), None);
                return Ok(CatalogBatch::new());
            }
        };

        info!(artist_id = %found.id, name = %found.name, "Resolved artist");
        report(
            &progress,
            format!("Fetching release data for {}...", found.name),
            None,
        );

        let mut builder = CatalogBuilder::new(found.name.as_str(), self.initial_rating);
        let mut offset = 0usize;
        let mut processed = 0u64;

        loop {
            let page = match self.browse_releases(&found.id, offset, cancel).await {
                Ok(page) => page,
                Err(MetadataError::Cancelled) => return Err(MetadataError::Cancelled),
                Err(e) => {
                    warn!(offset, error = %e, "Error fetching releases, keeping what was found");
                    report(
                        &progress,
                        format!("Error fetching releases at offset {}: {}", offset, e),
                        None,
                    );
                    break;
                }
            };

            if page.releases.is_empty() {
                break;
            }

            for release in &page.releases {
                processed += 1;
                let Some(context) = release.context(reject_types) else {
                    debug!(release = %release.title, "Skipping release");
                    continue;
                };
                for title in release.track_titles() {
                    builder.add_track(title, &context);
                }
            }

            offset += page.releases.len();
            let percent = page
                .release_count
                .filter(|total| *total > 0)
                .map(|total| (processed * 100 / total).min(100) as u8);
            report(
                &progress,
                format!(
                    "Processed {} releases... (found {} unique songs so far)",
                    processed,
                    builder.len()
                ),
                percent,
            );
        }

        if cancel.is_cancelled() {
            return Err(MetadataError::Cancelled);
        }

        info!(songs = builder.len(), releases = processed, "Catalog fetch finished");
        Ok(builder.finish())
    }
}

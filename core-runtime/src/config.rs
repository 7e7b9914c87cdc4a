//! # Core Configuration Module
//!
//! Provides configuration management for the SongClash core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds the tunable constants of the ranking engine, the
//! settings for the remote catalog and preview services, and the optional
//! bridges the core needs to reach the network. Every section validates
//! itself and [`CoreConfigBuilder::build`] fails fast on the first problem.
//!
//! ## Sections
//!
//! - [`RankingConfig`] - matchmaking history, challenger pool and ELO constants
//! - [`MetadataApiConfig`] - MusicBrainz / iTunes endpoints, rate limit, retries
//! - reject list - release types skipped by catalog imports
//!
//! ## Optional Dependencies (with platform defaults)
//!
//! - `HttpClient` - HTTP operations (desktop default: reqwest)
//!
//! When the `desktop-shims` feature is enabled and no `HttpClient` is
//! injected, a `ReqwestHttpClient` is created automatically.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{CoreConfig, RankingConfig};
//!
//! let config = CoreConfig::builder()
//!     .session_path("/home/me/rankings.json")
//!     .ranking_config(RankingConfig::default().with_k_factor(24.0))
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! Invalid values are reported as [`Error::Config`] with a message naming the
//! offending field:
//!
//! ```
//! use core_runtime::config::{CoreConfig, RankingConfig};
//!
//! let result = CoreConfig::builder()
//!     .ranking_config(RankingConfig::default().with_history_capacity(0))
//!     .build();
//! assert!(result.is_err());
//! ```

use crate::error::{Error, Result};
use bridge_traits::HttpClient;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Release types skipped by catalog imports unless the user says otherwise.
pub const DEFAULT_REJECT_TYPES: &[&str] = &[
    "Live",
    "Compilation",
    "Remix",
    "Soundtrack",
    "Spokenword",
    "Interview",
    "Audio drama",
    "Demo",
    "Audiobook",
    "Bootleg",
];

/// Tunable constants of the matchmaking engine and the rating updater.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingConfig {
    /// Number of recent canonical pairs remembered to avoid repeats
    pub history_capacity: usize,
    /// The challenger pool is `len / pool_divisor` of the candidates
    pub pool_divisor: usize,
    /// Lower bound on the challenger pool size
    pub min_pool_size: usize,
    /// Numerator of the opponent weight `n / (|diff| + offset)`
    pub weight_numerator: f64,
    /// Offset of the opponent weight `n / (|diff| + offset)`
    pub weight_offset: f64,
    /// ELO K-factor
    pub k_factor: f64,
    /// Score given to newly created songs
    pub initial_rating: f64,
    /// ELO logistic scale
    pub rating_scale: f64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            history_capacity: 20,
            pool_divisor: 4,
            min_pool_size: 2,
            weight_numerator: 1000.0,
            weight_offset: 50.0,
            k_factor: 32.0,
            initial_rating: 1200.0,
            rating_scale: 400.0,
        }
    }
}

impl RankingConfig {
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    pub fn with_pool_divisor(mut self, divisor: usize) -> Self {
        self.pool_divisor = divisor;
        self
    }

    pub fn with_min_pool_size(mut self, size: usize) -> Self {
        self.min_pool_size = size;
        self
    }

    pub fn with_weights(mut self, numerator: f64, offset: f64) -> Self {
        self.weight_numerator = numerator;
        self.weight_offset = offset;
        self
    }

    pub fn with_k_factor(mut self, k: f64) -> Self {
        self.k_factor = k;
        self
    }

    pub fn with_initial_rating(mut self, rating: f64) -> Self {
        self.initial_rating = rating;
        self
    }

    pub fn with_rating_scale(mut self, scale: f64) -> Self {
        self.rating_scale = scale;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.history_capacity == 0 {
            return Err(Error::Config(
                "Matchup history capacity must be greater than 0".to_string(),
            ));
        }

        if self.pool_divisor == 0 {
            return Err(Error::Config(
                "Challenger pool divisor must be greater than 0".to_string(),
            ));
        }

        if self.min_pool_size < 2 {
            return Err(Error::Config(
                "Minimum challenger pool size must be at least 2".to_string(),
            ));
        }

        if !(self.weight_numerator.is_finite() && self.weight_numerator > 0.0) {
            return Err(Error::Config(
                "Opponent weight numerator must be a positive number".to_string(),
            ));
        }

        if !(self.weight_offset.is_finite() && self.weight_offset > 0.0) {
            return Err(Error::Config(
                "Opponent weight offset must be a positive number".to_string(),
            ));
        }

        if !(self.k_factor.is_finite() && self.k_factor >= 0.0) {
            return Err(Error::Config("K-factor cannot be negative".to_string()));
        }

        if !self.initial_rating.is_finite() {
            return Err(Error::Config("Initial rating must be finite".to_string()));
        }

        if !(self.rating_scale.is_finite() && self.rating_scale > 0.0) {
            return Err(Error::Config(
                "Rating scale must be a positive number".to_string(),
            ));
        }

        Ok(())
    }
}

/// Configuration for the remote catalog (MusicBrainz), audio preview (iTunes)
/// and video (YouTube) services.
///
/// # Example
///
/// ```
/// use core_runtime::config::MetadataApiConfig;
///
/// let config = MetadataApiConfig::default()
///     .with_musicbrainz_user_agent("SongClash/0.1 (me@example.com)")
///     .with_rate_limit_delay_ms(2000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataApiConfig {
    /// Base URL of the MusicBrainz web service
    pub musicbrainz_base_url: String,

    /// MusicBrainz user agent string (format: "AppName/Version (Contact)")
    ///
    /// MusicBrainz rejects anonymous clients.
    /// See: https://musicbrainz.org/doc/MusicBrainz_API/Rate_Limiting
    pub musicbrainz_user_agent: String,

    /// Base URL of the iTunes search API
    pub itunes_base_url: String,

    /// Base URL of the YouTube site; searches hit `{base}/results` and links
    /// point at `{base}/watch`
    pub youtube_base_url: String,

    /// Delay in milliseconds between consecutive MusicBrainz requests
    pub rate_limit_delay_ms: u64,

    /// Releases requested per browse page
    pub release_page_size: u32,

    /// Attempts per MusicBrainz request before giving up
    pub max_retries: u32,

    /// First backoff delay in milliseconds, doubled on every retry
    pub retry_base_delay_ms: u64,

    /// Number of iTunes results inspected per preview lookup
    pub itunes_result_limit: u32,

    /// Per-request timeout for catalog calls, in seconds
    pub catalog_timeout_secs: u64,

    /// Per-request timeout for preview lookups, in seconds
    pub preview_timeout_secs: u64,

    /// Per-request timeout for video searches, in seconds
    pub video_timeout_secs: u64,
}

impl Default for MetadataApiConfig {
    fn default() -> Self {
        Self {
            musicbrainz_base_url: "https://musicbrainz.org/ws/2".to_string(),
            musicbrainz_user_agent: concat!(
                "SongClash/",
                env!("CARGO_PKG_VERSION"),
                " ( https://github.com/songclash/songclash )"
            )
            .to_string(),
            itunes_base_url: "https://itunes.apple.com".to_string(),
            youtube_base_url: "https://www.youtube.com".to_string(),
            rate_limit_delay_ms: 1500,
            release_page_size: 30,
            max_retries: 8,
            retry_base_delay_ms: 2000,
            itunes_result_limit: 5,
            catalog_timeout_secs: 30,
            preview_timeout_secs: 15,
            video_timeout_secs: 20,
        }
    }
}

impl MetadataApiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the MusicBrainz user agent
    pub fn with_musicbrainz_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.musicbrainz_user_agent = user_agent.into();
        self
    }

    /// Points the MusicBrainz client at another host (mirrors, tests)
    pub fn with_musicbrainz_base_url(mut self, url: impl Into<String>) -> Self {
        self.musicbrainz_base_url = url.into();
        self
    }

    /// Points the preview resolver at another host
    pub fn with_itunes_base_url(mut self, url: impl Into<String>) -> Self {
        self.itunes_base_url = url.into();
        self
    }

    /// Points the video search at another host
    pub fn with_youtube_base_url(mut self, url: impl Into<String>) -> Self {
        self.youtube_base_url = url.into();
        self
    }

    /// Sets the rate limit delay in milliseconds
    pub fn with_rate_limit_delay_ms(mut self, delay_ms: u64) -> Self {
        self.rate_limit_delay_ms = delay_ms;
        self
    }

    pub fn with_retries(mut self, max_retries: u32, base_delay_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.retry_base_delay_ms = base_delay_ms;
        self
    }

    pub fn with_release_page_size(mut self, size: u32) -> Self {
        self.release_page_size = size;
        self
    }

    pub fn with_itunes_result_limit(mut self, limit: u32) -> Self {
        self.itunes_result_limit = limit;
        self
    }

    pub fn rate_limit_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit_delay_ms)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn catalog_timeout(&self) -> Duration {
        Duration::from_secs(self.catalog_timeout_secs)
    }

    pub fn preview_timeout(&self) -> Duration {
        Duration::from_secs(self.preview_timeout_secs)
    }

    pub fn video_timeout(&self) -> Duration {
        Duration::from_secs(self.video_timeout_secs)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        let ua = &self.musicbrainz_user_agent;
        if ua.trim().is_empty() {
            return Err(Error::Config(
                "MusicBrainz user agent cannot be empty".to_string(),
            ));
        }
        if !ua.contains('/') || !ua.contains('(') || !ua.contains(')') {
            return Err(Error::Config(
                "MusicBrainz user agent must follow format: 'AppName/Version (Contact)'"
                    .to_string(),
            ));
        }

        for (name, url) in [
            ("MusicBrainz", &self.musicbrainz_base_url),
            ("iTunes", &self.itunes_base_url),
            ("YouTube", &self.youtube_base_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::Config(format!(
                    "{} base URL must be an http(s) URL, got '{}'",
                    name, url
                )));
            }
        }

        if self.rate_limit_delay_ms > 60_000 {
            return Err(Error::Config(
                "Rate limit delay exceeds maximum of 60 seconds (60,000ms)".to_string(),
            ));
        }

        if self.release_page_size == 0 || self.release_page_size > 100 {
            return Err(Error::Config(
                "Release page size must be between 1 and 100".to_string(),
            ));
        }

        if self.max_retries == 0 {
            return Err(Error::Config(
                "At least one request attempt is required".to_string(),
            ));
        }

        if self.itunes_result_limit == 0 {
            return Err(Error::Config(
                "iTunes result limit must be greater than 0".to_string(),
            ));
        }

        if self.catalog_timeout_secs == 0
            || self.preview_timeout_secs == 0
            || self.video_timeout_secs == 0
        {
            return Err(Error::Config(
                "Request timeouts must be greater than 0 seconds".to_string(),
            ));
        }

        Ok(())
    }
}

/// Core configuration for SongClash.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Session file opened at startup, if any
    pub session_path: Option<PathBuf>,

    /// Matchmaking and rating constants
    pub ranking: RankingConfig,

    /// Remote catalog and preview service settings
    pub metadata_api_config: MetadataApiConfig,

    /// Release types rejected by catalog imports by default
    pub reject_types: Vec<String>,

    /// HTTP client for the metadata providers (optional with desktop default)
    pub http_client: Option<Arc<dyn HttpClient>>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("session_path", &self.session_path)
            .field("ranking", &self.ranking)
            .field("metadata_api_config", &self.metadata_api_config)
            .field("reject_types", &self.reject_types)
            .field(
                "http_client",
                &self.http_client.as_ref().map(|_| "HttpClient { ... }"),
            )
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates every section of the configuration.
    pub fn validate(&self) -> Result<()> {
        self.ranking.validate()?;
        self.metadata_api_config.validate()?;

        if let Some(path) = &self.session_path {
            if path.as_os_str().is_empty() {
                return Err(Error::Config("Session path cannot be empty".to_string()));
            }
        }

        if self.reject_types.iter().any(|t| t.trim().is_empty()) {
            return Err(Error::Config(
                "Reject list cannot contain empty release types".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(api: &MetadataApiConfig) -> Result<Option<Arc<dyn HttpClient>>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::with_timeout(api.catalog_timeout()).map_err(|e| {
        Error::Internal(format!("Failed to initialize default HttpClient: {}", e))
    })?;
    let client: Arc<dyn HttpClient> = Arc::new(client);
    Ok(Some(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(_api: &MetadataApiConfig) -> Result<Option<Arc<dyn HttpClient>>> {
    Ok(None)
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    session_path: Option<PathBuf>,
    ranking: Option<RankingConfig>,
    metadata_api_config: Option<MetadataApiConfig>,
    reject_types: Option<Vec<String>>,
    http_client: Option<Arc<dyn HttpClient>>,
}

impl CoreConfigBuilder {
    /// Sets the session file opened at startup.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_runtime::config::CoreConfig;
    ///
    /// let builder = CoreConfig::builder()
    ///     .session_path("/path/to/rankings.json");
    /// ```
    pub fn session_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.session_path = Some(path.into());
        self
    }

    pub fn ranking_config(mut self, config: RankingConfig) -> Self {
        self.ranking = Some(config);
        self
    }

    pub fn metadata_api_config(mut self, config: MetadataApiConfig) -> Self {
        self.metadata_api_config = Some(config);
        self
    }

    /// Replaces the default reject list.
    pub fn reject_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reject_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the HTTP client implementation.
    ///
    /// If not provided, the desktop default (reqwest-based) will be used when
    /// the `desktop-shims` feature is enabled.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when any section fails validation, or
    /// [`Error::Internal`] when the default HTTP client cannot be created.
    pub fn build(self) -> Result<CoreConfig> {
        let metadata_api_config = self.metadata_api_config.unwrap_or_default();

        let mut config = CoreConfig {
            session_path: self.session_path,
            ranking: self.ranking.unwrap_or_default(),
            metadata_api_config,
            reject_types: self.reject_types.unwrap_or_else(|| {
                DEFAULT_REJECT_TYPES.iter().map(|s| s.to_string()).collect()
            }),
            http_client: None,
        };

        config.validate()?;

        config.http_client = match self.http_client {
            Some(client) => Some(client),
            None => provide_default_http_client(&config.metadata_api_config)?,
        };

        Ok(config)
    }
}

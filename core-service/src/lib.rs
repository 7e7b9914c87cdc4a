//! Core service façade.
//!
//! [`SongClashService`] is the one object a host (the CLI, a GUI) talks to.
//! It owns the ranking session behind an async lock, the event bus, and the
//! collaborators used by background jobs: a catalog fetcher for artist
//! imports, a preview resolver for audio previews and a video resolver.
//!
//! With the `desktop-shims` feature, [`ServiceDependencies::from_config`]
//! builds the MusicBrainz, iTunes and YouTube clients on top of the reqwest-backed
//! HTTP client from `bridge-desktop`. Tests and other hosts inject their own
//! implementations through [`SongClashService::with_parts`].

pub mod error;
pub mod jobs;

pub use error::{CoreError, Result};
pub use jobs::JobHandle;

use core_library::{AlbumFilter, AlbumSummary, LeaderboardRow, NewSong, PreviewState, SongRecord};
use core_metadata::{
    CatalogFetcher, FetchProgress, ITunesClient, MetadataError, MusicBrainzClient,
    PreviewResolver, ProgressCallback, VideoResolver, YouTubeClient,
};
use core_ranking::{MergeOutcome, RankingError, RankingSession, RatingChange};
use core_runtime::events::{CatalogEvent, CoreEvent, EventBus, PreviewEvent, Receiver, SessionEvent};
use core_runtime::CoreConfig;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Collaborators used by background jobs.
///
/// Any of them may be absent, in which case the matching operation fails with
/// [`CoreError::CapabilityMissing`].
#[derive(Clone, Default)]
pub struct ServiceDependencies {
    pub fetcher: Option<Arc<dyn CatalogFetcher>>,
    pub resolver: Option<Arc<dyn PreviewResolver>>,
    pub video: Option<Arc<dyn VideoResolver>>,
}

impl ServiceDependencies {
    pub fn new(
        fetcher: Option<Arc<dyn CatalogFetcher>>,
        resolver: Option<Arc<dyn PreviewResolver>>,
    ) -> Self {
        Self {
            fetcher,
            resolver,
            video: None,
        }
    }

    pub fn with_video_resolver(mut self, video: Arc<dyn VideoResolver>) -> Self {
        self.video = Some(video);
        self
    }

    /// MusicBrainz, iTunes and YouTube clients over the configured HTTP client.
    pub fn from_config(config: &CoreConfig) -> Self {
        let Some(http_client) = config.http_client.clone() else {
            debug!("No HTTP client configured; catalog import, previews and videos disabled");
            return Self::default();
        };

        let api = &config.metadata_api_config;
        let fetcher: Arc<dyn CatalogFetcher> = Arc::new(
            MusicBrainzClient::new(Arc::clone(&http_client), api.clone())
                .with_initial_rating(config.ranking.initial_rating),
        );
        let resolver: Arc<dyn PreviewResolver> =
            Arc::new(ITunesClient::new(Arc::clone(&http_client), api));
        let video: Arc<dyn VideoResolver> = Arc::new(YouTubeClient::new(http_client, api));
        Self::new(Some(fetcher), Some(resolver)).with_video_resolver(video)
    }
}

/// Outcome of [`SongClashService::preview`].
#[derive(Debug)]
pub enum PreviewLookup {
    /// Cached playable URL.
    Found(String),
    /// Cached miss.
    NotFound,
    /// Lookup running in the background; it records its result when done.
    Pending(JobHandle<PreviewState>),
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct SongClashService {
    session: Arc<Mutex<RankingSession>>,
    events: EventBus,
    deps: ServiceDependencies,
    reject_types: Arc<Vec<String>>,
    root_token: Arc<StdMutex<CancellationToken>>,
}

impl SongClashService {
    /// Empty session plus the collaborators described by `config`.
    pub fn new(config: CoreConfig) -> Self {
        let deps = ServiceDependencies::from_config(&config);
        let session = RankingSession::new(config.ranking.clone());
        Self::with_parts(session, deps, config.reject_types)
    }

    /// Like [`new`](Self::new), then loads `config.session_path` if the file
    /// exists.
    pub async fn open(config: CoreConfig) -> Result<Self> {
        config.validate()?;
        let path = config.session_path.clone();
        let service = Self::new(config);
        if let Some(path) = path.filter(|p| p.exists()) {
            service.load(&path).await?;
        }
        Ok(service)
    }

    pub fn with_parts(
        session: RankingSession,
        deps: ServiceDependencies,
        reject_types: Vec<String>,
    ) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            events: EventBus::default(),
            deps,
            reject_types: Arc::new(reject_types),
            root_token: Arc::new(StdMutex::new(CancellationToken::new())),
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.events.subscribe()
    }

    /// Release types rejected by imports unless the caller overrides them.
    pub fn default_reject_types(&self) -> &[String] {
        &self.reject_types
    }

    fn emit(&self, event: CoreEvent) {
        emit(&self.events, event);
    }

    fn child_token(&self) -> CancellationToken {
        self.root_token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .child_token()
    }

    // ------------------------------------------------------------------
    // Session lifecycle
    // ------------------------------------------------------------------

    pub async fn new_session(&self) {
        self.session.lock().await.new_session();
        info!("Started a new session");
        self.emit(CoreEvent::Session(SessionEvent::FilterChanged {
            label: AlbumFilter::All.label().to_string(),
        }));
    }

    pub async fn load(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let songs = self.session.lock().await.load(path)?;
        self.emit(CoreEvent::Session(SessionEvent::Loaded {
            path: path.display().to_string(),
            songs,
        }));
        Ok(songs)
    }

    /// Save to `path`, or to the path the session was loaded from.
    pub async fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let (target, songs) = {
            let mut session = self.session.lock().await;
            let target = session.save(path)?;
            (target, session.len())
        };
        self.emit(CoreEvent::Session(SessionEvent::Saved {
            path: target.display().to_string(),
            songs,
        }));
        Ok(target)
    }

    /// Add the songs of another session file that are not present yet.
    pub async fn merge_file(&self, path: impl AsRef<Path>) -> Result<usize> {
        let added = self.session.lock().await.merge_file(path.as_ref())?;
        if added > 0 {
            self.emit(CoreEvent::Session(SessionEvent::SongsAdded { count: added }));
        }
        Ok(added)
    }

    pub async fn has_unsaved_changes(&self) -> bool {
        self.session.lock().await.has_unsaved_changes()
    }

    pub async fn path(&self) -> Option<PathBuf> {
        self.session.lock().await.path().map(Path::to_path_buf)
    }

    pub async fn len(&self) -> usize {
        self.session.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.session.lock().await.is_empty()
    }

    pub async fn song(&self, title: &str) -> Option<SongRecord> {
        self.session.lock().await.get(title).cloned()
    }

    // ------------------------------------------------------------------
    // Filter
    // ------------------------------------------------------------------

    pub async fn set_filter(&self, filter: AlbumFilter) {
        let label = filter.label().to_string();
        self.session.lock().await.set_filter(filter);
        self.emit(CoreEvent::Session(SessionEvent::FilterChanged { label }));
    }

    pub async fn filter(&self) -> AlbumFilter {
        self.session.lock().await.filter().clone()
    }

    pub async fn albums(&self) -> Vec<String> {
        self.session.lock().await.albums()
    }

    // ------------------------------------------------------------------
    // Ranking
    // ------------------------------------------------------------------

    /// Next pair to compare, or `None` when fewer than two songs are visible.
    pub async fn next_matchup(&self) -> Option<(String, String)> {
        self.session.lock().await.get_matchup()
    }

    pub async fn vote(&self, winner: &str, loser: &str) -> Result<RatingChange> {
        let change = self.session.lock().await.update_score(winner, loser)?;
        self.emit(CoreEvent::Session(SessionEvent::Rated {
            winner: winner.to_string(),
            loser: loser.to_string(),
        }));
        Ok(change)
    }

    /// Pass on the current pair without scoring it.
    pub async fn skip(&self) -> Option<(String, String)> {
        debug!("Matchup skipped");
        self.next_matchup().await
    }

    // ------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------

    pub async fn add_song(&self, song: NewSong) -> Result<String> {
        let title = self.session.lock().await.add_song(song)?;
        self.emit(CoreEvent::Session(SessionEvent::SongsAdded { count: 1 }));
        Ok(title)
    }

    pub async fn delete_songs<S: AsRef<str>>(&self, titles: &[S]) -> usize {
        let removed = self.session.lock().await.delete_songs(titles);
        if removed > 0 {
            self.emit(CoreEvent::Session(SessionEvent::SongsRemoved { count: removed }));
        }
        removed
    }

    /// Delete every song of `album`; the filter goes back to all albums.
    pub async fn delete_album(&self, album: &str) -> Result<usize> {
        let removed = self.session.lock().await.delete_album(album)?;
        self.emit(CoreEvent::Session(SessionEvent::SongsRemoved { count: removed }));
        self.emit(CoreEvent::Session(SessionEvent::FilterChanged {
            label: AlbumFilter::All.label().to_string(),
        }));
        Ok(removed)
    }

    pub async fn merge_songs<S: AsRef<str>>(
        &self,
        titles: &[S],
        new_title: &str,
    ) -> Result<MergeOutcome> {
        let outcome = self.session.lock().await.merge_songs(titles, new_title)?;
        self.emit(CoreEvent::Session(SessionEvent::SongsMerged {
            into: outcome.title.clone(),
            count: outcome.merged,
        }));
        Ok(outcome)
    }

    // ------------------------------------------------------------------
    // Reports
    // ------------------------------------------------------------------

    pub async fn leaderboard(&self) -> Vec<LeaderboardRow> {
        self.session.lock().await.leaderboard()
    }

    pub async fn album_leaderboard(&self) -> Vec<AlbumSummary> {
        self.session.lock().await.album_leaderboard()
    }

    /// Write the filtered leaderboard to `path`; returns the row count.
    pub async fn export_csv(&self, path: impl AsRef<Path>) -> Result<usize> {
        Ok(self.session.lock().await.export_csv(path.as_ref())?)
    }

    // ------------------------------------------------------------------
    // Background jobs
    // ------------------------------------------------------------------

    /// Import the studio catalog of `artist` in the background.
    ///
    /// `reject_types` overrides the configured reject list. The job merges
    /// its songs into the session when it finishes unless it was cancelled
    /// first; its result is the number of songs that were new. A failed
    /// fetch is reported through [`CatalogEvent::FetchFailed`] and adds
    /// nothing.
    #[instrument(skip(self, reject_types))]
    pub fn fetch_artist(
        &self,
        artist: &str,
        reject_types: Option<Vec<String>>,
    ) -> Result<JobHandle<usize>> {
        let fetcher = self.deps.fetcher.clone().ok_or_else(|| CoreError::CapabilityMissing {
            capability: "catalog_fetcher".to_string(),
            message: "No catalog fetcher configured".to_string(),
        })?;
        let reject_types = reject_types.unwrap_or_else(|| self.reject_types.as_ref().clone());
        let artist = artist.trim().to_string();
        if artist.is_empty() {
            return Err(CoreError::Ranking(RankingError::InvalidInput {
                field: "artist".to_string(),
                message: "Artist name cannot be empty".to_string(),
            }));
        }

        let cancel = self.child_token();
        let session = Arc::clone(&self.session);
        let events = self.events.clone();
        let label = format!("import {artist}");

        Ok(JobHandle::spawn(label, cancel.clone(), move |id| async move {
            let job_id = id.to_string();
            emit(
                &events,
                CoreEvent::Catalog(CatalogEvent::FetchStarted {
                    job_id: job_id.clone(),
                    artist: artist.clone(),
                }),
            );

            let progress: ProgressCallback = {
                let events = events.clone();
                let job_id = job_id.clone();
                Arc::new(move |update: FetchProgress| {
                    emit(
                        &events,
                        CoreEvent::Catalog(CatalogEvent::FetchProgress {
                            job_id: job_id.clone(),
                            message: update.message,
                            percent: update.percent,
                        }),
                    );
                })
            };

            let result = fetcher
                .fetch(&artist, &reject_types, &cancel, Some(progress))
                .await;

            let batch = match result {
                Ok(batch) => batch,
                Err(MetadataError::Cancelled) => {
                    return Err(cancelled_fetch(&events, job_id, artist));
                }
                Err(e) => {
                    warn!(%job_id, %artist, error = %e, "Catalog import failed");
                    emit(
                        &events,
                        CoreEvent::Catalog(CatalogEvent::FetchFailed {
                            job_id,
                            artist,
                            message: e.to_string(),
                        }),
                    );
                    return Ok(0);
                }
            };

            let added = {
                let mut session = session.lock().await;
                if cancel.is_cancelled() {
                    drop(session);
                    return Err(cancelled_fetch(&events, job_id, artist));
                }
                session.merge(batch)
            };

            info!(%job_id, %artist, added, "Catalog import finished");
            if added > 0 {
                emit(&events, CoreEvent::Session(SessionEvent::SongsAdded { count: added }));
            }
            emit(
                &events,
                CoreEvent::Catalog(CatalogEvent::FetchCompleted {
                    job_id,
                    artist,
                    added,
                }),
            );
            Ok(added)
        }))
    }

    /// Preview URL for `title`.
    ///
    /// Cached results come back immediately. Otherwise a lookup job is
    /// started; it records its result on the song only if the song still
    /// exists and the job was not cancelled.
    pub async fn preview(&self, title: &str) -> Result<PreviewLookup> {
        let descriptor = {
            let session = self.session.lock().await;
            let record = session
                .get(title)
                .ok_or_else(|| RankingError::SongNotFound(title.to_string()))?;
            match &record.preview_url {
                PreviewState::Found(url) => return Ok(PreviewLookup::Found(url.clone())),
                PreviewState::NotFound => return Ok(PreviewLookup::NotFound),
                PreviewState::Unknown => record.descriptor(title),
            }
        };

        let resolver = self.deps.resolver.clone().ok_or_else(|| CoreError::CapabilityMissing {
            capability: "preview_resolver".to_string(),
            message: "No preview resolver configured".to_string(),
        })?;

        let cancel = self.child_token();
        let session = Arc::clone(&self.session);
        let events = self.events.clone();
        let title = title.to_string();
        let label = format!("preview {title}");

        let job = JobHandle::spawn(label, cancel.clone(), move |id| async move {
            let url = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                url = resolver.resolve(&descriptor) => url,
            };

            let state = PreviewState::from_lookup(url);
            let recorded = {
                let mut session = session.lock().await;
                !cancel.is_cancelled() && session.set_preview(&title, state.clone())
            };

            if !recorded {
                debug!(job_id = %id, %title, "Preview result discarded");
                emit(
                    &events,
                    CoreEvent::Preview(PreviewEvent::Discarded {
                        title: title.clone(),
                    }),
                );
                if cancel.is_cancelled() {
                    return Err(CoreError::JobCancelled(format!("preview {title}")));
                }
                return Ok(state);
            }

            let event = match &state {
                PreviewState::Found(url) => PreviewEvent::Resolved {
                    title,
                    url: url.clone(),
                },
                _ => PreviewEvent::NotFound { title },
            };
            emit(&events, CoreEvent::Preview(event));
            Ok(state)
        });

        Ok(PreviewLookup::Pending(job))
    }

    /// Search for a video of `title` in the background.
    ///
    /// Video links are not stored in the session; every call searches again.
    /// The job yields `None` when nothing was found.
    #[instrument(skip(self))]
    pub async fn video(&self, title: &str) -> Result<JobHandle<Option<String>>> {
        let descriptor = {
            let session = self.session.lock().await;
            session
                .get(title)
                .map(|record| record.descriptor(title))
                .ok_or_else(|| RankingError::SongNotFound(title.to_string()))?
        };

        let videos = self.deps.video.clone().ok_or_else(|| CoreError::CapabilityMissing {
            capability: "video_resolver".to_string(),
            message: "No video resolver configured".to_string(),
        })?;

        let cancel = self.child_token();
        let events = self.events.clone();
        let title = title.to_string();
        let label = format!("video {title}");

        Ok(JobHandle::spawn(label, cancel.clone(), move |id| async move {
            let url = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(job_id = %id, %title, "Video search cancelled");
                    return Err(CoreError::JobCancelled(format!("video {title}")));
                }
                url = videos.find_video(&descriptor) => url,
            };

            if cancel.is_cancelled() {
                return Err(CoreError::JobCancelled(format!("video {title}")));
            }

            let event = match &url {
                Some(url) => PreviewEvent::VideoFound {
                    title,
                    url: url.clone(),
                },
                None => PreviewEvent::VideoNotFound { title },
            };
            emit(&events, CoreEvent::Preview(event));
            Ok(url)
        }))
    }

    /// Cancel every job in flight. Jobs started afterwards are unaffected.
    pub fn cancel_all(&self) {
        let mut root = self
            .root_token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        root.cancel();
        *root = CancellationToken::new();
        info!("Cancelled all background jobs");
    }
}

impl std::fmt::Debug for SongClashService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SongClashService")
            .field("events", &self.events)
            .field("fetcher", &self.deps.fetcher.is_some())
            .field("resolver", &self.deps.resolver.is_some())
            .field("video", &self.deps.video.is_some())
            .field("reject_types", &self.reject_types)
            .finish()
    }
}

/// Publish `event`; having no subscribers is not an error.
fn emit(events: &EventBus, event: CoreEvent) {
    if events.emit(event).is_err() {
        debug!("Event dropped, no subscribers");
    }
}

fn cancelled_fetch(events: &EventBus, job_id: String, artist: String) -> CoreError {
    info!(%job_id, %artist, "Catalog import cancelled");
    emit(
        events,
        CoreEvent::Catalog(CatalogEvent::FetchCancelled {
            job_id,
            artist: artist.clone(),
        }),
    );
    CoreError::JobCancelled(format!("import {artist}"))
}

//! # Ranking Session
//!
//! A [`RankingSession`] is one open catalog: the song store, the file it
//! came from, whether it has unsaved changes, the album filter and the
//! recent match history. The filter and history are never persisted.
//!
//! The session is synchronous and not shareable on its own. Async callers
//! keep it behind a lock.

use crate::elo::{self, RatingChange};
use crate::error::{RankingError, Result};
use crate::history::MatchHistory;
use crate::leaderboard::{self, MergeOutcome};
use crate::matchmaking;
use core_library::{
    export, filter, persistence, AlbumFilter, AlbumSummary, LeaderboardRow, LibraryError, NewSong,
    PreviewState, SongDescriptor, SongRecord, SongStore,
};
use core_runtime::RankingConfig;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

pub struct RankingSession {
    store: SongStore,
    path: Option<PathBuf>,
    dirty: bool,
    filter: AlbumFilter,
    history: MatchHistory,
    config: RankingConfig,
    rng: StdRng,
}

impl RankingSession {
    /// Empty session seeded from OS entropy.
    pub fn new(config: RankingConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Empty session with a fixed seed, for reproducible matchups.
    pub fn with_seed(config: RankingConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(config: RankingConfig, rng: StdRng) -> Self {
        Self {
            store: SongStore::new(),
            path: None,
            dirty: false,
            filter: AlbumFilter::All,
            history: MatchHistory::new(config.history_capacity),
            config,
            rng,
        }
    }

    pub fn store(&self) -> &SongStore {
        &self.store
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    pub fn history(&self) -> &MatchHistory {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn get(&self, title: &str) -> Option<&SongRecord> {
        self.store.get(title)
    }

    /// Drop everything and start over.
    pub fn new_session(&mut self) {
        self.store = SongStore::new();
        self.path = None;
        self.dirty = false;
        self.filter = AlbumFilter::All;
        self.history.clear();
    }

    /// Replace the catalog with the contents of `path`.
    ///
    /// On failure the session is left exactly as it was.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load(&mut self, path: &Path) -> Result<usize> {
        let store = persistence::load_store(path)?;
        self.store = store;
        self.path = Some(path.to_path_buf());
        self.dirty = false;
        self.history.clear();
        info!(songs = self.store.len(), "Loaded session");
        Ok(self.store.len())
    }

    /// Write the catalog to `path`, or to the remembered path.
    ///
    /// Returns the path written. A failed save keeps the unsaved flag set.
    #[instrument(skip(self))]
    pub fn save(&mut self, path: Option<&Path>) -> Result<PathBuf> {
        let target = path
            .map(Path::to_path_buf)
            .or_else(|| self.path.clone())
            .ok_or(LibraryError::NoPath)?;

        persistence::save_store(&target, &self.store)?;
        self.path = Some(target.clone());
        self.dirty = false;
        info!(path = %target.display(), songs = self.store.len(), "Saved session");
        Ok(target)
    }

    /// Add songs whose titles are not present yet; existing songs win.
    pub fn merge<I>(&mut self, incoming: I) -> usize
    where
        I: IntoIterator<Item = (String, SongRecord)>,
    {
        let added = self.store.merge(incoming);
        if added > 0 {
            self.dirty = true;
        }
        debug!(added, "Merged incoming songs");
        added
    }

    /// Merge the songs of another session file.
    pub fn merge_file(&mut self, path: &Path) -> Result<usize> {
        let incoming = persistence::load_store(path)?;
        Ok(self.merge(incoming))
    }

    pub fn filter(&self) -> &AlbumFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, album_filter: AlbumFilter) {
        debug!(filter = %album_filter, "Filter changed");
        self.filter = album_filter;
    }

    pub fn albums(&self) -> Vec<String> {
        filter::list_albums(&self.store)
    }

    pub fn active_keys(&self) -> Vec<String> {
        filter::active_keys(&self.store, &self.filter)
    }

    /// Next pair to compare, or `None` when the filter leaves fewer than two
    /// songs.
    pub fn get_matchup(&mut self) -> Option<(String, String)> {
        let candidates = self.active_keys();
        matchmaking::select_matchup(
            &self.store,
            &candidates,
            &mut self.history,
            &self.config,
            &mut self.rng,
        )
    }

    /// Record that `winner` beat `loser`.
    pub fn update_score(&mut self, winner: &str, loser: &str) -> Result<RatingChange> {
        let change = elo::update_score(&mut self.store, winner, loser, &self.config)?;
        self.dirty = true;
        Ok(change)
    }

    /// Add a hand-entered song at the initial rating.
    pub fn add_song(&mut self, song: NewSong) -> Result<String> {
        let title = self.store.insert_song(song, self.config.initial_rating)?;
        self.dirty = true;
        info!(%title, "Added song");
        Ok(title)
    }

    pub fn delete_songs<S: AsRef<str>>(&mut self, titles: &[S]) -> usize {
        let removed = leaderboard::delete_songs(&mut self.store, titles);
        if removed > 0 {
            self.dirty = true;
        }
        removed
    }

    /// Delete every song of `album` and reset the filter to all albums.
    pub fn delete_album(&mut self, album: &str) -> Result<usize> {
        let removed = self.store.remove_album(album);
        if removed == 0 {
            return Err(RankingError::invalid_input(
                "album",
                format!("No songs found for album '{album}'"),
            ));
        }
        self.dirty = true;
        self.filter = AlbumFilter::All;
        info!(album, removed, "Deleted album");
        Ok(removed)
    }

    pub fn merge_songs<S: AsRef<str>>(&mut self, titles: &[S], new_title: &str) -> Result<MergeOutcome> {
        let outcome = leaderboard::merge_songs(&mut self.store, titles, new_title)?;
        self.dirty = true;
        Ok(outcome)
    }

    /// Songs visible through the current filter, best first.
    pub fn leaderboard(&self) -> Vec<LeaderboardRow> {
        leaderboard::song_leaderboard(&self.store, &self.filter)
    }

    pub fn album_leaderboard(&self) -> Vec<AlbumSummary> {
        leaderboard::album_leaderboard(&self.store)
    }

    /// Export the current leaderboard as CSV.
    pub fn export_csv(&self, path: &Path) -> Result<usize> {
        Ok(export::export_csv(path, &self.leaderboard())?)
    }

    pub fn descriptor(&self, title: &str) -> Result<SongDescriptor> {
        self.store
            .get(title)
            .map(|record| record.descriptor(title))
            .ok_or_else(|| RankingError::SongNotFound(title.to_string()))
    }

    /// Cache a preview lookup result on `title`.
    ///
    /// Returns `false` and changes nothing when the song no longer exists.
    pub fn set_preview(&mut self, title: &str, state: PreviewState) -> bool {
        let Some(record) = self.store.get_mut(title) else {
            debug!(title, "Discarding preview for a removed song");
            return false;
        };
        if record.preview_url != state {
            record.preview_url = state;
            self.dirty = true;
        }
        true
    }
}

impl std::fmt::Debug for RankingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RankingSession")
            .field("songs", &self.store.len())
            .field("path", &self.path)
            .field("dirty", &self.dirty)
            .field("filter", &self.filter)
            .field("history", &self.history.len())
            .finish()
    }
}

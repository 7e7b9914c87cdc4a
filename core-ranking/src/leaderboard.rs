//! Leaderboards and bulk edits over the store.

use crate::error::{RankingError, Result};
use core_library::{filter, AlbumFilter, AlbumSummary, LeaderboardRow, PreviewState, SongRecord, SongStore};
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

/// Songs visible through `filter`, best first. Ties keep catalog order.
pub fn song_leaderboard(store: &SongStore, album_filter: &AlbumFilter) -> Vec<LeaderboardRow> {
    let mut entries: Vec<(String, &SongRecord)> = filter::active_keys(store, album_filter)
        .into_iter()
        .filter_map(|title| store.get(&title).map(|record| (title, record)))
        .collect();
    entries.sort_by(|(_, a), (_, b)| b.score.total_cmp(&a.score));

    entries
        .into_iter()
        .enumerate()
        .map(|(i, (title, record))| LeaderboardRow {
            rank: i + 1,
            title,
            artist: record.artist.clone(),
            album: record.album.clone(),
            year: record.year.clone(),
            score: record.score,
            matches: record.matches,
        })
        .collect()
}

/// Every album with its average rating, best first. Ignores the filter.
pub fn album_leaderboard(store: &SongStore) -> Vec<AlbumSummary> {
    struct Group {
        artist: String,
        total: f64,
        count: usize,
        cover_url: Option<String>,
    }

    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Group> = HashMap::new();

    for (_, record) in store.iter() {
        match groups.get_mut(&record.album) {
            Some(group) => {
                group.total += record.score;
                group.count += 1;
                if group.cover_url.is_none() {
                    group.cover_url = record.cover_url.clone();
                }
            }
            None => {
                order.push(record.album.clone());
                groups.insert(
                    record.album.clone(),
                    Group {
                        artist: record.artist.clone(),
                        total: record.score,
                        count: 1,
                        cover_url: record.cover_url.clone(),
                    },
                );
            }
        }
    }

    let mut summaries: Vec<AlbumSummary> = order
        .into_iter()
        .filter_map(|album| {
            let group = groups.remove(&album)?;
            Some(AlbumSummary {
                album,
                artist: group.artist,
                average_score: group.total / group.count as f64,
                song_count: group.count,
                cover_url: group.cover_url,
            })
        })
        .collect();
    summaries.sort_by(|a, b| b.average_score.total_cmp(&a.average_score));
    summaries
}

/// Remove the listed songs. Unknown titles are skipped.
pub fn delete_songs<S: AsRef<str>>(store: &mut SongStore, titles: &[S]) -> usize {
    let removed = store.remove_many(titles);
    if removed > 0 {
        info!(removed, "Deleted songs");
    }
    removed
}

/// Result of [`merge_songs`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeOutcome {
    pub title: String,
    pub score: f64,
    pub matches: u32,
    /// Distinct songs folded into the result
    pub merged: usize,
    /// Source records deleted, not counting one kept under the new title
    pub removed: usize,
}

/// Collapse several songs into one record named `new_title`.
///
/// The merged record averages the scores, sums the match counts and takes
/// its metadata from the first listed song. If `new_title` is one of the
/// sources it is replaced in place; otherwise the record is appended and
/// `new_title` must not already exist.
pub fn merge_songs<S: AsRef<str>>(
    store: &mut SongStore,
    titles: &[S],
    new_title: &str,
) -> Result<MergeOutcome> {
    let mut sources: Vec<&str> = Vec::with_capacity(titles.len());
    for title in titles {
        let title = title.as_ref();
        if !sources.contains(&title) {
            sources.push(title);
        }
    }
    if sources.len() < 2 {
        return Err(RankingError::invalid_input(
            "titles",
            "Select at least two songs to merge",
        ));
    }

    let new_title = new_title.trim();
    if new_title.is_empty() {
        return Err(RankingError::invalid_input("new_title", "Title cannot be empty"));
    }
    if store.contains(new_title) && !sources.contains(&new_title) {
        return Err(RankingError::invalid_input(
            "new_title",
            format!("'{new_title}' already exists"),
        ));
    }

    let mut records = Vec::with_capacity(sources.len());
    for title in &sources {
        let record = store
            .get(title)
            .ok_or_else(|| RankingError::SongNotFound(title.to_string()))?;
        records.push(record);
    }

    let matches = records
        .iter()
        .try_fold(0u32, |acc, r| acc.checked_add(r.matches))
        .ok_or_else(|| {
            RankingError::invalid_input("titles", "Combined match count is too large")
        })?;

    let first = records[0];
    let total: f64 = records.iter().map(|r| r.score).sum();
    let merged = SongRecord {
        score: total / records.len() as f64,
        matches,
        album: first.album.clone(),
        year: first.year.clone(),
        artist: first.artist.clone(),
        cover_url: first.cover_url.clone(),
        preview_url: PreviewState::Unknown,
    };
    let outcome_score = merged.score;
    let outcome_matches = merged.matches;

    match store.get_mut(new_title) {
        Some(existing) => *existing = merged,
        None => store.insert(new_title, merged)?,
    }

    let stale: Vec<&str> = sources
        .iter()
        .copied()
        .filter(|title| *title != new_title)
        .collect();
    let removed = store.remove_many(&stale);

    info!(into = new_title, merged = sources.len(), "Merged songs");

    Ok(MergeOutcome {
        title: new_title.to_string(),
        score: outcome_score,
        matches: outcome_matches,
        merged: sources.len(),
        removed,
    })
}

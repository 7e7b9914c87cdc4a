//! ELO rating updates.

use crate::error::{RankingError, Result};
use core_library::SongStore;
use core_runtime::RankingConfig;
use serde::Serialize;
use tracing::debug;

/// Probability that a player rated `rating_a` beats one rated `rating_b`.
pub fn expected_score(rating_a: f64, rating_b: f64, scale: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((rating_b - rating_a) / scale))
}

/// New ratings `(winner, loser)` after a decisive game.
pub fn rate(winner: f64, loser: f64, k_factor: f64, scale: f64) -> (f64, f64) {
    let expected_winner = expected_score(winner, loser, scale);
    let expected_loser = expected_score(loser, winner, scale);
    (
        winner + k_factor * (1.0 - expected_winner),
        loser + k_factor * (0.0 - expected_loser),
    )
}

/// Outcome of a single comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingChange {
    pub winner: String,
    pub loser: String,
    pub winner_before: f64,
    pub winner_after: f64,
    pub loser_before: f64,
    pub loser_after: f64,
}

/// Apply the result of `winner` beating `loser` to the store.
///
/// Both songs must exist and be distinct; otherwise nothing is touched.
pub fn update_score(
    store: &mut SongStore,
    winner: &str,
    loser: &str,
    config: &RankingConfig,
) -> Result<RatingChange> {
    if winner == loser {
        return Err(RankingError::InvalidMatchup(winner.to_string()));
    }
    let winner_before = store
        .get(winner)
        .map(|r| r.score)
        .ok_or_else(|| RankingError::SongNotFound(winner.to_string()))?;
    let loser_before = store
        .get(loser)
        .map(|r| r.score)
        .ok_or_else(|| RankingError::SongNotFound(loser.to_string()))?;

    let (winner_after, loser_after) = rate(
        winner_before,
        loser_before,
        config.k_factor,
        config.rating_scale,
    );

    if let Some(record) = store.get_mut(winner) {
        record.score = winner_after;
        record.matches = record.matches.saturating_add(1);
    }
    if let Some(record) = store.get_mut(loser) {
        record.score = loser_after;
        record.matches = record.matches.saturating_add(1);
    }

    debug!(
        winner,
        loser,
        winner_after,
        loser_after,
        "Applied rating update"
    );

    Ok(RatingChange {
        winner: winner.to_string(),
        loser: loser.to_string(),
        winner_before,
        winner_after,
        loser_before,
        loser_after,
    })
}

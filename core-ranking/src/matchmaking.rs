//! # Matchmaking
//!
//! Picks the next pair of songs to compare.
//!
//! The challenger comes from the least-played slice of the candidates so
//! every song gets compared early. The opponent is drawn with a weight that
//! falls off with the rating gap, which keeps most games close. Pairs seen in
//! the recent [`MatchHistory`] are skipped; when that leaves nobody, every
//! other candidate becomes eligible again with equal weight.

use crate::history::MatchHistory;
use core_library::SongStore;
use core_runtime::RankingConfig;
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use tracing::trace;

/// Number of least-played candidates the challenger is drawn from.
pub fn pool_size(candidates: usize, config: &RankingConfig) -> usize {
    let divisor = config.pool_divisor.max(1);
    (candidates / divisor).max(config.min_pool_size).min(candidates)
}

/// Selection weight of an opponent `gap` rating points away.
pub fn opponent_weight(gap: f64, config: &RankingConfig) -> f64 {
    config.weight_numerator / (gap.abs() + config.weight_offset)
}

/// Choose two distinct titles from `candidates` and record the pair.
///
/// Returns `None` when fewer than two candidates exist. The returned order is
/// random, so neither side is favoured by position.
pub fn select_matchup<R: Rng + ?Sized>(
    store: &SongStore,
    candidates: &[String],
    history: &mut MatchHistory,
    config: &RankingConfig,
    rng: &mut R,
) -> Option<(String, String)> {
    let mut candidates: Vec<&str> = candidates
        .iter()
        .map(String::as_str)
        .filter(|title| store.contains(title))
        .collect();
    if candidates.len() < 2 {
        return None;
    }

    let matches_of = |title: &str| store.get(title).map(|r| r.matches).unwrap_or(0);
    let score_of = |title: &str| store.get(title).map(|r| r.score).unwrap_or(0.0);

    candidates.shuffle(rng);
    candidates.sort_by_key(|title| matches_of(title));

    let pool = pool_size(candidates.len(), config);
    let song_a = *candidates[..pool].choose(rng)?;
    let score_a = score_of(song_a);

    let opponents: Vec<&str> = candidates
        .iter()
        .copied()
        .filter(|title| *title != song_a)
        .collect();

    let mut eligible: Vec<(&str, f64)> = opponents
        .iter()
        .copied()
        .filter(|title| !history.contains(song_a, title))
        .map(|title| (title, opponent_weight(score_a - score_of(title), config)))
        .collect();

    if eligible.is_empty() {
        trace!(song_a, "Recent history exhausted, falling back to all opponents");
        eligible = opponents.iter().map(|title| (*title, 1.0)).collect();
    }

    let song_b = match WeightedIndex::new(eligible.iter().map(|(_, weight)| *weight)) {
        Ok(dist) => eligible[dist.sample(rng)].0,
        Err(_) => eligible.choose(rng)?.0,
    };

    history.record(song_a, song_b);

    let mut pair = [song_a.to_string(), song_b.to_string()];
    pair.shuffle(rng);
    let [left, right] = pair;
    trace!(%left, %right, pool, "Selected matchup");
    Some((left, right))
}

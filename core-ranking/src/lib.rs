//! # Ranking Core
//!
//! Pairwise song ranking on top of the `core-library` catalog.
//!
//! - `matchmaking` picks the next pair from the filtered catalog
//! - `elo` applies a game result
//! - `leaderboard` builds the song and album boards and the bulk edits
//!   (delete, merge) offered from them
//! - `session` ties these together with load/save and the unsaved flag
//!
//! Randomness is always drawn from an injected RNG, so a seeded
//! [`RankingSession`] replays the same matchups.

pub mod elo;
pub mod error;
pub mod history;
pub mod leaderboard;
pub mod matchmaking;
pub mod session;

pub use elo::RatingChange;
pub use error::{RankingError, Result};
pub use history::{MatchHistory, MatchPair};
pub use leaderboard::MergeOutcome;
pub use session::RankingSession;

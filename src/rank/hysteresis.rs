//! Rank hysteresis
//!
//! A rank label only changes once a player has played a minimum number of
//! games since the previous change. While inside that freeze window the last
//! confirmed rank is shown with an asterisk.

use crate::error::LadderError;
use crate::rank::converter::rating_to_rank;
use crate::types::{PlayerRankState, RankLabel, RatingDelta, RatingPoints};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Games a freshly confirmed rank stays frozen for
pub const DEFAULT_FREEZE_PERIOD: u32 = 5;

/// Rank as shown on the ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayRank {
    pub rank: RankLabel,
    /// Recently changed and still inside the freeze window
    pub settling: bool,
}

impl fmt::Display for DisplayRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.settling {
            write!(f, "{}*", self.rank)
        } else {
            write!(f, "{}", self.rank)
        }
    }
}

/// Outcome of applying one game to a player's rank state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankUpdate {
    pub previous: PlayerRankState,
    pub state: PlayerRankState,
    pub rank_changed: bool,
    /// The delta would have taken the rating below zero
    pub clamped: bool,
}

/// Freeze-window gate over rank label changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankHysteresis {
    freeze_period: u32,
}

impl Default for RankHysteresis {
    fn default() -> Self {
        Self {
            freeze_period: DEFAULT_FREEZE_PERIOD,
        }
    }
}

impl RankHysteresis {
    pub fn new(freeze_period: u32) -> Result<Self, LadderError> {
        if freeze_period == 0 {
            return Err(LadderError::ConfigurationError {
                message: "Freeze period must be at least one game".to_string(),
            });
        }

        Ok(Self { freeze_period })
    }

    pub fn freeze_period(&self) -> u32 {
        self.freeze_period
    }

    /// Rank state for a newly registered player, already out of the freeze window
    pub fn initial_state(
        &self,
        rank: RankLabel,
        rating_points: RatingPoints,
    ) -> Result<PlayerRankState, LadderError> {
        Ok(PlayerRankState {
            rating_points,
            last_rank_reached: rank.validate()?,
            games_since_rank_change: self.freeze_period,
        })
    }

    pub fn is_frozen(&self, state: &PlayerRankState) -> bool {
        state.games_since_rank_change < self.freeze_period
    }

    /// Games left before the current rank can change again
    pub fn games_until_unfrozen(&self, state: &PlayerRankState) -> u32 {
        self.freeze_period
            .saturating_sub(state.games_since_rank_change)
    }

    pub fn display_rank(&self, state: &PlayerRankState) -> DisplayRank {
        if self.is_frozen(state) {
            DisplayRank {
                rank: state.last_rank_reached,
                settling: true,
            }
        } else {
            DisplayRank {
                rank: rating_to_rank(state.rating_points),
                settling: false,
            }
        }
    }

    /// Apply a game's rating delta and decide whether the rank change is confirmed
    ///
    /// The input snapshot is left untouched; the caller persists `update.state`.
    pub fn apply_game_result(&self, state: &PlayerRankState, delta: RatingDelta) -> RankUpdate {
        let raw_points = i64::from(state.rating_points) + i64::from(delta);
        let clamped = raw_points < 0;
        if clamped {
            debug!(
                "Rating delta {} clamped at zero from {} points",
                delta, state.rating_points
            );
        }
        let new_points = RatingPoints::try_from(raw_points.max(0)).unwrap_or(RatingPoints::MAX);

        let games_after_this = state.games_since_rank_change.saturating_add(1);
        let candidate = rating_to_rank(new_points);

        let (state_after, rank_changed) =
            if games_after_this >= self.freeze_period && candidate != state.last_rank_reached {
                (
                    PlayerRankState {
                        rating_points: new_points,
                        last_rank_reached: candidate,
                        games_since_rank_change: 0,
                    },
                    true,
                )
            } else {
                (
                    PlayerRankState {
                        rating_points: new_points,
                        last_rank_reached: state.last_rank_reached,
                        games_since_rank_change: games_after_this,
                    },
                    false,
                )
            };

        RankUpdate {
            previous: state.clone(),
            state: state_after,
            rank_changed,
            clamped,
        }
    }
}

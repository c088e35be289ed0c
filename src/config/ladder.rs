//! Ladder engine configuration

use crate::error::LadderError;
use crate::pairing::{KomiPolicy, PairingConfig};
use crate::rank::{RankHysteresis, DEFAULT_FREEZE_PERIOD};
use crate::types::RatingDelta;
use serde::{Deserialize, Serialize};

/// Rank, pairing and game-recording settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LadderSettings {
    /// Games a new rank stays frozen before it can change again
    pub freeze_period_games: u32,
    /// Rating points moved from loser to winner per game
    pub rating_change_per_game: RatingDelta,
    /// Komi behaviour past the end of the handicap table
    pub komi_policy: KomiPolicy,
    /// Maximum handicap stones
    pub max_handicap: u8,
    /// Attempts at saving a player before giving up on version conflicts
    pub max_save_retries: u32,
    /// Default number of games in a player's recent history
    pub recent_games_limit: usize,
    /// Maximum length of game notes in characters
    pub max_notes_length: usize,
}

impl Default for LadderSettings {
    fn default() -> Self {
        Self {
            freeze_period_games: DEFAULT_FREEZE_PERIOD,
            rating_change_per_game: 1,
            komi_policy: KomiPolicy::Unbounded,
            max_handicap: 9,
            max_save_retries: 3,
            recent_games_limit: 5,
            max_notes_length: 10_000,
        }
    }
}

impl LadderSettings {
    pub fn pairing_config(&self) -> PairingConfig {
        PairingConfig {
            komi_policy: self.komi_policy,
            max_handicap: self.max_handicap,
        }
    }

    pub fn hysteresis(&self) -> crate::error::Result<RankHysteresis> {
        Ok(RankHysteresis::new(self.freeze_period_games)?)
    }

    /// Check the settings a ladder service relies on
    pub fn validate(&self) -> Result<(), LadderError> {
        let invalid = |message: &str| {
            Err(LadderError::ConfigurationError {
                message: message.to_string(),
            })
        };

        if self.freeze_period_games == 0 {
            return invalid("Freeze period must be at least one game");
        }
        if self.rating_change_per_game < 0 {
            return invalid("Rating change per game cannot be negative");
        }
        if self.max_save_retries == 0 {
            return invalid("Max save retries must be greater than 0");
        }
        if self.max_notes_length == 0 {
            return invalid("Max notes length must be greater than 0");
        }

        self.pairing_config().validate()
    }
}

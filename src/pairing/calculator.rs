//! Handicap, komi and color assignment for a pairing
//!
//! Every 13 points of rating difference is worth one handicap stone. Inside a
//! 13-point band the komi drops by one point per rating point, from +6.5 down
//! to -5.5, and resets when the next stone is added.

use crate::error::LadderError;
use crate::rank::POINTS_PER_RANK;
use crate::types::{GameSettings, Komi, PairedPlayer, RatingPoints};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Komi for an even game
pub const BASE_KOMI: f64 = 6.5;

/// Largest rating difference still played without handicap stones
pub const EVEN_GAME_LIMIT: RatingPoints = POINTS_PER_RANK - 1;

/// Traditional maximum number of handicap stones
pub const MAX_HANDICAP_STONES: u8 = 9;

/// How komi behaves once the handicap is saturated and the difference keeps growing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KomiPolicy {
    /// Komi keeps dropping by one per point past the table
    #[default]
    Unbounded,
    /// Komi keeps cycling through the 13-point band at maximum handicap
    Cyclic,
}

impl fmt::Display for KomiPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KomiPolicy::Unbounded => write!(f, "unbounded"),
            KomiPolicy::Cyclic => write!(f, "cyclic"),
        }
    }
}

impl FromStr for KomiPolicy {
    type Err = LadderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unbounded" => Ok(KomiPolicy::Unbounded),
            "cyclic" => Ok(KomiPolicy::Cyclic),
            _ => Err(LadderError::ConfigurationError {
                message: format!("Unknown komi policy: {}", s),
            }),
        }
    }
}

/// Parameters of the handicap/komi formula
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingConfig {
    pub komi_policy: KomiPolicy,
    pub max_handicap: u8,
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            komi_policy: KomiPolicy::default(),
            max_handicap: MAX_HANDICAP_STONES,
        }
    }
}

impl PairingConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), LadderError> {
        if !(2..=MAX_HANDICAP_STONES).contains(&self.max_handicap) {
            return Err(LadderError::ConfigurationError {
                message: format!(
                    "Max handicap must be between 2 and {}, got {}",
                    MAX_HANDICAP_STONES, self.max_handicap
                ),
            });
        }
        Ok(())
    }

    /// Largest rating difference covered by the reference table (116 for 9 stones)
    pub fn table_limit(&self) -> RatingPoints {
        RatingPoints::from(self.max_handicap - 1) * POINTS_PER_RANK + EVEN_GAME_LIMIT
    }
}

/// Computes game settings from two players' ratings
#[derive(Debug, Clone, Default)]
pub struct PairingCalculator {
    config: PairingConfig,
}

impl PairingCalculator {
    pub fn new(config: PairingConfig) -> Result<Self, LadderError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PairingConfig {
        &self.config
    }

    /// Handicap stones for a rating difference: 0, then 2 up to the maximum
    pub fn handicap_stones(&self, rating_difference: RatingPoints) -> u8 {
        if rating_difference <= EVEN_GAME_LIMIT {
            return 0;
        }

        let stones = (rating_difference - POINTS_PER_RANK) / POINTS_PER_RANK + 2;
        stones.min(RatingPoints::from(self.config.max_handicap)) as u8
    }

    /// Komi for a rating difference
    pub fn komi(&self, rating_difference: RatingPoints) -> Komi {
        let limit = self.config.table_limit();

        if rating_difference > limit && self.config.komi_policy == KomiPolicy::Unbounded {
            let floor = BASE_KOMI - f64::from(EVEN_GAME_LIMIT);
            return Komi(floor - f64::from(rating_difference - limit));
        }

        Komi(BASE_KOMI - f64::from(rating_difference % POINTS_PER_RANK))
    }

    /// Derive colors, handicap and komi for a game between `first` and `second`
    ///
    /// With equal ratings the game is a nigiri and `first` is listed as black.
    /// Otherwise the weaker player takes black.
    pub fn compute_settings(
        &self,
        first: &PairedPlayer,
        second: &PairedPlayer,
    ) -> Result<GameSettings, LadderError> {
        if first.id == second.id {
            return Err(LadderError::InvalidPlayerPair {
                player_id: first.id.clone(),
            });
        }

        let rating_difference = first.rating_points.abs_diff(second.rating_points);

        if rating_difference == 0 {
            return Ok(GameSettings {
                black_player: first.clone(),
                white_player: second.clone(),
                rating_difference: 0,
                handicap_stones: 0,
                komi: Komi(BASE_KOMI),
                is_nigiri: true,
            });
        }

        let (black, white) = if first.rating_points < second.rating_points {
            (first, second)
        } else {
            (second, first)
        };

        Ok(GameSettings {
            black_player: black.clone(),
            white_player: white.clone(),
            rating_difference,
            handicap_stones: self.handicap_stones(rating_difference),
            komi: self.komi(rating_difference),
            is_nigiri: false,
        })
    }
}

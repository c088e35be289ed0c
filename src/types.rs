//! Common types used throughout the ladder

use crate::error::LadderError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use uuid::Uuid;

/// Unique identifier for players
pub type PlayerId = String;

/// Unique identifier for recorded games
pub type GameId = Uuid;

/// Skill measurement; 13 points make up one rank band
pub type RatingPoints = u32;

/// Signed change applied to a player's rating points after a game
pub type RatingDelta = i32;

/// Traditional Go rank
///
/// Ordered from weakest to strongest: 25k < 24k < ... < 1k < 1d < ... < 9d.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RankLabel {
    /// Student rank, 25 (weakest) to 1
    Kyu(u8),
    /// Master rank, 1 to 9 (strongest)
    Dan(u8),
}

/// Weakest kyu level
const MAX_KYU: u8 = 25;

/// Strongest dan level
const MAX_DAN: u8 = 9;

impl RankLabel {
    /// Kyu rank, rejecting levels outside 1..=25
    pub fn kyu(level: u8) -> Result<Self, LadderError> {
        RankLabel::Kyu(level).validate()
    }

    /// Dan rank, rejecting levels outside 1..=9
    pub fn dan(level: u8) -> Result<Self, LadderError> {
        RankLabel::Dan(level).validate()
    }

    pub fn is_valid(&self) -> bool {
        match self {
            RankLabel::Kyu(level) => (1..=MAX_KYU).contains(level),
            RankLabel::Dan(level) => (1..=MAX_DAN).contains(level),
        }
    }

    /// Return the label unchanged if its level is on the scale
    pub fn validate(self) -> Result<Self, LadderError> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(LadderError::InvalidRankFormat {
                input: self.raw_label(),
            })
        }
    }

    /// Position on the rank scale, 0 for 25k up to 33 for 9d
    ///
    /// Levels off the scale are pulled onto its nearest end.
    pub fn step(&self) -> u32 {
        match self {
            RankLabel::Kyu(level) => u32::from(MAX_KYU - (*level).clamp(1, MAX_KYU)),
            RankLabel::Dan(level) => {
                u32::from(MAX_KYU - 1) + u32::from((*level).clamp(1, MAX_DAN))
            }
        }
    }

    fn raw_label(&self) -> String {
        match self {
            RankLabel::Kyu(level) => format!("{}k", level),
            RankLabel::Dan(level) => format!("{}d", level),
        }
    }
}

impl Ord for RankLabel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.step().cmp(&other.step())
    }
}

impl PartialOrd for RankLabel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for RankLabel {
    /// Off-scale levels render as the nearest rank on the scale
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankLabel::Kyu(level) => write!(f, "{}k", (*level).clamp(1, MAX_KYU)),
            RankLabel::Dan(level) => write!(f, "{}d", (*level).clamp(1, MAX_DAN)),
        }
    }
}

impl From<RankLabel> for String {
    fn from(rank: RankLabel) -> Self {
        rank.to_string()
    }
}

impl TryFrom<String> for RankLabel {
    type Error = LadderError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

/// Persisted rank-tracking fields for a player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRankState {
    pub rating_points: RatingPoints,
    /// Rank label last confirmed by the hysteresis gate
    pub last_rank_reached: RankLabel,
    /// Games played since `last_rank_reached` was confirmed
    pub games_since_rank_change: u32,
}

/// A ladder member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub rank_state: PlayerRankState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Player {
    pub fn rating_points(&self) -> RatingPoints {
        self.rank_state.rating_points
    }
}

/// Compensation points for white, always a half-integer
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Komi(pub f64);

impl Komi {
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Reverse komi means black receives the compensation
    pub fn is_reverse(&self) -> bool {
        self.0 < 0.0
    }
}

impl fmt::Display for Komi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 >= 0.0 {
            write!(f, "+{}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Player summary carried in game settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairedPlayer {
    pub id: PlayerId,
    pub name: String,
    pub rating_points: RatingPoints,
}

impl From<&Player> for PairedPlayer {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id.clone(),
            name: player.name.clone(),
            rating_points: player.rating_points(),
        }
    }
}

/// Derived settings for a game between two ladder players
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSettings {
    pub black_player: PairedPlayer,
    pub white_player: PairedPlayer,
    pub rating_difference: RatingPoints,
    pub handicap_stones: u8,
    pub komi: Komi,
    /// Equal ratings: colors should be drawn by nigiri
    pub is_nigiri: bool,
}

/// Recorded result of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Black,
    White,
    Draw,
}

/// Stone color from one player's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerColor {
    Black,
    White,
}

impl fmt::Display for PlayerColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerColor::Black => write!(f, "black"),
            PlayerColor::White => write!(f, "white"),
        }
    }
}

/// Game result from one player's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameOutcome {
    Win,
    Loss,
    Draw,
}

/// A stored game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub id: GameId,
    pub played_at: DateTime<Utc>,
    pub black_player_id: PlayerId,
    pub white_player_id: PlayerId,
    pub winner: Winner,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl GameRecord {
    pub fn involves(&self, player_id: &PlayerId) -> bool {
        &self.black_player_id == player_id || &self.white_player_id == player_id
    }

    /// Color, opponent and outcome for `player_id`, if they took part
    pub fn perspective(&self, player_id: &PlayerId) -> Option<(PlayerColor, &PlayerId, GameOutcome)> {
        let (color, opponent) = if &self.black_player_id == player_id {
            (PlayerColor::Black, &self.white_player_id)
        } else if &self.white_player_id == player_id {
            (PlayerColor::White, &self.black_player_id)
        } else {
            return None;
        };

        let outcome = match (self.winner, color) {
            (Winner::Draw, _) => GameOutcome::Draw,
            (Winner::Black, PlayerColor::Black) | (Winner::White, PlayerColor::White) => {
                GameOutcome::Win
            }
            _ => GameOutcome::Loss,
        };

        Some((color, opponent, outcome))
    }
}

/// Game submission as entered by a ladder member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSubmission {
    pub black_player_id: PlayerId,
    pub white_player_id: PlayerId,
    pub winner: Winner,
    #[serde(default)]
    pub played_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A game as seen from one player's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentGame {
    pub game_id: GameId,
    pub played_at: DateTime<Utc>,
    pub opponent_id: PlayerId,
    pub opponent_name: String,
    pub player_color: PlayerColor,
    pub result: GameOutcome,
    pub notes: Option<String>,
}

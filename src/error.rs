//! Error types for the ladder
//!
//! Service-level code uses the anyhow-based `Result` alias; the pure rank and
//! pairing functions return `LadderError` directly so callers can match on it.

use crate::types::{GameId, PlayerId};

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific ladder scenarios
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LadderError {
    #[error("Invalid rank format: {input:?}")]
    InvalidRankFormat { input: String },

    #[error("Invalid player pair: {player_id} cannot play against themselves")]
    InvalidPlayerPair { player_id: PlayerId },

    #[error("Player not found: {player_id}")]
    PlayerNotFound { player_id: PlayerId },

    #[error("Player already exists: {player_id}")]
    DuplicatePlayer { player_id: PlayerId },

    #[error("Invalid player name: {reason}")]
    InvalidPlayerName { reason: String },

    #[error("Version conflict for player {player_id}: expected {expected}, found {found}")]
    VersionConflict {
        player_id: PlayerId,
        expected: u64,
        found: u64,
    },

    #[error("Game {game_id} was only partly recorded: {reason}")]
    PartialGameRecord { game_id: GameId, reason: String },

    #[error("Invalid game record: {reason}")]
    InvalidGameRecord { reason: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Internal ladder error: {message}")]
    InternalError { message: String },
}

impl LadderError {
    /// Whether a retry with a fresh snapshot could succeed
    pub fn is_conflict(&self) -> bool {
        matches!(self, LadderError::VersionConflict { .. })
    }
}

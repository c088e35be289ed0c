//! Ladder service
//!
//! Glue between the pure rank/pairing engine and a `LadderStore`: player
//! registration, game recording with rank updates, pairing, history and
//! standings.

use crate::config::LadderSettings;
use crate::error::{LadderError, Result};
use crate::ladder::standings::{
    build_standings, ActivityFilter, LadderEntry, StandingRow, StandingsSort,
};
use crate::ladder::storage::{LadderStore, VersionedPlayer};
use crate::pairing::PairingCalculator;
use crate::rank::{seed_from_reported_rank, DisplayRank, RankHysteresis, RankUpdate};
use crate::types::{
    GameRecord, GameSettings, GameSubmission, PairedPlayer, Player, PlayerId, RatingDelta,
    RecentGame, Winner,
};
use crate::utils::{current_timestamp, generate_game_id, generate_player_id, sanitize_notes};
use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Result of recording a game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameReport {
    pub game: GameRecord,
    pub black_update: RankUpdate,
    pub white_update: RankUpdate,
}

fn is_conflict(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<LadderError>()
        .is_some_and(LadderError::is_conflict)
}

/// Rating deltas for black and white given the winner
fn rating_deltas(winner: Winner, change: RatingDelta) -> (RatingDelta, RatingDelta) {
    match winner {
        Winner::Black => (change, change.saturating_neg()),
        Winner::White => (change.saturating_neg(), change),
        Winner::Draw => (0, 0),
    }
}

pub struct LadderService<S: LadderStore> {
    store: Arc<S>,
    hysteresis: RankHysteresis,
    pairing: PairingCalculator,
    settings: LadderSettings,
}

impl<S: LadderStore> LadderService<S> {
    pub fn new(store: Arc<S>, settings: LadderSettings) -> Result<Self> {
        settings.validate()?;
        let hysteresis = settings.hysteresis()?;
        let pairing = PairingCalculator::new(settings.pairing_config())?;

        Ok(Self {
            store,
            hysteresis,
            pairing,
            settings,
        })
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn hysteresis(&self) -> &RankHysteresis {
        &self.hysteresis
    }

    pub fn pairing(&self) -> &PairingCalculator {
        &self.pairing
    }

    pub fn settings(&self) -> &LadderSettings {
        &self.settings
    }

    async fn load(&self, player_id: &PlayerId) -> Result<VersionedPlayer> {
        self.store
            .get_player(player_id)
            .await?
            .ok_or_else(|| {
                LadderError::PlayerNotFound {
                    player_id: player_id.clone(),
                }
                .into()
            })
    }

    /// Register a player, seeding their rating from a self-reported rank
    ///
    /// Unrecognized ranks fall back to the default seed rank.
    pub async fn register_player(&self, name: &str, reported_rank: &str) -> Result<Player> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LadderError::InvalidPlayerName {
                reason: "Name cannot be empty".to_string(),
            }
            .into());
        }

        let (rank, rating_points) = seed_from_reported_rank(reported_rank);
        let now = current_timestamp();
        let player = Player {
            id: generate_player_id(),
            name: name.to_string(),
            rank_state: self.hysteresis.initial_state(rank, rating_points)?,
            created_at: now,
            updated_at: now,
        };

        let stored = self.store.insert_player(player).await?;
        info!(
            "Registered player {} ({}) at {} points as {}",
            stored.player.name, stored.player.id, rating_points, rank
        );

        Ok(stored.player)
    }

    pub async fn get_player(&self, player_id: &PlayerId) -> Result<Player> {
        Ok(self.load(player_id).await?.player)
    }

    pub async fn display_rank(&self, player_id: &PlayerId) -> Result<DisplayRank> {
        let player = self.get_player(player_id).await?;
        Ok(self.hysteresis.display_rank(&player.rank_state))
    }

    /// Apply a rating change to one player, retrying on version conflicts
    pub async fn apply_rating_change(
        &self,
        player_id: &PlayerId,
        delta: RatingDelta,
    ) -> Result<RankUpdate> {
        let attempts = self.settings.max_save_retries;
        let mut last_error = None;

        for attempt in 1..=attempts {
            let current = self.load(player_id).await?;
            let update = self
                .hysteresis
                .apply_game_result(&current.player.rank_state, delta);

            let mut player = current.player;
            player.rank_state = update.state.clone();
            player.updated_at = current_timestamp();

            match self.store.save_player(player, current.version).await {
                Ok(version) => {
                    debug!(
                        "Player {} now at {} points (version {})",
                        player_id, update.state.rating_points, version
                    );
                    if update.rank_changed {
                        info!(
                            "Rank change confirmed for {}: {} -> {}",
                            player_id,
                            update.previous.last_rank_reached,
                            update.state.last_rank_reached
                        );
                    }
                    return Ok(update);
                }
                Err(e) if is_conflict(&e) => {
                    warn!(
                        "Version conflict updating {} (attempt {}/{})",
                        player_id, attempt, attempts
                    );
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(match last_error {
            Some(e) => e.context(format!(
                "Giving up on rating update for {} after {} attempts",
                player_id, attempts
            )),
            None => anyhow!("No attempts made to update {}", player_id),
        })
    }

    /// Apply a single won or lost game to one player
    pub async fn simulate_game(
        &self,
        player_id: &PlayerId,
        won: bool,
        rating_change: RatingDelta,
    ) -> Result<RankUpdate> {
        let magnitude =
            RatingDelta::try_from(rating_change.unsigned_abs()).unwrap_or(RatingDelta::MAX);
        let delta = if won { magnitude } else { -magnitude };
        self.apply_rating_change(player_id, delta).await
    }

    /// Record a game and update both players' ratings and ranks
    pub async fn record_game(&self, submission: GameSubmission) -> Result<GameReport> {
        if submission.black_player_id == submission.white_player_id {
            return Err(LadderError::InvalidPlayerPair {
                player_id: submission.black_player_id,
            }
            .into());
        }

        // Both players must exist before anything is written
        self.load(&submission.black_player_id).await?;
        self.load(&submission.white_player_id).await?;

        let now = current_timestamp();
        let game = GameRecord {
            id: generate_game_id(),
            played_at: submission.played_at.unwrap_or(now),
            black_player_id: submission.black_player_id,
            white_player_id: submission.white_player_id,
            winner: submission.winner,
            notes: submission
                .notes
                .as_deref()
                .and_then(|notes| sanitize_notes(notes, self.settings.max_notes_length)),
            created_at: now,
        };

        self.store.insert_game(game.clone()).await?;
        info!(
            "Recorded game {}: {} (black) vs {} (white), winner {:?}",
            game.id, game.black_player_id, game.white_player_id, game.winner
        );

        let (black_delta, white_delta) =
            rating_deltas(game.winner, self.settings.rating_change_per_game);
        let black_update = match self
            .apply_rating_change(&game.black_player_id, black_delta)
            .await
        {
            Ok(update) => update,
            Err(e) => return Err(self.abandon_game(&game, None, e).await),
        };
        let white_update = match self
            .apply_rating_change(&game.white_player_id, white_delta)
            .await
        {
            Ok(update) => update,
            Err(e) => {
                let applied = (&game.black_player_id, &black_update);
                return Err(self.abandon_game(&game, Some(applied), e).await);
            }
        };

        Ok(GameReport {
            game,
            black_update,
            white_update,
        })
    }

    /// Undo a game whose rating updates could not all be saved
    ///
    /// Returns the error to report: the original failure when the game and any
    /// applied update were rolled back, otherwise `PartialGameRecord`.
    async fn abandon_game(
        &self,
        game: &GameRecord,
        applied: Option<(&PlayerId, &RankUpdate)>,
        cause: anyhow::Error,
    ) -> anyhow::Error {
        warn!("Rolling back game {}: {:#}", game.id, cause);

        let rollback = async {
            if let Some((player_id, update)) = applied {
                self.revert_rank_state(player_id, update).await?;
            }
            self.store.remove_game(&game.id).await?;
            Ok::<(), anyhow::Error>(())
        }
        .await;

        match rollback {
            Ok(()) => cause.context(format!("Game {} was not recorded", game.id)),
            Err(rollback_error) => {
                error!("Game {} left partly recorded: {:#}", game.id, rollback_error);
                LadderError::PartialGameRecord {
                    game_id: game.id,
                    reason: format!("{:#}; rollback failed: {:#}", cause, rollback_error),
                }
                .into()
            }
        }
    }

    /// Put a player's rank state back to what it was before `update`
    ///
    /// Fails if the player changed again in the meantime.
    async fn revert_rank_state(&self, player_id: &PlayerId, update: &RankUpdate) -> Result<()> {
        let attempts = self.settings.max_save_retries;

        for attempt in 1..=attempts {
            let current = self.load(player_id).await?;
            if current.player.rank_state != update.state {
                return Err(LadderError::InternalError {
                    message: format!(
                        "Rank state of {} changed before it could be reverted",
                        player_id
                    ),
                }
                .into());
            }

            let mut player = current.player;
            player.rank_state = update.previous.clone();
            player.updated_at = current_timestamp();

            match self.store.save_player(player, current.version).await {
                Ok(_) => {
                    debug!(
                        "Reverted {} to {} points",
                        player_id, update.previous.rating_points
                    );
                    return Ok(());
                }
                Err(e) if is_conflict(&e) && attempt < attempts => {
                    warn!(
                        "Version conflict reverting {} (attempt {}/{})",
                        player_id, attempt, attempts
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Err(anyhow!("No attempts made to revert {}", player_id))
    }

    /// Game settings for two ladder players
    pub async fn pair(&self, first_id: &PlayerId, second_id: &PlayerId) -> Result<GameSettings> {
        if first_id == second_id {
            return Err(LadderError::InvalidPlayerPair {
                player_id: first_id.clone(),
            }
            .into());
        }

        let first = self.get_player(first_id).await?;
        let second = self.get_player(second_id).await?;

        let settings = self
            .pairing
            .compute_settings(&PairedPlayer::from(&first), &PairedPlayer::from(&second))?;
        debug!(
            "Paired {} and {}: {} stones, komi {}",
            first_id, second_id, settings.handicap_stones, settings.komi
        );

        Ok(settings)
    }

    /// A player's most recent games from their own point of view
    pub async fn recent_games(
        &self,
        player_id: &PlayerId,
        limit: Option<usize>,
    ) -> Result<Vec<RecentGame>> {
        self.load(player_id).await?;
        let limit = limit.unwrap_or(self.settings.recent_games_limit);

        let mut recent = Vec::new();
        for game in self
            .store
            .games_for_player(player_id)
            .await?
            .into_iter()
            .take(limit)
        {
            let Some((color, opponent_id, result)) = game.perspective(player_id) else {
                continue;
            };

            let opponent_name = match self.store.get_player(opponent_id).await? {
                Some(opponent) => opponent.player.name,
                None => {
                    warn!("Game {} references unknown player {}", game.id, opponent_id);
                    opponent_id.clone()
                }
            };

            recent.push(RecentGame {
                game_id: game.id,
                played_at: game.played_at,
                opponent_id: opponent_id.clone(),
                opponent_name,
                player_color: color,
                result,
                notes: game.notes.clone(),
            });
        }

        Ok(recent)
    }

    /// Standings table as of `now`
    pub async fn standings(
        &self,
        filter: ActivityFilter,
        sort: StandingsSort,
        now: DateTime<Utc>,
    ) -> Result<Vec<StandingRow>> {
        let mut entries = Vec::new();
        for stored in self.store.list_players().await? {
            let last_game = self.store.last_game_date(&stored.player.id).await?;
            entries.push(LadderEntry {
                player: stored.player,
                last_game,
            });
        }

        Ok(build_standings(
            entries,
            &self.hysteresis,
            filter,
            sort,
            now,
        ))
    }
}

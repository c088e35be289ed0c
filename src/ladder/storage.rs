//! Ladder storage interface and in-memory implementation
//!
//! Player records are versioned. Saving with a stale version fails with
//! `LadderError::VersionConflict`, which lets callers re-read and retry a
//! read-modify-write of a player's rank state.

use crate::error::{LadderError, Result};
use crate::types::{GameId, GameRecord, Player, PlayerId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// A stored player together with its optimistic-concurrency version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionedPlayer {
    pub player: Player,
    pub version: u64,
}

/// Persistence collaborator for players and games
#[async_trait]
pub trait LadderStore: Send + Sync {
    /// Get a player by id
    async fn get_player(&self, player_id: &PlayerId) -> Result<Option<VersionedPlayer>>;

    /// Add a new player, failing if the id is taken
    async fn insert_player(&self, player: Player) -> Result<VersionedPlayer>;

    /// Replace a player if the stored version still equals `expected_version`
    ///
    /// Returns the new version.
    async fn save_player(&self, player: Player, expected_version: u64) -> Result<u64>;

    /// All players on the ladder
    async fn list_players(&self) -> Result<Vec<VersionedPlayer>>;

    /// Store a game record
    async fn insert_game(&self, game: GameRecord) -> Result<()>;

    /// Delete a game record, returning whether it existed
    async fn remove_game(&self, game_id: &GameId) -> Result<bool>;

    /// Games a player took part in, most recent first
    async fn games_for_player(&self, player_id: &PlayerId) -> Result<Vec<GameRecord>>;

    /// Date of the player's most recent game
    async fn last_game_date(&self, player_id: &PlayerId) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .games_for_player(player_id)
            .await?
            .first()
            .map(|game| game.played_at))
    }
}

fn lock_error(kind: &str) -> LadderError {
    LadderError::InternalError {
        message: format!("Failed to acquire {} lock", kind),
    }
}

/// In-memory ladder storage
#[derive(Debug, Default)]
pub struct InMemoryLadderStore {
    players: RwLock<HashMap<PlayerId, VersionedPlayer>>,
    games: RwLock<Vec<GameRecord>>,
}

impl InMemoryLadderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored games
    pub fn game_count(&self) -> Result<usize> {
        let games = self.games.read().map_err(|_| lock_error("games read"))?;
        Ok(games.len())
    }
}

#[async_trait]
impl LadderStore for InMemoryLadderStore {
    async fn get_player(&self, player_id: &PlayerId) -> Result<Option<VersionedPlayer>> {
        let players = self
            .players
            .read()
            .map_err(|_| lock_error("players read"))?;

        Ok(players.get(player_id).cloned())
    }

    async fn insert_player(&self, player: Player) -> Result<VersionedPlayer> {
        let mut players = self
            .players
            .write()
            .map_err(|_| lock_error("players write"))?;

        if players.contains_key(&player.id) {
            return Err(LadderError::DuplicatePlayer {
                player_id: player.id,
            }
            .into());
        }

        let entry = VersionedPlayer { player, version: 1 };
        players.insert(entry.player.id.clone(), entry.clone());
        Ok(entry)
    }

    async fn save_player(&self, player: Player, expected_version: u64) -> Result<u64> {
        let mut players = self
            .players
            .write()
            .map_err(|_| lock_error("players write"))?;

        let stored = players
            .get_mut(&player.id)
            .ok_or_else(|| LadderError::PlayerNotFound {
                player_id: player.id.clone(),
            })?;

        if stored.version != expected_version {
            return Err(LadderError::VersionConflict {
                player_id: player.id,
                expected: expected_version,
                found: stored.version,
            }
            .into());
        }

        stored.version += 1;
        stored.player = player;
        Ok(stored.version)
    }

    async fn list_players(&self) -> Result<Vec<VersionedPlayer>> {
        let players = self
            .players
            .read()
            .map_err(|_| lock_error("players read"))?;

        Ok(players.values().cloned().collect())
    }

    async fn insert_game(&self, game: GameRecord) -> Result<()> {
        let mut games = self.games.write().map_err(|_| lock_error("games write"))?;
        games.push(game);
        Ok(())
    }

    async fn remove_game(&self, game_id: &GameId) -> Result<bool> {
        let mut games = self.games.write().map_err(|_| lock_error("games write"))?;
        let before = games.len();
        games.retain(|game| game.id != *game_id);
        Ok(games.len() != before)
    }

    async fn games_for_player(&self, player_id: &PlayerId) -> Result<Vec<GameRecord>> {
        let games = self.games.read().map_err(|_| lock_error("games read"))?;

        let mut result: Vec<GameRecord> = games
            .iter()
            .filter(|game| game.involves(player_id))
            .cloned()
            .collect();

        result.sort_by(|a, b| {
            b.played_at
                .cmp(&a.played_at)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PlayerRankState, RankLabel, Winner};
    use chrono::Duration;
    use uuid::Uuid;

    fn create_test_player(id: &str, points: u32) -> Player {
        let now = Utc::now();
        Player {
            id: id.to_string(),
            name: id.to_string(),
            rank_state: PlayerRankState {
                rating_points: points,
                last_rank_reached: RankLabel::Kyu(15),
                games_since_rank_change: 5,
            },
            created_at: now,
            updated_at: now,
        }
    }

    fn create_test_game(black: &str, white: &str, played_at: DateTime<Utc>) -> GameRecord {
        GameRecord {
            id: Uuid::new_v4(),
            played_at,
            black_player_id: black.to_string(),
            white_player_id: white.to_string(),
            winner: Winner::Black,
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_player() {
        let store = InMemoryLadderStore::new();
        assert!(store.get_player(&"p1".to_string()).await.unwrap().is_none());

        let stored = store.insert_player(create_test_player("p1", 137)).await.unwrap();
        assert_eq!(stored.version, 1);

        let fetched = store.get_player(&"p1".to_string()).await.unwrap().unwrap();
        assert_eq!(fetched.player.rating_points(), 137);
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let store = InMemoryLadderStore::new();
        store.insert_player(create_test_player("p1", 137)).await.unwrap();

        let err = store
            .insert_player(create_test_player("p1", 50))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LadderError>(),
            Some(LadderError::DuplicatePlayer { .. })
        ));
    }

    #[tokio::test]
    async fn test_save_checks_version() {
        let store = InMemoryLadderStore::new();
        store.insert_player(create_test_player("p1", 137)).await.unwrap();

        let version = store
            .save_player(create_test_player("p1", 138), 1)
            .await
            .unwrap();
        assert_eq!(version, 2);

        let err = store
            .save_player(create_test_player("p1", 139), 1)
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<LadderError>(),
            Some(&LadderError::VersionConflict {
                player_id: "p1".to_string(),
                expected: 1,
                found: 2,
            })
        );

        let fetched = store.get_player(&"p1".to_string()).await.unwrap().unwrap();
        assert_eq!(fetched.player.rating_points(), 138);
    }

    #[tokio::test]
    async fn test_save_unknown_player() {
        let store = InMemoryLadderStore::new();
        let err = store
            .save_player(create_test_player("ghost", 1), 1)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LadderError>(),
            Some(LadderError::PlayerNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_games_most_recent_first() {
        let store = InMemoryLadderStore::new();
        let now = Utc::now();

        store
            .insert_game(create_test_game("a", "b", now - Duration::days(2)))
            .await
            .unwrap();
        store.insert_game(create_test_game("b", "a", now)).await.unwrap();
        store
            .insert_game(create_test_game("c", "d", now - Duration::days(1)))
            .await
            .unwrap();

        let games = store.games_for_player(&"a".to_string()).await.unwrap();
        assert_eq!(games.len(), 2);
        assert_eq!(games[0].played_at, now);

        assert_eq!(
            store.last_game_date(&"a".to_string()).await.unwrap(),
            Some(now)
        );
        assert_eq!(store.last_game_date(&"z".to_string()).await.unwrap(), None);
        assert_eq!(store.game_count().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_remove_game() {
        let store = InMemoryLadderStore::new();
        let game = create_test_game("a", "b", Utc::now());
        let id = game.id;
        store.insert_game(game).await.unwrap();

        assert!(store.remove_game(&id).await.unwrap());
        assert!(!store.remove_game(&id).await.unwrap());
        assert_eq!(store.game_count().unwrap(), 0);
    }
}

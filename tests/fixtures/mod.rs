//! Test fixtures and store wrappers for integration testing

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use zugol::config::LadderSettings;
use zugol::error::{LadderError, Result};
use zugol::ladder::{InMemoryLadderStore, LadderService, LadderStore, VersionedPlayer};
use zugol::types::{GameId, GameRecord, Player, PlayerId};

/// Store that rejects up to `conflicts` saves with a version conflict
///
/// Conflicts can be limited to one player and held back until a number of
/// saves have gone through.
#[derive(Debug, Default)]
pub struct ConflictingStore {
    inner: InMemoryLadderStore,
    remaining_conflicts: AtomicU32,
    free_saves: AtomicU32,
    target: Mutex<Option<PlayerId>>,
    save_calls: AtomicU32,
}

impl ConflictingStore {
    pub fn new(conflicts: u32) -> Self {
        Self {
            inner: InMemoryLadderStore::new(),
            remaining_conflicts: AtomicU32::new(conflicts),
            free_saves: AtomicU32::new(0),
            target: Mutex::new(None),
            save_calls: AtomicU32::new(0),
        }
    }

    /// Let the first `saves` saves through before conflicting
    pub fn after_saves(self, saves: u32) -> Self {
        self.free_saves.store(saves, Ordering::SeqCst);
        self
    }

    /// Only conflict on saves of this player
    pub fn only_for(&self, player_id: &PlayerId) {
        *self.target.lock().unwrap() = Some(player_id.clone());
    }

    /// Number of save attempts seen, including rejected ones
    pub fn save_calls(&self) -> u32 {
        self.save_calls.load(Ordering::SeqCst)
    }

    pub fn game_count(&self) -> usize {
        self.inner.game_count().unwrap()
    }

    fn take(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl LadderStore for ConflictingStore {
    async fn get_player(&self, player_id: &PlayerId) -> Result<Option<VersionedPlayer>> {
        self.inner.get_player(player_id).await
    }

    async fn insert_player(&self, player: Player) -> Result<VersionedPlayer> {
        self.inner.insert_player(player).await
    }

    async fn save_player(&self, player: Player, expected_version: u64) -> Result<u64> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);

        let targeted = match self.target.lock().unwrap().as_ref() {
            Some(target) => *target == player.id,
            None => true,
        };
        let inject =
            targeted && !Self::take(&self.free_saves) && Self::take(&self.remaining_conflicts);
        if inject {
            return Err(LadderError::VersionConflict {
                player_id: player.id,
                expected: expected_version,
                found: expected_version + 1,
            }
            .into());
        }

        self.inner.save_player(player, expected_version).await
    }

    async fn list_players(&self) -> Result<Vec<VersionedPlayer>> {
        self.inner.list_players().await
    }

    async fn insert_game(&self, game: GameRecord) -> Result<()> {
        self.inner.insert_game(game).await
    }

    async fn remove_game(&self, game_id: &GameId) -> Result<bool> {
        self.inner.remove_game(game_id).await
    }

    async fn games_for_player(&self, player_id: &PlayerId) -> Result<Vec<GameRecord>> {
        self.inner.games_for_player(player_id).await
    }

    async fn last_game_date(&self, player_id: &PlayerId) -> Result<Option<DateTime<Utc>>> {
        self.inner.last_game_date(player_id).await
    }
}

/// Ladder service over a fresh in-memory store
pub fn create_test_service(settings: LadderSettings) -> LadderService<InMemoryLadderStore> {
    LadderService::new(Arc::new(InMemoryLadderStore::new()), settings).unwrap()
}

/// Register several players, returning them in the given order
pub async fn register_players<S: LadderStore>(
    service: &LadderService<S>,
    players: &[(&str, &str)],
) -> Vec<Player> {
    let mut registered = Vec::new();
    for (name, rank) in players {
        registered.push(service.register_player(name, rank).await.unwrap());
    }
    registered
}

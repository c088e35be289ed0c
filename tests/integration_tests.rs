//! Integration tests for the zugol ladder
//!
//! These tests drive the ladder service end to end:
//! - Registration, game recording and standings
//! - Rank hysteresis across a run of games
//! - Optimistic-concurrency retries against the store
//! - Concurrent game submissions

mod fixtures;

use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use zugol::config::LadderSettings;
use zugol::error::LadderError;
use zugol::ladder::{ActivityFilter, LadderService, StandingsSort};
use zugol::pairing::TablePosition;
use zugol::types::{GameOutcome, GameSubmission, RankLabel, Winner};

use fixtures::{create_test_service, register_players, ConflictingStore};

fn submission(black: &str, white: &str, winner: Winner) -> GameSubmission {
    GameSubmission {
        black_player_id: black.to_string(),
        white_player_id: white.to_string(),
        winner,
        played_at: None,
        notes: None,
    }
}

#[tokio::test]
async fn test_complete_ladder_workflow() {
    let service = create_test_service(LadderSettings::default());
    let players = register_players(
        &service,
        &[("Alice", "3k"), ("Bob", "5k"), ("Carol", "not-a-rank")],
    )
    .await;
    let (alice, bob, carol) = (&players[0], &players[1], &players[2]);

    assert_eq!(alice.rating_points(), 293);
    assert_eq!(bob.rating_points(), 267);
    assert_eq!(carol.rating_points(), 137);

    // Bob takes black against the stronger Alice
    let settings = service.pair(&alice.id, &bob.id).await.unwrap();
    assert_eq!(settings.black_player.id, bob.id);
    assert_eq!(settings.rating_difference, 26);
    assert_eq!(settings.handicap_stones, 3);
    assert_eq!(settings.komi.to_string(), "+6.5");

    service
        .record_game(submission(&bob.id, &alice.id, Winner::Black))
        .await
        .unwrap();
    service
        .record_game(submission(&carol.id, &bob.id, Winner::White))
        .await
        .unwrap();

    let standings = service
        .standings(ActivityFilter::All, StandingsSort::default(), Utc::now())
        .await
        .unwrap();
    let order: Vec<&str> = standings.iter().map(|row| row.name.as_str()).collect();
    assert_eq!(order, vec!["Alice", "Bob", "Carol"]);
    assert_eq!(standings[0].rating_points, 292);
    assert_eq!(standings[1].rating_points, 269);
    assert_eq!(standings[2].rating_points, 136);

    let history = service.recent_games(&bob.id, None).await.unwrap();
    assert_eq!(history.len(), 2);
    assert!(history
        .iter()
        .all(|game| game.result == GameOutcome::Win));
}

#[tokio::test]
async fn test_rank_freeze_across_games() {
    let settings = LadderSettings {
        rating_change_per_game: 13,
        ..LadderSettings::default()
    };
    let service = create_test_service(settings);
    let players = register_players(&service, &[("Climber", "25k"), ("Anchor", "9d")]).await;
    let (climber, anchor) = (&players[0], &players[1]);

    let mut shown = Vec::new();
    let mut changes = Vec::new();
    for _ in 0..6 {
        let report = service
            .record_game(submission(&climber.id, &anchor.id, Winner::Black))
            .await
            .unwrap();
        changes.push(report.black_update.rank_changed);
        shown.push(service.display_rank(&climber.id).await.unwrap().to_string());
    }

    // Already settled, so the first crossing is confirmed at once; the next
    // four crossings wait out the freeze window.
    assert_eq!(changes, vec![true, false, false, false, false, true]);
    assert_eq!(shown, vec!["24k*", "24k*", "24k*", "24k*", "24k*", "19k*"]);

    let climber = service.get_player(&climber.id).await.unwrap();
    assert_eq!(climber.rating_points(), 85);
    assert_eq!(climber.rank_state.last_rank_reached, RankLabel::Kyu(19));
    assert_eq!(climber.rank_state.games_since_rank_change, 0);
}

#[tokio::test]
async fn test_rating_update_retries_on_conflict() {
    let store = Arc::new(ConflictingStore::new(2));
    let service = LadderService::new(store.clone(), LadderSettings::default()).unwrap();
    let players = register_players(&service, &[("Alice", "10k")]).await;

    let update = service.apply_rating_change(&players[0].id, 5).await.unwrap();
    assert_eq!(update.state.rating_points, 207);
    assert_eq!(store.save_calls(), 3);

    let stored = service.get_player(&players[0].id).await.unwrap();
    assert_eq!(stored.rating_points(), 207);
}

#[tokio::test]
async fn test_rating_update_gives_up_after_retries() {
    let store = Arc::new(ConflictingStore::new(10));
    let settings = LadderSettings {
        max_save_retries: 3,
        ..LadderSettings::default()
    };
    let service = LadderService::new(store.clone(), settings).unwrap();
    let players = register_players(&service, &[("Alice", "10k")]).await;

    let err = service
        .apply_rating_change(&players[0].id, 5)
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LadderError>(),
        Some(LadderError::VersionConflict { .. })
    ));
    assert_eq!(store.save_calls(), 3);

    let stored = service.get_player(&players[0].id).await.unwrap();
    assert_eq!(stored.rating_points(), 202);
}

#[tokio::test]
async fn test_joined_updates_for_different_players() {
    let service = create_test_service(LadderSettings::default());
    let players = register_players(&service, &[("A", "20k"), ("B", "10k"), ("C", "1d")]).await;

    let updates = join_all(
        players
            .iter()
            .map(|player| service.apply_rating_change(&player.id, -3)),
    )
    .await;

    let points: Vec<u32> = updates
        .into_iter()
        .map(|update| update.unwrap().state.rating_points)
        .collect();
    assert_eq!(points, vec![69, 199, 329]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_submissions_conserve_points() {
    let settings = LadderSettings {
        max_save_retries: 100,
        ..LadderSettings::default()
    };
    let service = Arc::new(create_test_service(settings));
    let players = register_players(service.as_ref(), &[("East", "5d"), ("West", "5d")]).await;
    let (east, west) = (players[0].id.clone(), players[1].id.clone());

    let mut handles = Vec::new();
    for round in 0..20 {
        let service = service.clone();
        let (black, white) = if round % 2 == 0 {
            (east.clone(), west.clone())
        } else {
            (west.clone(), east.clone())
        };
        let winner = if round % 3 == 0 { Winner::White } else { Winner::Black };
        handles.push(tokio::spawn(async move {
            service
                .record_game(submission(&black, &white, winner))
                .await
        }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let east = service.get_player(&east).await.unwrap();
    let west = service.get_player(&west).await.unwrap();
    assert_eq!(east.rating_points() + west.rating_points(), 2 * 384);
    assert_eq!(service.store().game_count().unwrap(), 20);
}

#[tokio::test]
async fn test_pairing_matches_table_highlight() {
    let service = create_test_service(LadderSettings::default());
    let players = register_players(&service, &[("Strong", "1d"), ("Weak", "6k")]).await;
    service.apply_rating_change(&players[1].id, 4).await.unwrap();

    let settings = service.pair(&players[0].id, &players[1].id).await.unwrap();
    assert_eq!(settings.rating_difference, 74);
    assert_eq!(settings.handicap_stones, 6);
    assert_eq!(settings.komi.to_string(), "-2.5");
    let position = service
        .pairing()
        .table_position(settings.rating_difference)
        .unwrap();

    assert_eq!(
        position,
        TablePosition {
            handicap_stones: settings.handicap_stones,
            komi_index: (settings.rating_difference % 13) as usize,
        }
    );
    let table = service.pairing().rating_table();
    assert_eq!(
        table[position.row_index()].komi_values[position.komi_index],
        settings.komi
    );
}

#[tokio::test]
async fn test_activity_filter_hides_inactive_players() {
    let service = create_test_service(LadderSettings::default());
    let players = register_players(&service, &[("Active", "10k"), ("Idle", "1k")]).await;
    let partner = register_players(&service, &[("Partner", "10k")]).await;

    service
        .record_game(submission(&players[0].id, &partner[0].id, Winner::Draw))
        .await
        .unwrap();

    let rows = service
        .standings(
            ActivityFilter::LastMonth,
            StandingsSort::default(),
            Utc::now(),
        )
        .await
        .unwrap();
    let names: Vec<&str> = rows.iter().map(|row| row.name.as_str()).collect();
    assert_eq!(names.len(), 2);
    assert!(!names.contains(&"Idle"));
    // Idle has the most points but no games, so sits last on the full ladder
    assert!(rows.iter().all(|row| row.position <= 2));
}

#[tokio::test]
async fn test_failed_second_update_rolls_back_game() {
    let store = Arc::new(ConflictingStore::new(10));
    let service = LadderService::new(store.clone(), LadderSettings::default()).unwrap();
    let players = register_players(&service, &[("Alice", "10k"), ("Bob", "10k")]).await;
    let (alice, bob) = (&players[0], &players[1]);
    store.only_for(&bob.id);

    let err = service
        .record_game(submission(&alice.id, &bob.id, Winner::Black))
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LadderError>(),
        Some(LadderError::VersionConflict { .. })
    ));

    // Alice's win was undone along with the game itself
    let alice_after = service.get_player(&alice.id).await.unwrap();
    let bob_after = service.get_player(&bob.id).await.unwrap();
    assert_eq!(alice_after.rank_state, alice.rank_state);
    assert_eq!(bob_after.rating_points(), 202);
    assert_eq!(store.game_count(), 0);
    assert!(service.recent_games(&alice.id, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_rollback_reports_partial_game() {
    // Alice's save goes through, every later save conflicts
    let store = Arc::new(ConflictingStore::new(10).after_saves(1));
    let service = LadderService::new(store.clone(), LadderSettings::default()).unwrap();
    let players = register_players(&service, &[("Alice", "10k"), ("Bob", "10k")]).await;
    let (alice, bob) = (&players[0], &players[1]);

    let err = service
        .record_game(submission(&alice.id, &bob.id, Winner::Black))
        .await
        .unwrap_err();

    let recent = service.recent_games(&alice.id, None).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(
        err.downcast_ref::<LadderError>().map(|e| match e {
            LadderError::PartialGameRecord { game_id, .. } => Some(*game_id),
            _ => None,
        }),
        Some(Some(recent[0].game_id))
    );

    assert_eq!(store.game_count(), 1);
    assert_eq!(service.get_player(&alice.id).await.unwrap().rating_points(), 203);
    assert_eq!(service.get_player(&bob.id).await.unwrap().rating_points(), 202);
}

//! Store and service level tests for the watch-mark mutations and the
//! export/import round trip.

use std::sync::Arc;

use trackarr::clients::tvmaze::TvMazeClient;
use trackarr::db::Store;
use trackarr::models::episode::Episode;
use trackarr::models::show::Show;
use trackarr::services::{ServiceError, ShowService, TransferService, WatchService};
use trackarr::watch::WatchState;

async fn test_store() -> Store {
    let db_path = std::env::temp_dir().join(format!("trackarr-flow-test-{}.db", uuid::Uuid::new_v4()));
    Store::new(&format!("sqlite:{}", db_path.display()))
        .await
        .expect("failed to create test store")
}

fn offline_client() -> Arc<TvMazeClient> {
    // Points nowhere; these tests never leave the store.
    Arc::new(TvMazeClient::with_shared_client(
        reqwest::Client::new(),
        "http://127.0.0.1:9",
    ))
}

fn show(id: i32, name: &str, status: &str) -> Show {
    Show {
        id,
        name: name.to_string(),
        summary: None,
        status: status.to_string(),
        premiered: Some("2024-01-01".to_string()),
        ended: None,
        image_medium: None,
        image_original: None,
    }
}

fn episode(id: i32, show_id: i32, season: i32, number: i32, airdate: Option<&str>) -> Episode {
    Episode {
        id,
        show_id,
        season,
        number,
        name: format!("Episode {number}"),
        summary: None,
        airdate: airdate.map(String::from),
        airtime: Some("21:00".to_string()),
        runtime: Some(60),
    }
}

async fn seed_show(store: &Store, profile_id: i32, show_id: i32, status: &str) {
    store
        .upsert_show(&show(show_id, "Seeded Show", status))
        .await
        .unwrap();
    store
        .upsert_episodes(&[
            episode(show_id * 10 + 1, show_id, 1, 1, Some("2024-01-01")),
            episode(show_id * 10 + 2, show_id, 1, 2, Some("2024-01-08")),
            episode(show_id * 10 + 3, show_id, 2, 1, Some("2099-06-01")),
        ])
        .await
        .unwrap();
    store.add_link(profile_id, show_id, None).await.unwrap();
}

#[tokio::test]
async fn episode_toggle_is_idempotent() {
    let store = test_store().await;
    seed_show(&store, 1, 10, "Running").await;
    let watching = WatchService::new(store.clone());

    watching.toggle_episode(1, 101, true).await.unwrap();
    watching.toggle_episode(1, 101, true).await.unwrap();

    let marks = store.watch_marks_for_episodes(1, &[101]).await.unwrap();
    assert_eq!(marks.len(), 1);

    watching.toggle_episode(1, 101, false).await.unwrap();
    // Unmarking an already-unwatched episode is a no-op, not an error.
    watching.toggle_episode(1, 101, false).await.unwrap();

    let marks = store.watch_marks_for_episodes(1, &[101]).await.unwrap();
    assert!(marks.is_empty());
}

#[tokio::test]
async fn episode_toggle_requires_link() {
    let store = test_store().await;
    // Show exists in the catalog but is not linked to the profile.
    store.upsert_show(&show(10, "Unlinked", "Running")).await.unwrap();
    store
        .upsert_episodes(&[episode(101, 10, 1, 1, Some("2024-01-01"))])
        .await
        .unwrap();

    let watching = WatchService::new(store.clone());

    match watching.toggle_episode(1, 101, true).await {
        Err(ServiceError::NotFound(_)) => {}
        other => panic!("expected NotFound, got {other:?}"),
    }

    match watching.toggle_episode(1, 999, true).await {
        Err(ServiceError::NotFound(_)) => {}
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn season_toggle_shares_one_timestamp() {
    let store = test_store().await;
    seed_show(&store, 1, 10, "Running").await;
    let watching = WatchService::new(store.clone());

    watching.toggle_season(1, 10, 1, true).await.unwrap();

    let marks = store.watch_marks_for_episodes(1, &[101, 102, 103]).await.unwrap();
    assert_eq!(marks.len(), 2); // season 1 only
    assert_eq!(marks[0].watched_at, marks[1].watched_at);

    watching.toggle_season(1, 10, 1, false).await.unwrap();
    let marks = store.watch_marks_for_episodes(1, &[101, 102]).await.unwrap();
    assert!(marks.is_empty());
}

#[tokio::test]
async fn removing_show_drops_link_and_marks() {
    let store = test_store().await;
    seed_show(&store, 1, 10, "Running").await;
    let watching = WatchService::new(store.clone());
    watching.toggle_season(1, 10, 1, true).await.unwrap();

    let removed = store.remove_link(1, 10).await.unwrap();
    assert!(removed);

    assert!(store.get_link(1, 10).await.unwrap().is_none());
    let marks = store.watch_marks_for_episodes(1, &[101, 102]).await.unwrap();
    assert!(marks.is_empty());

    // The catalog rows themselves survive; they belong to the catalog.
    assert!(store.get_show(10).await.unwrap().is_some());
}

#[tokio::test]
async fn derived_state_tracks_mutations() {
    let store = test_store().await;
    seed_show(&store, 1, 10, "Running").await;
    let shows = ShowService::new(store.clone(), offline_client());
    let watching = WatchService::new(store.clone());
    let as_of = chrono::NaiveDate::parse_from_str("2024-06-01", "%Y-%m-%d").unwrap();

    let state_of = |buckets: &[trackarr::watch::Bucket<trackarr::services::TrackedShow>]| {
        buckets
            .iter()
            .find_map(|b| (!b.shows.is_empty()).then_some(b.state))
            .expect("show should land in some bucket")
    };

    let buckets = shows.categorized(1, as_of).await.unwrap();
    assert_eq!(state_of(&buckets), WatchState::Queued);

    watching.toggle_episode(1, 101, true).await.unwrap();
    let buckets = shows.categorized(1, as_of).await.unwrap();
    assert_eq!(state_of(&buckets), WatchState::Watching);

    watching.toggle_episode(1, 102, true).await.unwrap();
    let buckets = shows.categorized(1, as_of).await.unwrap();
    assert_eq!(state_of(&buckets), WatchState::UpToDate);

    shows
        .set_status_override(1, 10, Some("stopped"))
        .await
        .unwrap();
    let buckets = shows.categorized(1, as_of).await.unwrap();
    assert_eq!(state_of(&buckets), WatchState::Stopped);

    // Clearing the override recomputes from the marks alone.
    shows.set_status_override(1, 10, None).await.unwrap();
    let buckets = shows.categorized(1, as_of).await.unwrap();
    assert_eq!(state_of(&buckets), WatchState::UpToDate);
}

#[tokio::test]
async fn status_override_rejects_unknown_values() {
    let store = test_store().await;
    seed_show(&store, 1, 10, "Running").await;
    let shows = ShowService::new(store.clone(), offline_client());

    match shows.set_status_override(1, 10, Some("paused")).await {
        Err(ServiceError::Validation(_)) => {}
        other => panic!("expected Validation, got {other:?}"),
    }

    match shows.set_status_override(1, 99, Some("stopped")).await {
        Err(ServiceError::NotFound(_)) => {}
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn export_import_round_trip_preserves_marks() {
    let store = test_store().await;
    seed_show(&store, 1, 10, "Running").await;
    let watching = WatchService::new(store.clone());
    let transfer = TransferService::new(store.clone(), offline_client());

    watching.toggle_episode(1, 101, true).await.unwrap();
    watching.toggle_episode(1, 102, true).await.unwrap();

    let exported = transfer.export(1).await.unwrap();
    assert_eq!(exported.version, 1);
    assert_eq!(exported.shows.len(), 1);

    // Import into a fresh profile under the same account.
    let second = store.create_profile(1, "Second").await.unwrap();
    let json = serde_json::to_string(&exported).unwrap();
    let summary = transfer.import(second.id, &json).await.unwrap();
    assert_eq!(summary.shows, 1);
    assert_eq!(summary.watched_episodes, 2);

    let re_exported = transfer.export(second.id).await.unwrap();

    let pairs = |doc: &trackarr::services::ExportDocument| -> Vec<(i32, Option<String>)> {
        doc.shows
            .iter()
            .flat_map(|s| {
                s.watched_episodes
                    .iter()
                    .map(|m| (m.catalog_episode_id, m.watched_at.clone()))
            })
            .collect()
    };

    assert_eq!(pairs(&exported), pairs(&re_exported));
}

#[tokio::test]
async fn import_accepts_bare_id_lists_for_seeded_shows() {
    let store = test_store().await;
    store.upsert_show(&show(10, "Bare", "Running")).await.unwrap();
    store
        .upsert_episodes(&[episode(101, 10, 1, 1, Some("2024-01-01"))])
        .await
        .unwrap();

    let transfer = TransferService::new(store.clone(), offline_client());

    let summary = transfer.import(1, "[10]").await.unwrap();
    assert_eq!(summary.shows, 1);
    assert_eq!(summary.watched_episodes, 0);
    assert!(store.get_link(1, 10).await.unwrap().is_some());

    // Newline-delimited form is equivalent; re-linking is idempotent.
    let summary = transfer.import(1, "10\n").await.unwrap();
    assert_eq!(summary.shows, 1);
}

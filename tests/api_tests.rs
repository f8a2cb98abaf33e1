//! HTTP-level tests for the wire contract: auth, categorized listing,
//! detail, watch toggles, status override, and export/import.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;
use trackarr::config::Config;
use trackarr::models::episode::Episode;
use trackarr::models::show::Show;

async fn spawn_app() -> (Arc<trackarr::api::AppState>, Router) {
    let db_path = std::env::temp_dir().join(format!("trackarr-api-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());

    let state = trackarr::api::create_app_state_from_config(config, None)
        .await
        .expect("failed to create app state");
    let router = trackarr::api::router(state.clone());
    (state, router)
}

fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Log in as the seeded admin user and return the session cookie.
async fn login(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            None,
            serde_json::json!({"username": "admin", "password": "password"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("login should set a session cookie")
        .to_str()
        .unwrap();
    cookie.split(';').next().unwrap().to_string()
}

/// Activate the seeded "Default" profile (id 1) for the session.
async fn activate_default_profile(app: &Router, cookie: &str) {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/profiles/1/activate",
            Some(cookie),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

fn seeded_show() -> Show {
    Show {
        id: 100,
        name: "Dark".to_string(),
        summary: Some("<p>Time travel.</p>".to_string()),
        status: "Running".to_string(),
        premiered: Some("2024-01-01".to_string()),
        ended: None,
        image_medium: None,
        image_original: None,
    }
}

fn seeded_episodes() -> Vec<Episode> {
    let episode = |id, season, number, airdate: Option<&str>, airtime: Option<&str>| Episode {
        id,
        show_id: 100,
        season,
        number,
        name: format!("S{season}E{number}"),
        summary: None,
        airdate: airdate.map(String::from),
        airtime: airtime.map(String::from),
        runtime: Some(60),
    };

    vec![
        episode(1, 1, 1, Some("2024-01-01"), Some("21:00")),
        episode(2, 1, 2, Some("2024-01-08"), Some("21:00")),
        episode(3, 2, 1, Some("2099-06-01"), Some("TBD")),
        episode(4, 0, 1, None, None),
    ]
}

async fn seed_linked_show(state: &trackarr::api::AppState) {
    state.store().upsert_show(&seeded_show()).await.unwrap();
    state
        .store()
        .upsert_episodes(&seeded_episodes())
        .await
        .unwrap();
    state.store().add_link(1, 100, None).await.unwrap();
}

#[tokio::test]
async fn endpoints_require_a_session() {
    let (_state, app) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(get_request("/shows", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            None,
            serde_json::json!({"username": "admin", "password": "wrong"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn listing_requires_an_active_profile() {
    let (_state, app) = spawn_app().await;
    let cookie = login(&app).await;

    let response = app
        .clone()
        .oneshot(get_request("/shows", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn listing_buckets_follow_watch_mutations() {
    let (state, app) = spawn_app().await;
    let cookie = login(&app).await;
    activate_default_profile(&app, &cookie).await;
    seed_linked_show(&state).await;

    let bucket_of = |body: &serde_json::Value, id: &str| -> usize {
        body["categories"]
            .as_array()
            .unwrap()
            .iter()
            .find(|c| c["id"] == id)
            .unwrap()["shows"]
            .as_array()
            .unwrap()
            .len()
    };

    // Fresh subscription with aired episodes: queued.
    let response = app
        .clone()
        .oneshot(get_request("/shows?as_of=2024-06-01", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    let ids: Vec<&str> = body["categories"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(
        ids,
        vec!["watch-next", "watching", "queued", "up-to-date", "completed", "stopped"]
    );
    assert_eq!(bucket_of(&body, "queued"), 1);

    // One of two released season-1 episodes watched: watching.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/episodes/1/watch",
            Some(&cookie),
            serde_json::json!({"watched": true}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["ok"], true);

    let response = app
        .clone()
        .oneshot(get_request("/shows?as_of=2024-06-01", Some(&cookie)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(bucket_of(&body, "watching"), 1);

    // Everything released watched on a running show: up to date.
    app.clone()
        .oneshot(json_request(
            "POST",
            "/episodes/2/watch",
            Some(&cookie),
            serde_json::json!({"watched": true}),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(get_request("/shows?as_of=2024-06-01", Some(&cookie)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(bucket_of(&body, "up-to-date"), 1);

    let show = &body["categories"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["id"] == "up-to-date")
        .unwrap()["shows"][0];
    assert_eq!(show["stats"]["watched"], 2);
    assert_eq!(show["stats"]["hasFuture"], true);
    // Next is the undated special: it sorts before the dated future episode.
    assert_eq!(show["nextEpisode"]["id"], 4);
}

#[tokio::test]
async fn detail_groups_seasons_and_labels_missing_dates() {
    let (state, app) = spawn_app().await;
    let cookie = login(&app).await;
    activate_default_profile(&app, &cookie).await;
    seed_linked_show(&state).await;

    app.clone()
        .oneshot(json_request(
            "POST",
            "/shows/100/seasons/1/watch",
            Some(&cookie),
            serde_json::json!({"watched": true}),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(get_request("/shows/100?as_of=2024-06-01", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    assert_eq!(body["show"]["id"], 100);
    assert_eq!(body["show"]["state"], "up-to-date");

    let seasons = body["seasons"].as_array().unwrap();
    assert_eq!(seasons.len(), 3); // specials (0), season 1, season 2

    let season_one = seasons.iter().find(|s| s["season"] == 1).unwrap();
    assert_eq!(season_one["watchedCount"], 2);
    assert_eq!(season_one["totalCount"], 2);
    assert_eq!(season_one["watched"], true);

    let specials = seasons.iter().find(|s| s["season"] == 0).unwrap();
    assert_eq!(specials["episodes"][0]["airdate"], "TBD");

    // Unknown show: not linked to the profile.
    let response = app
        .clone()
        .oneshot(get_request("/shows/999?as_of=2024-06-01", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn season_toggle_is_atomic_per_call() {
    let (state, app) = spawn_app().await;
    let cookie = login(&app).await;
    activate_default_profile(&app, &cookie).await;
    seed_linked_show(&state).await;

    app.clone()
        .oneshot(json_request(
            "POST",
            "/shows/100/seasons/1/watch",
            Some(&cookie),
            serde_json::json!({"watched": true}),
        ))
        .await
        .unwrap();

    let marks = state
        .store()
        .watch_marks_for_episodes(1, &[1, 2])
        .await
        .unwrap();
    assert_eq!(marks.len(), 2);
    assert_eq!(marks[0].watched_at, marks[1].watched_at);

    // Toggling a season on an unlinked show is a 404.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/shows/999/seasons/1/watch",
            Some(&cookie),
            serde_json::json!({"watched": true}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_episode_toggle_is_not_found() {
    let (state, app) = spawn_app().await;
    let cookie = login(&app).await;
    activate_default_profile(&app, &cookie).await;
    seed_linked_show(&state).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/episodes/999/watch",
            Some(&cookie),
            serde_json::json!({"watched": true}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn status_override_gates_removal() {
    let (state, app) = spawn_app().await;
    let cookie = login(&app).await;
    activate_default_profile(&app, &cookie).await;
    seed_linked_show(&state).await;

    // Invalid enum value.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/shows/100/status",
            Some(&cookie),
            serde_json::json!({"status": "paused"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Removal before stopping is rejected.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/shows/100")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Stop, verify the bucket, then removal goes through.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/shows/100/status",
            Some(&cookie),
            serde_json::json!({"status": "stopped"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get_request("/shows?as_of=2024-06-01", Some(&cookie)))
        .await
        .unwrap();
    let body = body_json(response).await;
    let stopped = body["categories"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["id"] == "stopped")
        .unwrap();
    assert_eq!(stopped["shows"].as_array().unwrap().len(), 1);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/shows/100")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert!(state.store().get_link(1, 100).await.unwrap().is_none());
}

#[tokio::test]
async fn calendar_excludes_tbd_airtimes() {
    let (state, app) = spawn_app().await;
    let cookie = login(&app).await;
    activate_default_profile(&app, &cookie).await;
    seed_linked_show(&state).await;

    let response = app
        .clone()
        .oneshot(get_request(
            "/calendar?start=2024-01-01&end=2099-12-31",
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    let events = body.as_array().unwrap();
    // Episode 3 is dated but its airtime is literally "TBD"; episode 4 has
    // no airdate. Both stay out of the calendar, for different reasons.
    let ids: Vec<i64> = events
        .iter()
        .map(|e| e["episodeId"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2]);
}

#[tokio::test]
async fn export_import_round_trip_over_http() {
    let (state, app) = spawn_app().await;
    let cookie = login(&app).await;
    activate_default_profile(&app, &cookie).await;
    seed_linked_show(&state).await;

    app.clone()
        .oneshot(json_request(
            "POST",
            "/episodes/1/watch",
            Some(&cookie),
            serde_json::json!({"watched": true}),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(get_request("/export", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let exported = body_json(response).await;
    assert_eq!(exported["version"], 1);
    assert_eq!(exported["shows"][0]["catalogShowId"], 100);

    // Fresh profile, same account.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/profiles",
            Some(&cookie),
            serde_json::json!({"name": "Second"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let profile = body_json(response).await;
    let second_id = profile["id"].as_i64().unwrap();

    app.clone()
        .oneshot(json_request(
            "POST",
            &format!("/profiles/{second_id}/activate"),
            Some(&cookie),
            serde_json::json!({}),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/import")
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(exported.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get_request("/export", Some(&cookie)))
        .await
        .unwrap();
    let re_exported = body_json(response).await;

    assert_eq!(
        exported["shows"][0]["watchedEpisodes"],
        re_exported["shows"][0]["watchedEpisodes"]
    );

    // Malformed import payloads are rejected.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/import")
                .header(header::COOKIE, &cookie)
                .body(Body::from("definitely not an import"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn api_key_auth_works_without_a_session() {
    let (state, app) = spawn_app().await;

    let api_key = state
        .store()
        .get_user_api_key("admin")
        .await
        .unwrap()
        .unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/system/status")
                .header("X-Api-Key", &api_key)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["profiles"], 1);
}

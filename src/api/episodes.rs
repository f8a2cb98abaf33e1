use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::active_profile_id;
use super::types::{OkResponse, WatchRequest};
use super::{ApiError, AppState};

/// POST /episodes/{id}/watch — mark or unmark one episode.
pub async fn toggle_episode(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<i32>,
    Json(payload): Json<WatchRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    let profile_id = active_profile_id(&session).await?;

    state
        .watching()
        .toggle_episode(profile_id, id, payload.watched)
        .await?;

    Ok(Json(OkResponse::new()))
}

/// POST /shows/{id}/seasons/{season}/watch — toggle a whole season as one
/// atomic unit.
pub async fn toggle_season(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path((id, season)): Path<(i32, i32)>,
    Json(payload): Json<WatchRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    let profile_id = active_profile_id(&session).await?;

    state
        .watching()
        .toggle_season(profile_id, id, season, payload.watched)
        .await?;

    Ok(Json(OkResponse::new()))
}

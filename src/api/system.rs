use axum::{Json, extract::State};
use std::sync::Arc;

use super::types::SystemStatusDto;
use super::{ApiError, AppState};

/// GET /system/status
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SystemStatusDto>, ApiError> {
    let shows = state.store().count_shows().await.map_err(ApiError::from)?;
    let episodes = state
        .store()
        .count_episodes()
        .await
        .map_err(ApiError::from)?;
    let profiles = state
        .store()
        .count_profiles()
        .await
        .map_err(ApiError::from)?;

    Ok(Json(SystemStatusDto {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: state.start_time.elapsed().as_secs(),
        shows,
        episodes,
        profiles,
    }))
}

use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::{PROFILE_KEY, session_username};
use super::types::{CreateProfileRequest, OkResponse, ProfileDto};
use super::{ApiError, AppState};

async fn session_user_id(state: &AppState, session: &Session) -> Result<i32, ApiError> {
    let username = session_username(session).await?;
    let user = state
        .store()
        .get_user_by_username(&username)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))?;
    Ok(user.id)
}

/// GET /profiles — the session user's viewer profiles.
pub async fn list_profiles(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<Vec<ProfileDto>>, ApiError> {
    let user_id = session_user_id(&state, &session).await?;

    let profiles = state
        .store()
        .list_profiles_for_user(user_id)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(
        profiles
            .into_iter()
            .map(|p| ProfileDto {
                id: p.id,
                name: p.name,
                created_at: p.created_at,
            })
            .collect(),
    ))
}

/// POST /profiles — create a viewer profile.
pub async fn create_profile(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<CreateProfileRequest>,
) -> Result<Json<ProfileDto>, ApiError> {
    let user_id = session_user_id(&state, &session).await?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("Profile name is required"));
    }

    let profile = state
        .store()
        .create_profile(user_id, name)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(ProfileDto {
        id: profile.id,
        name: profile.name,
        created_at: profile.created_at,
    }))
}

/// POST /profiles/{id}/activate — make this the session's active profile.
pub async fn activate_profile(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Json<OkResponse>, ApiError> {
    let user_id = session_user_id(&state, &session).await?;

    let profile = state
        .store()
        .get_profile(id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::NotFound(format!("Profile {id} not found")))?;

    if profile.user_id != user_id {
        return Err(ApiError::NotFound(format!("Profile {id} not found")));
    }

    session
        .insert(PROFILE_KEY, profile.id)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?;

    Ok(Json(OkResponse::new()))
}

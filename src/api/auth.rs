use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, AppState};

/// Session key holding the authenticated username.
pub const USER_KEY: &str = "user";
/// Session key holding the active viewer profile id.
pub const PROFILE_KEY: &str = "profile";

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub username: String,
    pub api_key: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Authentication middleware that checks:
/// 1. Session cookie (from login)
/// 2. `X-Api-Key` header
/// 3. `Authorization: Bearer <api_key>` header
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    request: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    if let Ok(Some(user)) = session.get::<String>(USER_KEY).await {
        tracing::Span::current().record("user_id", &user);
        return Ok(next.run(request).await);
    }

    if let Some(key) = extract_api_key(&headers)
        && let Ok(Some(user)) = state.store().verify_api_key(&key).await
    {
        tracing::Span::current().record("user_id", &user.username);
        return Ok(next.run(request).await);
    }

    Ok((StatusCode::UNAUTHORIZED, "Unauthorized").into_response())
}

fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    if let Some(api_key) = headers.get("X-Api-Key")
        && let Ok(key_str) = api_key.to_str()
    {
        return Some(key_str.to_string());
    }

    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    None
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/login
/// Authenticate with username and password, returns API key on success
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if payload.username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let is_valid = state
        .store()
        .verify_user_password(&payload.username, &payload.password)
        .await
        .map_err(|e| ApiError::internal(format!("Authentication error: {e}")))?;

    if !is_valid {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    let user = state
        .store()
        .get_user_by_username(&payload.username)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to get user: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))?;

    if let Err(e) = session.insert(USER_KEY, &payload.username).await {
        return Err(ApiError::internal(format!("Failed to create session: {e}")));
    }

    Ok(Json(LoginResponse {
        username: user.username,
        api_key: user.api_key,
    }))
}

/// POST /auth/logout
/// Invalidate the current session
pub async fn logout(session: Session) -> impl IntoResponse {
    let _ = session.flush().await;
    (StatusCode::OK, "Logged out")
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyResponse {
    pub api_key: String,
}

/// POST /auth/api-key/regenerate
/// Generate a new random API key
pub async fn regenerate_api_key(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiKeyResponse>, ApiError> {
    let username = session_username(&session).await?;

    let new_api_key = state
        .store()
        .regenerate_user_api_key(&username)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to regenerate API key: {e}")))?;

    tracing::info!("API key regenerated for user: {username}");

    Ok(Json(ApiKeyResponse {
        api_key: new_api_key,
    }))
}

// ============================================================================
// Helpers
// ============================================================================

/// Get the active profile id from the session. Every profile-scoped endpoint
/// requires one; its absence is a 400, not a 401.
pub async fn active_profile_id(session: &Session) -> Result<i32, ApiError> {
    session
        .get::<i32>(PROFILE_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?
        .ok_or_else(|| ApiError::validation("No active profile selected"))
}

/// Get username from session, returns error if not authenticated
pub async fn session_username(session: &Session) -> Result<String, ApiError> {
    session
        .get::<String>(USER_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))
}

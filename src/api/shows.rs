use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::active_profile_id;
use super::types::{
    AddShowRequest, CategoriesResponse, OkResponse, SearchResultDto, ShowDetailResponse,
    StatusOverrideRequest, categories_response,
};
use super::{ApiError, AppState, parse_as_of};
use crate::watch::STOPPED_OVERRIDE;

#[derive(Debug, Deserialize)]
pub struct AsOfQuery {
    pub as_of: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

/// GET /shows — the categorized listing.
pub async fn list_shows(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(query): Query<AsOfQuery>,
) -> Result<Json<CategoriesResponse>, ApiError> {
    let profile_id = active_profile_id(&session).await?;
    let as_of = parse_as_of(query.as_of.as_deref())?;

    let buckets = state.shows().categorized(profile_id, as_of).await?;
    Ok(Json(categories_response(buckets)))
}

/// GET /shows/{id} — season-grouped detail for one linked show.
pub async fn show_detail(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<i32>,
    Query(query): Query<AsOfQuery>,
) -> Result<Json<ShowDetailResponse>, ApiError> {
    let profile_id = active_profile_id(&session).await?;
    let as_of = parse_as_of(query.as_of.as_deref())?;

    let detail = state.shows().detail(profile_id, id, as_of).await?;
    Ok(Json(ShowDetailResponse::from(detail)))
}

/// POST /shows — subscribe the active profile to a catalog show.
pub async fn add_show(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<AddShowRequest>,
) -> Result<Json<SearchResultDto>, ApiError> {
    let profile_id = active_profile_id(&session).await?;

    let show = state.shows().add(profile_id, payload.catalog_show_id).await?;
    Ok(Json(SearchResultDto::from_show(show, true)))
}

/// GET /shows/search?q= — catalog search, flagged with what is already added.
pub async fn search_shows(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<SearchResultDto>>, ApiError> {
    let profile_id = active_profile_id(&session).await?;

    if query.q.trim().is_empty() {
        return Err(ApiError::validation("Search query is required"));
    }

    let results = state.shows().search(&query.q).await?;

    let mut dtos = Vec::with_capacity(results.len());
    for show in results {
        let added = state
            .store()
            .get_link(profile_id, show.id)
            .await
            .map_err(ApiError::from)?
            .is_some();
        dtos.push(SearchResultDto::from_show(show, added));
    }

    Ok(Json(dtos))
}

/// POST /shows/{id}/status — set or clear the profile-level override.
pub async fn set_status_override(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<i32>,
    Json(payload): Json<StatusOverrideRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    let profile_id = active_profile_id(&session).await?;

    state
        .shows()
        .set_status_override(profile_id, id, payload.status.as_deref())
        .await?;

    Ok(Json(OkResponse::new()))
}

/// DELETE /shows/{id} — unsubscribe. Guard: only stopped shows may be
/// removed, so a mistap can't wipe an actively tracked show's marks.
pub async fn remove_show(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Json<OkResponse>, ApiError> {
    let profile_id = active_profile_id(&session).await?;

    let link = state
        .store()
        .get_link(profile_id, id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::show_not_found(id))?;

    if link.status_override.as_deref() != Some(STOPPED_OVERRIDE) {
        return Err(ApiError::validation(
            "Show must be stopped before it can be removed",
        ));
    }

    state.shows().remove(profile_id, id).await?;
    Ok(Json(OkResponse::new()))
}

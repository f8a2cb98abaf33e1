use std::collections::{HashMap, HashSet};

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::active_profile_id;
use super::types::CalendarEventDto;
use super::{ApiError, AppState};

/// Air-time sentinel the catalog uses for slots it has not scheduled yet.
/// This filter is over the airtime *text*, independent of whether the
/// airdate is known.
const TBD_AIRTIME: &str = "TBD";

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub start: String,
    pub end: String,
}

/// GET /calendar?start=&end= — dated episodes of the active profile's shows
/// inside the window.
pub async fn get_calendar(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<Vec<CalendarEventDto>>, ApiError> {
    let profile_id = active_profile_id(&session).await?;

    for value in [&query.start, &query.end] {
        if chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err() {
            return Err(ApiError::validation(format!(
                "Invalid calendar date '{value}', expected YYYY-MM-DD"
            )));
        }
    }

    let links = state
        .store()
        .links_for_profile(profile_id)
        .await
        .map_err(ApiError::from)?;
    let show_ids: Vec<i32> = links.iter().map(|l| l.show_id).collect();

    let episodes = state
        .store()
        .episodes_in_window(&show_ids, &query.start, &query.end)
        .await
        .map_err(ApiError::from)?;

    let shows = state
        .store()
        .get_shows_by_ids(&show_ids)
        .await
        .map_err(ApiError::from)?;
    let show_names: HashMap<i32, String> = shows.into_iter().map(|s| (s.id, s.name)).collect();

    let episode_ids: Vec<i32> = episodes.iter().map(|e| e.id).collect();
    let watched: HashSet<i32> = state
        .store()
        .watch_marks_for_episodes(profile_id, &episode_ids)
        .await
        .map_err(ApiError::from)?
        .into_iter()
        .map(|m| m.episode_id)
        .collect();

    let events: Vec<CalendarEventDto> = episodes
        .into_iter()
        .filter(|e| e.airtime.as_deref() != Some(TBD_AIRTIME))
        .map(|e| CalendarEventDto {
            episode_id: e.id,
            show_id: e.show_id,
            show_name: show_names.get(&e.show_id).cloned().unwrap_or_default(),
            season: e.season,
            number: e.number,
            name: e.name,
            airdate: e.airdate.unwrap_or_default(),
            airtime: e.airtime,
            watched: watched.contains(&e.id),
        })
        .collect();

    Ok(Json(events))
}

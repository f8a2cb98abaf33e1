use serde::{Deserialize, Serialize};

use crate::models::show::Show;
use crate::services::{EpisodeView, SeasonView, ShowDetail, TrackedShow};
use crate::watch::{Bucket, EpisodeFacts, WatchState, WatchStats};

/// Shown for an episode whose air date the catalog does not know yet.
pub const TBD_DATE_LABEL: &str = "TBD";

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    #[must_use]
    pub const fn new() -> Self {
        Self { ok: true }
    }
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<CategoryDto>,
}

#[derive(Debug, Serialize)]
pub struct CategoryDto {
    pub id: WatchState,
    pub label: &'static str,
    pub shows: Vec<ShowCardDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowCardDto {
    pub id: i32,
    pub name: String,
    pub status: String,
    pub state: WatchState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub stats: WatchStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_episode: Option<NextEpisodeDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextEpisodeDto {
    pub id: i32,
    pub season: i32,
    pub number: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub airdate: Option<String>,
}

impl From<EpisodeFacts> for NextEpisodeDto {
    fn from(facts: EpisodeFacts) -> Self {
        Self {
            id: facts.id,
            season: facts.season,
            number: facts.number,
            airdate: facts.airdate,
        }
    }
}

impl From<TrackedShow> for ShowCardDto {
    fn from(tracked: TrackedShow) -> Self {
        Self {
            id: tracked.show.id,
            name: tracked.show.name,
            status: tracked.show.status,
            state: tracked.derivation.state,
            image: tracked.show.image_medium,
            stats: tracked.derivation.stats,
            next_episode: tracked.derivation.next_episode.map(NextEpisodeDto::from),
        }
    }
}

#[must_use]
pub fn categories_response(buckets: Vec<Bucket<TrackedShow>>) -> CategoriesResponse {
    CategoriesResponse {
        categories: buckets
            .into_iter()
            .map(|b| CategoryDto {
                id: b.state,
                label: b.label,
                shows: b.shows.into_iter().map(ShowCardDto::from).collect(),
            })
            .collect(),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowDetailResponse {
    pub show: ShowDto,
    pub seasons: Vec<SeasonDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowDto {
    pub id: i32,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub premiered: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub status_override: Option<String>,
    pub state: WatchState,
    pub stats: WatchStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_episode: Option<NextEpisodeDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonDto {
    pub season: i32,
    pub episodes: Vec<EpisodeDto>,
    pub watched_count: usize,
    pub total_count: usize,
    pub watched: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeDto {
    pub id: i32,
    pub season: i32,
    pub number: i32,
    pub name: String,
    /// Calendar date, or "TBD" when the catalog has none yet.
    pub airdate: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub airtime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<i32>,
    pub watched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watched_at: Option<String>,
}

impl From<EpisodeView> for EpisodeDto {
    fn from(view: EpisodeView) -> Self {
        Self {
            id: view.episode.id,
            season: view.episode.season,
            number: view.episode.number,
            name: view.episode.name,
            airdate: view
                .episode
                .airdate
                .unwrap_or_else(|| TBD_DATE_LABEL.to_string()),
            airtime: view.episode.airtime,
            runtime: view.episode.runtime,
            watched: view.watched,
            watched_at: view.watched_at,
        }
    }
}

impl From<SeasonView> for SeasonDto {
    fn from(view: SeasonView) -> Self {
        Self {
            season: view.season,
            watched_count: view.watched_count,
            total_count: view.total_count,
            watched: view.watched,
            episodes: view.episodes.into_iter().map(EpisodeDto::from).collect(),
        }
    }
}

impl From<ShowDetail> for ShowDetailResponse {
    fn from(detail: ShowDetail) -> Self {
        Self {
            show: ShowDto {
                id: detail.show.id,
                name: detail.show.name,
                summary: detail.show.summary,
                status: detail.show.status,
                premiered: detail.show.premiered,
                ended: detail.show.ended,
                image: detail.show.image_original.or(detail.show.image_medium),
                status_override: detail.status_override,
                state: detail.derivation.state,
                stats: detail.derivation.stats,
                next_episode: detail.derivation.next_episode.map(NextEpisodeDto::from),
            },
            seasons: detail.seasons.into_iter().map(SeasonDto::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WatchRequest {
    pub watched: bool,
}

#[derive(Debug, Deserialize)]
pub struct StatusOverrideRequest {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddShowRequest {
    pub catalog_show_id: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultDto {
    pub id: i32,
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub premiered: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub added: bool,
}

impl SearchResultDto {
    #[must_use]
    pub fn from_show(show: Show, added: bool) -> Self {
        Self {
            id: show.id,
            name: show.name,
            status: show.status,
            premiered: show.premiered,
            image: show.image_medium,
            added,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDto {
    pub id: i32,
    pub name: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateProfileRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEventDto {
    pub episode_id: i32,
    pub show_id: i32,
    pub show_name: String,
    pub season: i32,
    pub number: i32,
    pub name: String,
    pub airdate: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub airtime: Option<String>,
    pub watched: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatusDto {
    pub version: String,
    pub uptime: u64,
    pub shows: u64,
    pub episodes: u64,
    pub profiles: u64,
}

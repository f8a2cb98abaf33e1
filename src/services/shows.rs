use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;

use crate::clients::tvmaze::TvMazeClient;
use crate::db::Store;
use crate::models::episode::Episode;
use crate::models::show::Show;
use crate::services::error::{ServiceError, ServiceResult};
use crate::watch::{self, Bucket, Derivation, EpisodeFacts, STOPPED_OVERRIDE};

/// One linked show with its derived state, ready for bucketing.
#[derive(Debug, Clone)]
pub struct TrackedShow {
    pub show: Show,
    pub status_override: Option<String>,
    pub added_at: String,
    pub derivation: Derivation,
}

#[derive(Debug, Clone)]
pub struct EpisodeView {
    pub episode: Episode,
    pub watched: bool,
    pub watched_at: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SeasonView {
    pub season: i32,
    pub episodes: Vec<EpisodeView>,
    pub watched_count: usize,
    pub total_count: usize,
    /// True when every episode of the season is watched; drives the
    /// season-level toggle.
    pub watched: bool,
}

#[derive(Debug, Clone)]
pub struct ShowDetail {
    pub show: Show,
    pub status_override: Option<String>,
    pub seasons: Vec<SeasonView>,
    pub derivation: Derivation,
}

/// Read-side assembly plus the link-level mutations. State is recomputed
/// from raw rows on every call; nothing derived is ever persisted.
#[derive(Clone)]
pub struct ShowService {
    store: Store,
    tvmaze: Arc<TvMazeClient>,
}

impl ShowService {
    #[must_use]
    pub const fn new(store: Store, tvmaze: Arc<TvMazeClient>) -> Self {
        Self { store, tvmaze }
    }

    /// Derive state for every linked show and bucket the results.
    pub async fn categorized(
        &self,
        profile_id: i32,
        as_of: NaiveDate,
    ) -> ServiceResult<Vec<Bucket<TrackedShow>>> {
        let links = self.store.links_for_profile(profile_id).await?;
        let show_ids: Vec<i32> = links.iter().map(|l| l.show_id).collect();

        let shows = self.store.get_shows_by_ids(&show_ids).await?;
        let episodes = self.store.episodes_for_shows(&show_ids).await?;
        let watched = self.store.watched_ids_by_show(profile_id, &show_ids).await?;

        let mut episodes_by_show: HashMap<i32, Vec<Episode>> = HashMap::new();
        for episode in episodes {
            episodes_by_show
                .entry(episode.show_id)
                .or_default()
                .push(episode);
        }

        let shows_by_id: HashMap<i32, Show> = shows.into_iter().map(|s| (s.id, s)).collect();
        let empty = HashSet::new();

        let mut tracked = Vec::with_capacity(links.len());
        for link in links {
            let Some(show) = shows_by_id.get(&link.show_id) else {
                continue;
            };
            let watched_ids = watched.get(&link.show_id).unwrap_or(&empty);
            let facts: Vec<EpisodeFacts> = episodes_by_show
                .get(&link.show_id)
                .map(|eps| {
                    eps.iter()
                        .map(|e| e.facts(watched_ids.contains(&e.id)))
                        .collect()
                })
                .unwrap_or_default();

            let derivation = watch::derive(
                &show.status,
                link.status_override.as_deref(),
                &facts,
                as_of,
            );

            tracked.push(TrackedShow {
                show: show.clone(),
                status_override: link.status_override,
                added_at: link.added_at,
                derivation,
            });
        }

        Ok(watch::categorize(
            tracked,
            |t| t.derivation.state,
            |t| t.show.name.as_str(),
        ))
    }

    /// Detail view for one linked show: episodes grouped by season with
    /// per-season watched counts.
    pub async fn detail(
        &self,
        profile_id: i32,
        show_id: i32,
        as_of: NaiveDate,
    ) -> ServiceResult<ShowDetail> {
        let link = self
            .store
            .get_link(profile_id, show_id)
            .await?
            .ok_or_else(|| {
                ServiceError::not_found(format!("Show {show_id} is not linked to this profile"))
            })?;

        let show = self
            .store
            .get_show(show_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Show {show_id} not found")))?;

        let episodes = self.store.episodes_for_show(show_id).await?;
        let episode_ids: Vec<i32> = episodes.iter().map(|e| e.id).collect();
        let marks: HashMap<i32, String> = self
            .store
            .watch_marks_for_episodes(profile_id, &episode_ids)
            .await?
            .into_iter()
            .map(|m| (m.episode_id, m.watched_at))
            .collect();

        let facts: Vec<EpisodeFacts> = episodes
            .iter()
            .map(|e| e.facts(marks.contains_key(&e.id)))
            .collect();
        let derivation = watch::derive(
            &show.status,
            link.status_override.as_deref(),
            &facts,
            as_of,
        );

        // Episodes arrive ordered by (season, number); the BTreeMap keeps
        // season order, the inner vecs keep episode order.
        let mut by_season: std::collections::BTreeMap<i32, Vec<EpisodeView>> =
            std::collections::BTreeMap::new();
        for episode in episodes {
            let watched_at = marks.get(&episode.id).cloned();
            let season = episode.season;
            by_season.entry(season).or_default().push(EpisodeView {
                watched: watched_at.is_some(),
                watched_at,
                episode,
            });
        }

        let seasons: Vec<SeasonView> = by_season
            .into_iter()
            .map(|(season, episodes)| {
                let total_count = episodes.len();
                let watched_count = episodes.iter().filter(|e| e.watched).count();
                SeasonView {
                    season,
                    watched_count,
                    total_count,
                    watched: total_count > 0 && watched_count == total_count,
                    episodes,
                }
            })
            .collect();

        Ok(ShowDetail {
            show,
            status_override: link.status_override,
            seasons,
            derivation,
        })
    }

    /// Subscribe the profile to a show, fetching it from the catalog on
    /// first sight. The catalog upsert is idempotent by external id.
    pub async fn add(&self, profile_id: i32, catalog_show_id: i32) -> ServiceResult<Show> {
        let show = match self.store.get_show(catalog_show_id).await? {
            Some(show) => show,
            None => {
                let (show, episodes) = self
                    .tvmaze
                    .get_show_with_episodes(catalog_show_id)
                    .await
                    .map_err(|e| ServiceError::catalog(e.to_string()))?
                    .ok_or_else(|| {
                        ServiceError::not_found(format!(
                            "Show {catalog_show_id} not found in catalog"
                        ))
                    })?;

                self.store.upsert_show(&show).await?;
                self.store.upsert_episodes(&episodes).await?;
                show
            }
        };

        self.store.add_link(profile_id, show.id, None).await?;
        Ok(show)
    }

    pub async fn search(&self, query: &str) -> ServiceResult<Vec<Show>> {
        self.tvmaze
            .search_shows(query)
            .await
            .map_err(|e| ServiceError::catalog(e.to_string()))
    }

    /// The only legal override values are none and "stopped".
    pub async fn set_status_override(
        &self,
        profile_id: i32,
        show_id: i32,
        value: Option<&str>,
    ) -> ServiceResult<()> {
        if let Some(v) = value
            && v != STOPPED_OVERRIDE
        {
            return Err(ServiceError::validation(format!(
                "Invalid status value '{v}'; expected null or \"{STOPPED_OVERRIDE}\""
            )));
        }

        let updated = self
            .store
            .set_status_override(profile_id, show_id, value)
            .await?;
        if !updated {
            return Err(ServiceError::not_found(format!(
                "Show {show_id} is not linked to this profile"
            )));
        }

        Ok(())
    }

    /// Drop the subscription and, atomically, every watch mark the profile
    /// holds for it. The stopped-first guard lives with the caller.
    pub async fn remove(&self, profile_id: i32, show_id: i32) -> ServiceResult<()> {
        let removed = self.store.remove_link(profile_id, show_id).await?;
        if !removed {
            return Err(ServiceError::not_found(format!(
                "Show {show_id} is not linked to this profile"
            )));
        }

        Ok(())
    }
}

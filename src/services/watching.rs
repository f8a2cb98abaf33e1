use crate::db::Store;
use crate::services::error::{ServiceError, ServiceResult};

/// Mutation operations over watch marks. Every mutation checks that the
/// episode's show is actually linked to the profile first, so marks can
/// never exist outside a subscription.
#[derive(Clone)]
pub struct WatchService {
    store: Store,
}

impl WatchService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Mark or unmark one episode. Idempotent in both directions: re-marking
    /// refreshes the timestamp on the same row, unmarking an unwatched
    /// episode is a no-op.
    pub async fn toggle_episode(
        &self,
        profile_id: i32,
        episode_id: i32,
        watched: bool,
    ) -> ServiceResult<()> {
        let episode = self
            .store
            .get_episode(episode_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Episode {episode_id} not found")))?;

        if self
            .store
            .get_link(profile_id, episode.show_id)
            .await?
            .is_none()
        {
            return Err(ServiceError::not_found(format!(
                "Episode {episode_id} is not in this profile's shows"
            )));
        }

        if watched {
            let now = chrono::Utc::now().to_rfc3339();
            self.store
                .upsert_watch_mark(profile_id, episode_id, &now)
                .await?;
        } else {
            self.store.delete_watch_mark(profile_id, episode_id).await?;
        }

        Ok(())
    }

    /// Bring every episode of a season to the target state as one atomic
    /// unit; marks written by a single call share one timestamp.
    pub async fn toggle_season(
        &self,
        profile_id: i32,
        show_id: i32,
        season: i32,
        watched: bool,
    ) -> ServiceResult<()> {
        if self.store.get_link(profile_id, show_id).await?.is_none() {
            return Err(ServiceError::not_found(format!(
                "Show {show_id} is not linked to this profile"
            )));
        }

        let episodes = self.store.episodes_for_season(show_id, season).await?;
        let episode_ids: Vec<i32> = episodes.iter().map(|e| e.id).collect();

        let now = chrono::Utc::now().to_rfc3339();
        self.store
            .set_watch_marks_bulk(profile_id, &episode_ids, watched, &now)
            .await?;

        Ok(())
    }
}

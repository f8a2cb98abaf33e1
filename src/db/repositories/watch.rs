use std::collections::{HashMap, HashSet};

use anyhow::Result;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::entities::{episodes, profile_shows, watch_marks};

/// A profile's subscription to a show.
#[derive(Debug, Clone)]
pub struct ShowLink {
    pub profile_id: i32,
    pub show_id: i32,
    pub status_override: Option<String>,
    pub added_at: String,
}

impl From<profile_shows::Model> for ShowLink {
    fn from(model: profile_shows::Model) -> Self {
        Self {
            profile_id: model.profile_id,
            show_id: model.show_id,
            status_override: model.status_override,
            added_at: model.added_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WatchMark {
    pub episode_id: i32,
    pub watched_at: String,
}

/// Repository for show links and watch marks. Bulk season writes and link
/// removal run inside one transaction so partial effects never land.
pub struct WatchRepository {
    conn: DatabaseConnection,
}

impl WatchRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    // ========================================================================
    // Show links
    // ========================================================================

    pub async fn get_link(&self, profile_id: i32, show_id: i32) -> Result<Option<ShowLink>> {
        let row = profile_shows::Entity::find_by_id((profile_id, show_id))
            .one(&self.conn)
            .await?;

        Ok(row.map(ShowLink::from))
    }

    pub async fn links_for_profile(&self, profile_id: i32) -> Result<Vec<ShowLink>> {
        let rows = profile_shows::Entity::find()
            .filter(profile_shows::Column::ProfileId.eq(profile_id))
            .order_by_asc(profile_shows::Column::ShowId)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(ShowLink::from).collect())
    }

    /// Create the subscription if absent; an existing link keeps its
    /// original `added_at`.
    pub async fn add_link(
        &self,
        profile_id: i32,
        show_id: i32,
        added_at: Option<String>,
    ) -> Result<ShowLink> {
        if let Some(existing) = self.get_link(profile_id, show_id).await? {
            return Ok(existing);
        }

        let added_at = added_at.unwrap_or_else(|| chrono::Utc::now().to_rfc3339());
        let active = profile_shows::ActiveModel {
            profile_id: Set(profile_id),
            show_id: Set(show_id),
            status_override: Set(None),
            added_at: Set(added_at.clone()),
        };
        profile_shows::Entity::insert(active).exec(&self.conn).await?;

        Ok(ShowLink {
            profile_id,
            show_id,
            status_override: None,
            added_at,
        })
    }

    /// Returns false when the link does not exist.
    pub async fn set_status_override(
        &self,
        profile_id: i32,
        show_id: i32,
        value: Option<&str>,
    ) -> Result<bool> {
        let Some(row) = profile_shows::Entity::find_by_id((profile_id, show_id))
            .one(&self.conn)
            .await?
        else {
            return Ok(false);
        };

        let mut active: profile_shows::ActiveModel = row.into();
        active.status_override = Set(value.map(String::from));
        sea_orm::ActiveModelTrait::update(active, &self.conn).await?;

        Ok(true)
    }

    /// Delete the link and every watch mark this profile holds for the
    /// show's episodes, as one unit.
    pub async fn remove_link(&self, profile_id: i32, show_id: i32) -> Result<bool> {
        let Some(link) = profile_shows::Entity::find_by_id((profile_id, show_id))
            .one(&self.conn)
            .await?
        else {
            return Ok(false);
        };

        let episode_ids: Vec<i32> = episodes::Entity::find()
            .filter(episodes::Column::ShowId.eq(show_id))
            .all(&self.conn)
            .await?
            .into_iter()
            .map(|e| e.id)
            .collect();

        let txn = self.conn.begin().await?;

        if !episode_ids.is_empty() {
            watch_marks::Entity::delete_many()
                .filter(watch_marks::Column::ProfileId.eq(profile_id))
                .filter(watch_marks::Column::EpisodeId.is_in(episode_ids))
                .exec(&txn)
                .await?;
        }

        profile_shows::Entity::delete_by_id((link.profile_id, link.show_id))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok(true)
    }

    // ========================================================================
    // Watch marks
    // ========================================================================

    /// Insert-or-refresh keyed by (profile, episode); repeated marks never
    /// create a second row.
    pub async fn upsert_mark(
        &self,
        profile_id: i32,
        episode_id: i32,
        watched_at: &str,
    ) -> Result<()> {
        let active = watch_marks::ActiveModel {
            profile_id: Set(profile_id),
            episode_id: Set(episode_id),
            watched_at: Set(watched_at.to_string()),
        };

        watch_marks::Entity::insert(active)
            .on_conflict(
                sea_orm::sea_query::OnConflict::columns([
                    watch_marks::Column::ProfileId,
                    watch_marks::Column::EpisodeId,
                ])
                .update_columns([watch_marks::Column::WatchedAt])
                .to_owned(),
            )
            .exec(&self.conn)
            .await?;

        Ok(())
    }

    /// No-op when the mark is already absent.
    pub async fn delete_mark(&self, profile_id: i32, episode_id: i32) -> Result<()> {
        watch_marks::Entity::delete_many()
            .filter(watch_marks::Column::ProfileId.eq(profile_id))
            .filter(watch_marks::Column::EpisodeId.eq(episode_id))
            .exec(&self.conn)
            .await?;

        Ok(())
    }

    /// Bring every listed episode to the target state in one transaction;
    /// all marks written by one call share `watched_at`.
    pub async fn set_marks_bulk(
        &self,
        profile_id: i32,
        episode_ids: &[i32],
        watched: bool,
        watched_at: &str,
    ) -> Result<()> {
        if episode_ids.is_empty() {
            return Ok(());
        }

        let txn = self.conn.begin().await?;

        if watched {
            for &episode_id in episode_ids {
                let active = watch_marks::ActiveModel {
                    profile_id: Set(profile_id),
                    episode_id: Set(episode_id),
                    watched_at: Set(watched_at.to_string()),
                };
                watch_marks::Entity::insert(active)
                    .on_conflict(
                        sea_orm::sea_query::OnConflict::columns([
                            watch_marks::Column::ProfileId,
                            watch_marks::Column::EpisodeId,
                        ])
                        .update_columns([watch_marks::Column::WatchedAt])
                        .to_owned(),
                    )
                    .exec(&txn)
                    .await?;
            }
        } else {
            watch_marks::Entity::delete_many()
                .filter(watch_marks::Column::ProfileId.eq(profile_id))
                .filter(watch_marks::Column::EpisodeId.is_in(episode_ids.iter().copied()))
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;
        Ok(())
    }

    pub async fn marks_for_episodes(
        &self,
        profile_id: i32,
        episode_ids: &[i32],
    ) -> Result<Vec<WatchMark>> {
        if episode_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = watch_marks::Entity::find()
            .filter(watch_marks::Column::ProfileId.eq(profile_id))
            .filter(watch_marks::Column::EpisodeId.is_in(episode_ids.iter().copied()))
            .order_by_asc(watch_marks::Column::EpisodeId)
            .all(&self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|m| WatchMark {
                episode_id: m.episode_id,
                watched_at: m.watched_at,
            })
            .collect())
    }

    /// Watched episode-id sets for many shows at once, keyed by show id.
    pub async fn watched_ids_by_show(
        &self,
        profile_id: i32,
        show_ids: &[i32],
    ) -> Result<HashMap<i32, HashSet<i32>>> {
        if show_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let episode_rows = episodes::Entity::find()
            .filter(episodes::Column::ShowId.is_in(show_ids.iter().copied()))
            .all(&self.conn)
            .await?;

        let show_of: HashMap<i32, i32> =
            episode_rows.iter().map(|e| (e.id, e.show_id)).collect();
        let episode_ids: Vec<i32> = episode_rows.iter().map(|e| e.id).collect();

        let mut result: HashMap<i32, HashSet<i32>> = HashMap::new();
        for mark in self.marks_for_episodes(profile_id, &episode_ids).await? {
            if let Some(&show_id) = show_of.get(&mark.episode_id) {
                result.entry(show_id).or_default().insert(mark.episode_id);
            }
        }

        Ok(result)
    }
}

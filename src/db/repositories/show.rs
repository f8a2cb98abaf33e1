use anyhow::Result;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::{episodes, shows};
use crate::models::episode::Episode;
use crate::models::show::Show;

/// Repository for catalog-owned show and episode rows. Writes are idempotent
/// upserts keyed by the external catalog id, so a refresh pass racing an add
/// for the same id converges to one row.
pub struct ShowRepository {
    conn: DatabaseConnection,
}

impl ShowRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn upsert(&self, show: &Show) -> Result<()> {
        let active = shows::ActiveModel {
            id: Set(show.id),
            name: Set(show.name.clone()),
            summary: Set(show.summary.clone()),
            status: Set(show.status.clone()),
            premiered: Set(show.premiered.clone()),
            ended: Set(show.ended.clone()),
            image_medium: Set(show.image_medium.clone()),
            image_original: Set(show.image_original.clone()),
            updated_at: Set(chrono::Utc::now().to_rfc3339()),
        };

        shows::Entity::insert(active)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(shows::Column::Id)
                    .update_columns([
                        shows::Column::Name,
                        shows::Column::Summary,
                        shows::Column::Status,
                        shows::Column::Premiered,
                        shows::Column::Ended,
                        shows::Column::ImageMedium,
                        shows::Column::ImageOriginal,
                        shows::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.conn)
            .await?;

        Ok(())
    }

    pub async fn upsert_episodes(&self, episodes_in: &[Episode]) -> Result<()> {
        if episodes_in.is_empty() {
            return Ok(());
        }

        let now = chrono::Utc::now().to_rfc3339();
        let active_models: Vec<episodes::ActiveModel> = episodes_in
            .iter()
            .map(|e| episodes::ActiveModel {
                id: Set(e.id),
                show_id: Set(e.show_id),
                season: Set(e.season),
                number: Set(e.number),
                name: Set(e.name.clone()),
                summary: Set(e.summary.clone()),
                airdate: Set(e.airdate.clone()),
                airtime: Set(e.airtime.clone()),
                runtime: Set(e.runtime),
                updated_at: Set(now.clone()),
            })
            .collect();

        episodes::Entity::insert_many(active_models)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(episodes::Column::Id)
                    .update_columns([
                        episodes::Column::ShowId,
                        episodes::Column::Season,
                        episodes::Column::Number,
                        episodes::Column::Name,
                        episodes::Column::Summary,
                        episodes::Column::Airdate,
                        episodes::Column::Airtime,
                        episodes::Column::Runtime,
                        episodes::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.conn)
            .await?;

        Ok(())
    }

    pub async fn get(&self, id: i32) -> Result<Option<Show>> {
        let row = shows::Entity::find_by_id(id).one(&self.conn).await?;
        Ok(row.map(Show::from))
    }

    pub async fn get_by_ids(&self, ids: &[i32]) -> Result<Vec<Show>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = shows::Entity::find()
            .filter(shows::Column::Id.is_in(ids.iter().copied()))
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(Show::from).collect())
    }

    /// Shows still worth refreshing: anything the catalog has not ended.
    pub async fn list_not_ended(&self) -> Result<Vec<Show>> {
        let rows = shows::Entity::find()
            .order_by_asc(shows::Column::Id)
            .all(&self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(Show::from)
            .filter(|s| !s.status.eq_ignore_ascii_case("ended"))
            .collect())
    }

    pub async fn get_episode(&self, id: i32) -> Result<Option<Episode>> {
        let row = episodes::Entity::find_by_id(id).one(&self.conn).await?;
        Ok(row.map(Episode::from))
    }

    pub async fn episodes_for_show(&self, show_id: i32) -> Result<Vec<Episode>> {
        let rows = episodes::Entity::find()
            .filter(episodes::Column::ShowId.eq(show_id))
            .order_by_asc(episodes::Column::Season)
            .order_by_asc(episodes::Column::Number)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(Episode::from).collect())
    }

    pub async fn episodes_for_shows(&self, show_ids: &[i32]) -> Result<Vec<Episode>> {
        if show_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = episodes::Entity::find()
            .filter(episodes::Column::ShowId.is_in(show_ids.iter().copied()))
            .order_by_asc(episodes::Column::ShowId)
            .order_by_asc(episodes::Column::Season)
            .order_by_asc(episodes::Column::Number)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(Episode::from).collect())
    }

    pub async fn episodes_for_season(&self, show_id: i32, season: i32) -> Result<Vec<Episode>> {
        let rows = episodes::Entity::find()
            .filter(episodes::Column::ShowId.eq(show_id))
            .filter(episodes::Column::Season.eq(season))
            .order_by_asc(episodes::Column::Number)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(Episode::from).collect())
    }

    /// Dated episodes inside `[start, end]` for the given shows. ISO date
    /// strings compare lexically in airdate order, so plain string bounds
    /// are correct here.
    pub async fn episodes_in_window(
        &self,
        show_ids: &[i32],
        start: &str,
        end: &str,
    ) -> Result<Vec<Episode>> {
        if show_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = episodes::Entity::find()
            .filter(episodes::Column::ShowId.is_in(show_ids.iter().copied()))
            .filter(episodes::Column::Airdate.is_not_null())
            .filter(episodes::Column::Airdate.gte(start))
            .filter(episodes::Column::Airdate.lte(end))
            .order_by_asc(episodes::Column::Airdate)
            .order_by_asc(episodes::Column::ShowId)
            .order_by_asc(episodes::Column::Number)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(Episode::from).collect())
    }

    pub async fn count_shows(&self) -> Result<u64> {
        Ok(shows::Entity::find().count(&self.conn).await?)
    }

    pub async fn count_episodes(&self) -> Result<u64> {
        Ok(episodes::Entity::find().count(&self.conn).await?)
    }
}

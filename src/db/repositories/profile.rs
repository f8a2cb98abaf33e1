use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::entities::profiles;

/// Viewer persona under one account.
#[derive(Debug, Clone)]
pub struct Profile {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub created_at: String,
}

impl From<profiles::Model> for Profile {
    fn from(model: profiles::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            created_at: model.created_at,
        }
    }
}

pub struct ProfileRepository {
    conn: DatabaseConnection,
}

impl ProfileRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: i32) -> Result<Option<Profile>> {
        let row = profiles::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query profile")?;

        Ok(row.map(Profile::from))
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<Profile>> {
        let row = profiles::Entity::find()
            .filter(profiles::Column::Name.eq(name))
            .one(&self.conn)
            .await
            .context("Failed to query profile by name")?;

        Ok(row.map(Profile::from))
    }

    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<Profile>> {
        let rows = profiles::Entity::find()
            .filter(profiles::Column::UserId.eq(user_id))
            .order_by_asc(profiles::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list profiles")?;

        Ok(rows.into_iter().map(Profile::from).collect())
    }

    pub async fn list_all(&self) -> Result<Vec<Profile>> {
        let rows = profiles::Entity::find()
            .order_by_asc(profiles::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list profiles")?;

        Ok(rows.into_iter().map(Profile::from).collect())
    }

    pub async fn create(&self, user_id: i32, name: &str) -> Result<Profile> {
        let active = profiles::ActiveModel {
            user_id: Set(user_id),
            name: Set(name.to_string()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to create profile")?;

        Ok(Profile::from(model))
    }

    pub async fn count(&self) -> Result<u64> {
        let count = profiles::Entity::find().count(&self.conn).await?;
        Ok(count)
    }
}

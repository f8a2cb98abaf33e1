use anyhow::{Context, Result};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordVerifier},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tokio::task;

use crate::entities::users;

/// User data returned from repository (without sensitive password hash)
#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub api_key: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            api_key: model.api_key,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        Ok(user.map(User::from))
    }

    /// Verify password for a user
    /// Note: This uses `spawn_blocking` because Argon2 hashing is CPU-intensive
    /// and would block the async runtime if run directly.
    pub async fn verify_password(&self, username: &str, password: &str) -> Result<bool> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(user) = user else {
            return Ok(false);
        };

        let password_hash = user.password_hash;
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            let argon2 = Argon2::default();
            Ok::<bool, anyhow::Error>(
                argon2
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid)
    }

    /// Verify API key and return the associated user
    pub async fn verify_api_key(&self, api_key: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::ApiKey.eq(api_key))
            .one(&self.conn)
            .await
            .context("Failed to query user by API key")?;

        Ok(user.map(User::from))
    }

    pub async fn get_api_key(&self, username: &str) -> Result<Option<String>> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user for API key")?;

        Ok(user.map(|u| u.api_key))
    }

    /// Regenerate API key for a user
    pub async fn regenerate_api_key(&self, username: &str) -> Result<String> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user for API key regeneration")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {username}"))?;

        let new_api_key = generate_api_key();
        let now = chrono::Utc::now().to_rfc3339();

        let mut active: users::ActiveModel = user.into();
        active.api_key = Set(new_api_key.clone());
        active.updated_at = Set(now);
        active.update(&self.conn).await?;

        Ok(new_api_key)
    }
}

/// Generate a random API key (64 character hex string)
#[must_use]
pub fn generate_api_key() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use tracing::info;

use crate::models::episode::Episode;
use crate::models::show::Show;

pub mod migrator;
pub mod repositories;

pub use repositories::profile::Profile;
pub use repositories::user::User;
pub use repositories::watch::{ShowLink, WatchMark};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.starts_with(":memory:") && !db_url.contains("::memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn show_repo(&self) -> repositories::show::ShowRepository {
        repositories::show::ShowRepository::new(self.conn.clone())
    }

    fn watch_repo(&self) -> repositories::watch::WatchRepository {
        repositories::watch::WatchRepository::new(self.conn.clone())
    }

    fn profile_repo(&self) -> repositories::profile::ProfileRepository {
        repositories::profile::ProfileRepository::new(self.conn.clone())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    // ========== Catalog (shows/episodes) ==========

    pub async fn upsert_show(&self, show: &Show) -> Result<()> {
        self.show_repo().upsert(show).await
    }

    pub async fn upsert_episodes(&self, episodes: &[Episode]) -> Result<()> {
        self.show_repo().upsert_episodes(episodes).await
    }

    pub async fn get_show(&self, id: i32) -> Result<Option<Show>> {
        self.show_repo().get(id).await
    }

    pub async fn get_shows_by_ids(&self, ids: &[i32]) -> Result<Vec<Show>> {
        self.show_repo().get_by_ids(ids).await
    }

    pub async fn list_refreshable_shows(&self) -> Result<Vec<Show>> {
        self.show_repo().list_not_ended().await
    }

    pub async fn get_episode(&self, id: i32) -> Result<Option<Episode>> {
        self.show_repo().get_episode(id).await
    }

    pub async fn episodes_for_show(&self, show_id: i32) -> Result<Vec<Episode>> {
        self.show_repo().episodes_for_show(show_id).await
    }

    pub async fn episodes_for_shows(&self, show_ids: &[i32]) -> Result<Vec<Episode>> {
        self.show_repo().episodes_for_shows(show_ids).await
    }

    pub async fn episodes_for_season(&self, show_id: i32, season: i32) -> Result<Vec<Episode>> {
        self.show_repo().episodes_for_season(show_id, season).await
    }

    pub async fn episodes_in_window(
        &self,
        show_ids: &[i32],
        start: &str,
        end: &str,
    ) -> Result<Vec<Episode>> {
        self.show_repo()
            .episodes_in_window(show_ids, start, end)
            .await
    }

    pub async fn count_shows(&self) -> Result<u64> {
        self.show_repo().count_shows().await
    }

    pub async fn count_episodes(&self) -> Result<u64> {
        self.show_repo().count_episodes().await
    }

    // ========== Show links ==========

    pub async fn get_link(&self, profile_id: i32, show_id: i32) -> Result<Option<ShowLink>> {
        self.watch_repo().get_link(profile_id, show_id).await
    }

    pub async fn links_for_profile(&self, profile_id: i32) -> Result<Vec<ShowLink>> {
        self.watch_repo().links_for_profile(profile_id).await
    }

    pub async fn add_link(
        &self,
        profile_id: i32,
        show_id: i32,
        added_at: Option<String>,
    ) -> Result<ShowLink> {
        self.watch_repo()
            .add_link(profile_id, show_id, added_at)
            .await
    }

    pub async fn set_status_override(
        &self,
        profile_id: i32,
        show_id: i32,
        value: Option<&str>,
    ) -> Result<bool> {
        self.watch_repo()
            .set_status_override(profile_id, show_id, value)
            .await
    }

    pub async fn remove_link(&self, profile_id: i32, show_id: i32) -> Result<bool> {
        self.watch_repo().remove_link(profile_id, show_id).await
    }

    // ========== Watch marks ==========

    pub async fn upsert_watch_mark(
        &self,
        profile_id: i32,
        episode_id: i32,
        watched_at: &str,
    ) -> Result<()> {
        self.watch_repo()
            .upsert_mark(profile_id, episode_id, watched_at)
            .await
    }

    pub async fn delete_watch_mark(&self, profile_id: i32, episode_id: i32) -> Result<()> {
        self.watch_repo().delete_mark(profile_id, episode_id).await
    }

    pub async fn set_watch_marks_bulk(
        &self,
        profile_id: i32,
        episode_ids: &[i32],
        watched: bool,
        watched_at: &str,
    ) -> Result<()> {
        self.watch_repo()
            .set_marks_bulk(profile_id, episode_ids, watched, watched_at)
            .await
    }

    pub async fn watch_marks_for_episodes(
        &self,
        profile_id: i32,
        episode_ids: &[i32],
    ) -> Result<Vec<WatchMark>> {
        self.watch_repo()
            .marks_for_episodes(profile_id, episode_ids)
            .await
    }

    pub async fn watched_ids_by_show(
        &self,
        profile_id: i32,
        show_ids: &[i32],
    ) -> Result<HashMap<i32, HashSet<i32>>> {
        self.watch_repo()
            .watched_ids_by_show(profile_id, show_ids)
            .await
    }

    // ========== Profiles ==========

    pub async fn get_profile(&self, id: i32) -> Result<Option<Profile>> {
        self.profile_repo().get(id).await
    }

    pub async fn get_profile_by_name(&self, name: &str) -> Result<Option<Profile>> {
        self.profile_repo().get_by_name(name).await
    }

    pub async fn list_profiles_for_user(&self, user_id: i32) -> Result<Vec<Profile>> {
        self.profile_repo().list_for_user(user_id).await
    }

    pub async fn list_all_profiles(&self) -> Result<Vec<Profile>> {
        self.profile_repo().list_all().await
    }

    pub async fn create_profile(&self, user_id: i32, name: &str) -> Result<Profile> {
        self.profile_repo().create(user_id, name).await
    }

    pub async fn count_profiles(&self) -> Result<u64> {
        self.profile_repo().count().await
    }

    // ========== Users ==========

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn verify_user_password(&self, username: &str, password: &str) -> Result<bool> {
        self.user_repo().verify_password(username, password).await
    }

    pub async fn verify_api_key(&self, api_key: &str) -> Result<Option<User>> {
        self.user_repo().verify_api_key(api_key).await
    }

    pub async fn get_user_api_key(&self, username: &str) -> Result<Option<String>> {
        self.user_repo().get_api_key(username).await
    }

    pub async fn regenerate_user_api_key(&self, username: &str) -> Result<String> {
        self.user_repo().regenerate_api_key(username).await
    }
}

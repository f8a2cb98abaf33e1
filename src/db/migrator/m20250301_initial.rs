use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Default API key (will be regenerated on first use if desired)
const DEFAULT_API_KEY: &str = "trackarr_default_api_key_please_regenerate";

/// Hash the default password using Argon2id
fn hash_default_password() -> String {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let password = b"password";
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password, &salt)
        .expect("Failed to hash default password")
        .to_string()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Users)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Profiles)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Shows)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Episodes)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(ProfileShows)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(WatchMarks)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Seed default admin user with hashed password
        let now = chrono::Utc::now().to_rfc3339();
        let password_hash = hash_default_password();

        let insert_user = sea_orm_migration::sea_query::Query::insert()
            .into_table(Users)
            .columns([
                crate::entities::users::Column::Username,
                crate::entities::users::Column::PasswordHash,
                crate::entities::users::Column::ApiKey,
                crate::entities::users::Column::CreatedAt,
                crate::entities::users::Column::UpdatedAt,
            ])
            .values_panic([
                "admin".into(),
                password_hash.into(),
                DEFAULT_API_KEY.into(),
                now.clone().into(),
                now.clone().into(),
            ])
            .to_owned();

        manager.exec_stmt(insert_user).await?;

        // Every account starts with one viewer profile.
        let insert_profile = sea_orm_migration::sea_query::Query::insert()
            .into_table(Profiles)
            .columns([
                crate::entities::profiles::Column::UserId,
                crate::entities::profiles::Column::Name,
                crate::entities::profiles::Column::CreatedAt,
            ])
            .values_panic([1.into(), "Default".into(), now.into()])
            .to_owned();

        manager.exec_stmt(insert_profile).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WatchMarks).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProfileShows).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Episodes).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Shows).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Profiles).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users).to_owned())
            .await?;

        Ok(())
    }
}

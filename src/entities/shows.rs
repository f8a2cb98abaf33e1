use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "shows")]
pub struct Model {
    /// External catalog id; the stable key across re-imports.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub name: String,
    pub summary: Option<String>,
    /// Raw catalog lifecycle status ("Running", "Ended", ...).
    pub status: String,
    pub premiered: Option<String>,
    pub ended: Option<String>,
    pub image_medium: Option<String>,
    pub image_original: Option<String>,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::episodes::Entity")]
    Episodes,
    #[sea_orm(has_many = "super::profile_shows::Entity")]
    ProfileShows,
}

impl Related<super::episodes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Episodes.def()
    }
}

impl Related<super::profile_shows::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProfileShows.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

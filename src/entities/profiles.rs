use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
    #[sea_orm(has_many = "super::profile_shows::Entity")]
    ProfileShows,
    #[sea_orm(has_many = "super::watch_marks::Entity")]
    WatchMarks,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::profile_shows::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProfileShows.def()
    }
}

impl Related<super::watch_marks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WatchMarks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

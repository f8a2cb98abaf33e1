use sea_orm::entity::prelude::*;

/// A profile's subscription to a show.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "profile_shows")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub profile_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub show_id: i32,
    /// NULL or "stopped"; no other values are accepted at the boundary.
    pub status_override: Option<String>,
    pub added_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::profiles::Entity",
        from = "Column::ProfileId",
        to = "super::profiles::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Profiles,
    #[sea_orm(
        belongs_to = "super::shows::Entity",
        from = "Column::ShowId",
        to = "super::shows::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Shows,
}

impl Related<super::profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profiles.def()
    }
}

impl Related<super::shows::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shows.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

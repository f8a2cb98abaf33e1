use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "episodes")]
pub struct Model {
    /// External catalog id.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub show_id: i32,
    pub season: i32,
    pub number: i32,
    pub name: String,
    pub summary: Option<String>,
    /// Calendar date as `YYYY-MM-DD`; NULL when the catalog has none yet.
    pub airdate: Option<String>,
    /// Raw catalog air-time text; may literally hold "TBD".
    pub airtime: Option<String>,
    pub runtime: Option<i32>,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::shows::Entity",
        from = "Column::ShowId",
        to = "super::shows::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Shows,
    #[sea_orm(has_many = "super::watch_marks::Entity")]
    WatchMarks,
}

impl Related<super::shows::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shows.def()
    }
}

impl Related<super::watch_marks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WatchMarks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

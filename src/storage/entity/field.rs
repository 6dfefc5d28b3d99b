use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A farmer's field. `(name, location)` is unique and stored upper-cased; the
/// composite index is created in `storage::connection`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "fields")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub location: String,
    pub farmer_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::farmer::Entity",
        from = "Column::FarmerId",
        to = "super::farmer::Column::Id"
    )]
    Farmer,
    #[sea_orm(has_many = "super::harvest::Entity")]
    Harvests,
}

impl Related<super::farmer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Farmer.def()
    }
}

impl Related<super::harvest::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Harvests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "clients")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    // natural key, stored as given
    #[sea_orm(unique)]
    pub email: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::harvest::Entity")]
    Harvests,
}

impl Related<super::harvest::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Harvests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

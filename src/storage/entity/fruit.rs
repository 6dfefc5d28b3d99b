use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "fruits")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String, // upper-cased
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::variety::Entity")]
    Varieties,
}

impl Related<super::variety::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Varieties.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

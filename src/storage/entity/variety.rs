use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "fruit_varieties")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub fruit_id: i32,
    /// `FRUIT-VARIETY`, derived from the stored fruit name.
    #[sea_orm(unique)]
    pub unique_key: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::fruit::Entity",
        from = "Column::FruitId",
        to = "super::fruit::Column::Id"
    )]
    Fruit,
    #[sea_orm(has_many = "super::harvest::Entity")]
    Harvests,
}

impl Related<super::fruit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Fruit.def()
    }
}

impl Related<super::harvest::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Harvests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

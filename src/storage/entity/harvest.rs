use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "harvests")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub variety_id: i32,
    pub field_id: i32,
    pub client_id: i32,
    pub date: i64,
    pub origin: String, // MANUAL / FILE
}

impl Model {
    pub fn origin(&self) -> Option<HarvestOrigin> {
        self.origin.parse().ok()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::variety::Entity",
        from = "Column::VarietyId",
        to = "super::variety::Column::Id"
    )]
    Variety,
    #[sea_orm(
        belongs_to = "super::field::Entity",
        from = "Column::FieldId",
        to = "super::field::Column::Id"
    )]
    Field,
    #[sea_orm(
        belongs_to = "super::client::Entity",
        from = "Column::ClientId",
        to = "super::client::Column::Id"
    )]
    Client,
}

impl Related<super::variety::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Variety.def()
    }
}

impl Related<super::field::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Field.def()
    }
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Provenance of a harvest row.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HarvestOrigin {
    Manual,
    File,
}

impl HarvestOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            HarvestOrigin::Manual => "MANUAL",
            HarvestOrigin::File => "FILE",
        }
    }
}

impl fmt::Display for HarvestOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HarvestOrigin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MANUAL" => Ok(HarvestOrigin::Manual),
            "FILE" => Ok(HarvestOrigin::File),
            other => Err(format!("unknown harvest origin: {}", other)),
        }
    }
}

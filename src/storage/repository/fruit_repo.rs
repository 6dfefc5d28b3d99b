use crate::error::{HarvestError, Result};
use crate::storage::entity::fruit::{
    ActiveModel as FruitActiveModel, Column as FruitColumn, Entity as Fruit, Model as FruitModel,
};
use crate::storage::entity::variety::Entity as Variety;
use crate::storage::repository::reconciler::Reconciler;
use async_trait::async_trait;
use log::info;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FruitDraft {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FruitDto {
    pub id: i32,
    pub name: String,
    pub varieties: Vec<String>,
}

pub struct FruitRepository;

impl FruitRepository {
    pub async fn get(db: &DatabaseConnection, id: i32) -> Result<FruitModel> {
        Fruit::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| HarvestError::not_found("Fruit", id))
    }

    pub async fn list(db: &DatabaseConnection) -> Result<Vec<FruitModel>> {
        Ok(Fruit::find().order_by_asc(FruitColumn::Id).all(db).await?)
    }

    /// Fruit together with the names of its varieties.
    pub async fn get_with_varieties(db: &DatabaseConnection, id: i32) -> Result<FruitDto> {
        let mut rows = Fruit::find_by_id(id)
            .find_with_related(Variety)
            .all(db)
            .await?;
        let (fruit, varieties) = rows
            .pop()
            .ok_or_else(|| HarvestError::not_found("Fruit", id))?;
        Ok(FruitDto {
            id: fruit.id,
            name: fruit.name,
            varieties: varieties.into_iter().map(|v| v.name).collect(),
        })
    }
}

#[async_trait]
impl Reconciler for FruitRepository {
    type Key = String;
    type Draft = FruitDraft;
    type Model = FruitModel;

    async fn key_for(_db: &DatabaseConnection, draft: &FruitDraft) -> Result<String> {
        Ok(draft.name.to_uppercase())
    }

    async fn find_by_key(db: &DatabaseConnection, name: &String) -> Result<Option<FruitModel>> {
        Ok(Fruit::find()
            .filter(FruitColumn::Name.eq(name.as_str()))
            .one(db)
            .await?)
    }

    async fn create_if_absent(db: &DatabaseConnection, draft: FruitDraft) -> Result<FruitModel> {
        let name = draft.name.to_uppercase();
        if Self::find_by_key(db, &name).await?.is_some() {
            return Err(HarvestError::conflict(format!(
                "Fruit with name {} already exists",
                name
            )));
        }

        info!("Creating fruit {}", name);
        let am = FruitActiveModel {
            id: NotSet,
            name: Set(name),
        };
        Ok(am.insert(db).await?)
    }
}

use crate::error::{HarvestError, Result};
use crate::storage::entity::farmer::Entity as Farmer;
use crate::storage::entity::field::{
    ActiveModel as FieldActiveModel, Column as FieldColumn, Entity as Field, Model as FieldModel,
};
use crate::storage::repository::reconciler::Reconciler;
use async_trait::async_trait;
use log::info;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDraft {
    pub name: String,
    pub location: String,
    pub farmer_id: i32,
}

/// Upper-cased `(name, location)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldKey {
    pub name: String,
    pub location: String,
}

impl FieldKey {
    pub fn new(name: &str, location: &str) -> Self {
        Self {
            name: name.to_uppercase(),
            location: location.to_uppercase(),
        }
    }
}

pub struct FieldRepository;

impl FieldRepository {
    pub async fn get(db: &DatabaseConnection, id: i32) -> Result<FieldModel> {
        Field::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| HarvestError::not_found("Field", id))
    }

    pub async fn list(db: &DatabaseConnection) -> Result<Vec<FieldModel>> {
        Ok(Field::find().order_by_asc(FieldColumn::Id).all(db).await?)
    }

    pub async fn list_by_farmer(db: &DatabaseConnection, farmer_id: i32) -> Result<Vec<FieldModel>> {
        Ok(Field::find()
            .filter(FieldColumn::FarmerId.eq(farmer_id))
            .order_by_asc(FieldColumn::Id)
            .all(db)
            .await?)
    }

    async fn ensure_farmer(db: &DatabaseConnection, farmer_id: i32) -> Result<()> {
        if Farmer::find_by_id(farmer_id).one(db).await?.is_none() {
            return Err(HarvestError::conflict(format!(
                "Farmer with id {} not found",
                farmer_id
            )));
        }
        Ok(())
    }

    /// Inserts under `key`; the caller has already checked the farmer.
    async fn insert(db: &DatabaseConnection, key: FieldKey, farmer_id: i32) -> Result<FieldModel> {
        info!("Creating field {} at {}", key.name, key.location);
        let am = FieldActiveModel {
            id: NotSet,
            name: Set(key.name),
            location: Set(key.location),
            farmer_id: Set(farmer_id),
        };
        Ok(am.insert(db).await?)
    }
}

#[async_trait]
impl Reconciler for FieldRepository {
    type Key = FieldKey;
    type Draft = FieldDraft;
    type Model = FieldModel;

    async fn key_for(_db: &DatabaseConnection, draft: &FieldDraft) -> Result<FieldKey> {
        Ok(FieldKey::new(&draft.name, &draft.location))
    }

    async fn find_by_key(db: &DatabaseConnection, key: &FieldKey) -> Result<Option<FieldModel>> {
        Ok(Field::find()
            .filter(FieldColumn::Name.eq(key.name.as_str()))
            .filter(FieldColumn::Location.eq(key.location.as_str()))
            .one(db)
            .await?)
    }

    async fn create_if_absent(db: &DatabaseConnection, draft: FieldDraft) -> Result<FieldModel> {
        let key = Self::key_for(db, &draft).await?;
        if Self::find_by_key(db, &key).await?.is_some() {
            return Err(HarvestError::conflict(format!(
                "Field with name {} and location {} already exists",
                key.name, key.location
            )));
        }
        Self::ensure_farmer(db, draft.farmer_id).await?;
        Self::insert(db, key, draft.farmer_id).await
    }

    /// The farmer must exist even when the field does; it is looked up once.
    async fn get_or_create(db: &DatabaseConnection, draft: FieldDraft) -> Result<FieldModel> {
        Self::ensure_farmer(db, draft.farmer_id).await?;
        let key = Self::key_for(db, &draft).await?;
        match Self::find_by_key(db, &key).await? {
            Some(found) => Ok(found),
            None => Self::insert(db, key, draft.farmer_id).await,
        }
    }
}

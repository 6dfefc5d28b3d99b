use crate::error::{HarvestError, Result};
use crate::storage::entity::client::{Entity as Client, Model as ClientModel};
use crate::storage::entity::field::{Entity as Field, Model as FieldModel};
use crate::storage::entity::harvest::{
    ActiveModel as HarvestActiveModel, Column as HarvestColumn, Entity as Harvest,
    HarvestOrigin, Model as HarvestModel,
};
use crate::storage::entity::variety::{Entity as Variety, Model as VarietyModel};
use chrono::Utc;
use log::info;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, NotSet, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};

/// Ids of the three rows a harvest points at.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HarvestDraft {
    pub variety_id: i32,
    pub field_id: i32,
    pub client_id: i32,
    pub origin: HarvestOrigin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestDetail {
    pub id: i32,
    pub date: i64,
    pub origin: String,
    pub variety: Option<VarietyModel>,
    pub field: Option<FieldModel>,
    pub client: Option<ClientModel>,
}

pub struct HarvestRepository;

impl HarvestRepository {
    /// Persists a harvest after re-checking that variety, field and client all
    /// exist. The check and the insert share one transaction; a missing row is
    /// a `Conflict` and nothing is written.
    pub async fn create(db: &DatabaseConnection, draft: HarvestDraft) -> Result<HarvestModel> {
        let txn = db.begin().await?;

        if Variety::find_by_id(draft.variety_id).one(&txn).await?.is_none() {
            return Err(HarvestError::conflict(format!(
                "Fruit variety with id {} not found",
                draft.variety_id
            )));
        }
        if Field::find_by_id(draft.field_id).one(&txn).await?.is_none() {
            return Err(HarvestError::conflict(format!(
                "Field with id {} not found",
                draft.field_id
            )));
        }
        if Client::find_by_id(draft.client_id).one(&txn).await?.is_none() {
            return Err(HarvestError::conflict(format!(
                "Client with id {} not found",
                draft.client_id
            )));
        }

        let am = HarvestActiveModel {
            id: NotSet,
            variety_id: Set(draft.variety_id),
            field_id: Set(draft.field_id),
            client_id: Set(draft.client_id),
            date: Set(Utc::now().timestamp()),
            origin: Set(draft.origin.as_str().to_string()),
        };
        let saved = am.insert(&txn).await?;
        txn.commit().await?;

        info!(
            "Harvest {} recorded ({}): variety {}, field {}, client {}",
            saved.id, saved.origin, saved.variety_id, saved.field_id, saved.client_id
        );
        Ok(saved)
    }

    pub async fn get(db: &DatabaseConnection, id: i32) -> Result<HarvestModel> {
        Harvest::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| HarvestError::not_found("Harvest", id))
    }

    pub async fn list(db: &DatabaseConnection) -> Result<Vec<HarvestModel>> {
        Ok(Harvest::find()
            .order_by_asc(HarvestColumn::Id)
            .all(db)
            .await?)
    }

    pub async fn get_detail(db: &DatabaseConnection, id: i32) -> Result<HarvestDetail> {
        let harvest = Self::get(db, id).await?;
        let variety = Variety::find_by_id(harvest.variety_id).one(db).await?;
        let field = Field::find_by_id(harvest.field_id).one(db).await?;
        let client = Client::find_by_id(harvest.client_id).one(db).await?;
        Ok(HarvestDetail {
            id: harvest.id,
            date: harvest.date,
            origin: harvest.origin,
            variety,
            field,
            client,
        })
    }
}

use crate::error::{HarvestError, Result};
use crate::storage::entity::farmer::{
    ActiveModel as FarmerActiveModel, Column as FarmerColumn, Entity as Farmer,
    Model as FarmerModel,
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
pub struct FarmerDraft {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

pub struct FarmerRepository;

impl FarmerRepository {
    pub async fn get(db: &DatabaseConnection, id: i32) -> Result<FarmerModel> {
        Farmer::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| HarvestError::not_found("Farmer", id))
    }

    pub async fn list(db: &DatabaseConnection) -> Result<Vec<FarmerModel>> {
        Ok(Farmer::find()
            .order_by_asc(FarmerColumn::Id)
            .all(db)
            .await?)
    }
}

#[async_trait]
impl Reconciler for FarmerRepository {
    type Key = String;
    type Draft = FarmerDraft;
    type Model = FarmerModel;

    async fn key_for(_db: &DatabaseConnection, draft: &FarmerDraft) -> Result<String> {
        Ok(draft.email.clone())
    }

    async fn find_by_key(db: &DatabaseConnection, email: &String) -> Result<Option<FarmerModel>> {
        Ok(Farmer::find()
            .filter(FarmerColumn::Email.eq(email.as_str()))
            .one(db)
            .await?)
    }

    async fn create_if_absent(db: &DatabaseConnection, draft: FarmerDraft) -> Result<FarmerModel> {
        if Self::find_by_key(db, &draft.email).await?.is_some() {
            return Err(HarvestError::conflict(format!(
                "Farmer with email {} already exists",
                draft.email
            )));
        }

        info!("Creating farmer {}", draft.email);
        let am = FarmerActiveModel {
            id: NotSet,
            first_name: Set(draft.first_name),
            last_name: Set(draft.last_name),
            email: Set(draft.email),
        };
        Ok(am.insert(db).await?)
    }

    async fn on_match(
        db: &DatabaseConnection,
        found: FarmerModel,
        draft: FarmerDraft,
    ) -> Result<FarmerModel> {
        let mut am: FarmerActiveModel = found.into();
        am.first_name = Set(draft.first_name);
        am.last_name = Set(draft.last_name);
        Ok(am.update(db).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::establish_connection;

    fn draft(email: &str, first: &str) -> FarmerDraft {
        FarmerDraft {
            email: email.to_string(),
            first_name: first.to_string(),
            last_name: "Rojas".to_string(),
        }
    }

    #[tokio::test]
    async fn repeated_email_updates_names_in_place() {
        let db = establish_connection("sqlite::memory:", 1).await.unwrap();

        let a = FarmerRepository::get_or_create(&db, draft("f@x.com", "Luis"))
            .await
            .unwrap();
        let b = FarmerRepository::get_or_create(&db, draft("f@x.com", "Lucho"))
            .await
            .unwrap();

        assert_eq!(a.id, b.id);
        assert_eq!(FarmerRepository::get(&db, a.id).await.unwrap().first_name, "Lucho");
        assert_eq!(FarmerRepository::list(&db).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn second_strict_create_conflicts() {
        let db = establish_connection("sqlite::memory:", 1).await.unwrap();

        FarmerRepository::create_if_absent(&db, draft("f@x.com", "Luis"))
            .await
            .unwrap();
        let err = FarmerRepository::create_if_absent(&db, draft("f@x.com", "Luis"))
            .await
            .unwrap_err();
        assert!(matches!(err, HarvestError::Conflict(_)));
    }
}

use crate::error::{HarvestError, Result};
use crate::storage::entity::client::{
    ActiveModel as ClientActiveModel, Column as ClientColumn, Entity as Client,
    Model as ClientModel,
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
pub struct ClientDraft {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

pub struct ClientRepository;

impl ClientRepository {
    pub async fn get(db: &DatabaseConnection, id: i32) -> Result<ClientModel> {
        Client::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| HarvestError::not_found("Client", id))
    }

    pub async fn list(db: &DatabaseConnection) -> Result<Vec<ClientModel>> {
        Ok(Client::find()
            .order_by_asc(ClientColumn::Id)
            .all(db)
            .await?)
    }
}

#[async_trait]
impl Reconciler for ClientRepository {
    type Key = String;
    type Draft = ClientDraft;
    type Model = ClientModel;

    async fn key_for(_db: &DatabaseConnection, draft: &ClientDraft) -> Result<String> {
        Ok(draft.email.clone())
    }

    async fn find_by_key(db: &DatabaseConnection, email: &String) -> Result<Option<ClientModel>> {
        Ok(Client::find()
            .filter(ClientColumn::Email.eq(email.as_str()))
            .one(db)
            .await?)
    }

    async fn create_if_absent(db: &DatabaseConnection, draft: ClientDraft) -> Result<ClientModel> {
        if Self::find_by_key(db, &draft.email).await?.is_some() {
            return Err(HarvestError::conflict(format!(
                "Client with email {} already exists",
                draft.email
            )));
        }

        info!("Creating client {}", draft.email);
        let am = ClientActiveModel {
            id: NotSet,
            first_name: Set(draft.first_name),
            last_name: Set(draft.last_name),
            email: Set(draft.email),
        };
        Ok(am.insert(db).await?)
    }

    /// Last write wins on the name fields; the email never changes.
    async fn on_match(
        db: &DatabaseConnection,
        found: ClientModel,
        draft: ClientDraft,
    ) -> Result<ClientModel> {
        let mut am: ClientActiveModel = found.into();
        am.first_name = Set(draft.first_name);
        am.last_name = Set(draft.last_name);
        Ok(am.update(db).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::establish_connection;

    fn draft(email: &str, first: &str, last: &str) -> ClientDraft {
        ClientDraft {
            email: email.to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
        }
    }

    #[tokio::test]
    async fn get_or_create_is_idempotent_and_overwrites_names() {
        let db = establish_connection("sqlite::memory:", 1).await.unwrap();

        let first = ClientRepository::get_or_create(&db, draft("c@x.com", "Ana", "Diaz"))
            .await
            .unwrap();
        let second = ClientRepository::get_or_create(&db, draft("c@x.com", "Anita", "Perez"))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.first_name, "Anita");
        assert_eq!(second.last_name, "Perez");

        let stored = ClientRepository::get(&db, first.id).await.unwrap();
        assert_eq!(stored.first_name, "Anita");
        assert_eq!(ClientRepository::list(&db).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn email_is_matched_case_sensitively() {
        let db = establish_connection("sqlite::memory:", 1).await.unwrap();

        let lower = ClientRepository::get_or_create(&db, draft("c@x.com", "A", "B"))
            .await
            .unwrap();
        let upper = ClientRepository::get_or_create(&db, draft("C@X.COM", "A", "B"))
            .await
            .unwrap();

        assert_ne!(lower.id, upper.id);
    }

    #[tokio::test]
    async fn strict_create_rejects_existing_email() {
        let db = establish_connection("sqlite::memory:", 1).await.unwrap();

        ClientRepository::create_if_absent(&db, draft("c@x.com", "A", "B"))
            .await
            .unwrap();
        let err = ClientRepository::create_if_absent(&db, draft("c@x.com", "C", "D"))
            .await
            .unwrap_err();

        assert!(matches!(err, HarvestError::Conflict(_)));
        let stored = ClientRepository::list(&db).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].first_name, "A");
    }

    #[tokio::test]
    async fn get_unknown_id_is_not_found() {
        let db = establish_connection("sqlite::memory:", 1).await.unwrap();

        let err = ClientRepository::get(&db, 42).await.unwrap_err();
        assert!(matches!(
            err,
            HarvestError::NotFound {
                entity: "Client",
                id: 42
            }
        ));
    }
}

use crate::error::{HarvestError, Result};
use crate::storage::entity::fruit::{Entity as Fruit, Model as FruitModel};
use crate::storage::entity::variety::{
    ActiveModel as VarietyActiveModel, Column as VarietyColumn, Entity as Variety,
    Model as VarietyModel,
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
pub struct VarietyDraft {
    pub name: String,
    pub fruit_id: i32,
}

/// `FRUIT-VARIETY` from the stored fruit name and the raw variety name. Only
/// the first space of the variety name becomes a hyphen.
pub fn variety_unique_key(fruit_name: &str, variety_name: &str) -> String {
    format!("{}-{}", fruit_name, variety_name.replacen(' ', "-", 1)).to_uppercase()
}

pub struct VarietyRepository;

impl VarietyRepository {
    pub async fn get(db: &DatabaseConnection, id: i32) -> Result<VarietyModel> {
        Variety::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| HarvestError::not_found("Variety", id))
    }

    pub async fn list(db: &DatabaseConnection) -> Result<Vec<VarietyModel>> {
        Ok(Variety::find()
            .order_by_asc(VarietyColumn::Id)
            .all(db)
            .await?)
    }

    pub async fn list_by_fruit(db: &DatabaseConnection, fruit_id: i32) -> Result<Vec<VarietyModel>> {
        Ok(Variety::find()
            .filter(VarietyColumn::FruitId.eq(fruit_id))
            .order_by_asc(VarietyColumn::Id)
            .all(db)
            .await?)
    }

    async fn parent_fruit(db: &DatabaseConnection, fruit_id: i32) -> Result<FruitModel> {
        Fruit::find_by_id(fruit_id)
            .one(db)
            .await?
            .ok_or_else(|| HarvestError::conflict(format!("Fruit with id {} not found", fruit_id)))
    }
}

#[async_trait]
impl Reconciler for VarietyRepository {
    type Key = String;
    type Draft = VarietyDraft;
    type Model = VarietyModel;

    async fn key_for(db: &DatabaseConnection, draft: &VarietyDraft) -> Result<String> {
        let fruit = Self::parent_fruit(db, draft.fruit_id).await?;
        Ok(variety_unique_key(&fruit.name, &draft.name))
    }

    async fn find_by_key(db: &DatabaseConnection, key: &String) -> Result<Option<VarietyModel>> {
        Ok(Variety::find()
            .filter(VarietyColumn::UniqueKey.eq(key.as_str()))
            .one(db)
            .await?)
    }

    async fn create_if_absent(db: &DatabaseConnection, draft: VarietyDraft) -> Result<VarietyModel> {
        let fruit = Self::parent_fruit(db, draft.fruit_id).await?;
        let unique_key = variety_unique_key(&fruit.name, &draft.name);
        if Self::find_by_key(db, &unique_key).await?.is_some() {
            return Err(HarvestError::conflict(format!(
                "Variety with key {} already exists",
                unique_key
            )));
        }

        info!("Creating variety {}", unique_key);
        let am = VarietyActiveModel {
            id: NotSet,
            name: Set(draft.name),
            fruit_id: Set(fruit.id),
            unique_key: Set(unique_key),
        };
        Ok(am.insert(db).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::establish_connection;
    use crate::storage::repository::{FruitDraft, FruitRepository};

    #[test]
    fn unique_key_joins_fruit_and_variety() {
        assert_eq!(variety_unique_key("Apple", "Granny Smith"), "APPLE-GRANNY-SMITH");
        assert_eq!(variety_unique_key("APPLE", "fuji"), "APPLE-FUJI");
        // only the first space is replaced
        assert_eq!(variety_unique_key("PEAR", "red d anjou"), "PEAR-RED-D ANJOU");
    }

    #[tokio::test]
    async fn key_uses_stored_fruit_name() {
        let db = establish_connection("sqlite::memory:", 1).await.unwrap();
        let fruit = FruitRepository::get_or_create(
            &db,
            FruitDraft {
                name: "apple".to_string(),
            },
        )
        .await
        .unwrap();

        let variety = VarietyRepository::get_or_create(
            &db,
            VarietyDraft {
                name: "Granny Smith".to_string(),
                fruit_id: fruit.id,
            },
        )
        .await
        .unwrap();

        assert_eq!(variety.unique_key, "APPLE-GRANNY-SMITH");
        assert_eq!(variety.name, "Granny Smith");
        assert_eq!(variety.fruit_id, fruit.id);

        let again = VarietyRepository::get_or_create(
            &db,
            VarietyDraft {
                name: "granny smith".to_string(),
                fruit_id: fruit.id,
            },
        )
        .await
        .unwrap();
        // name drift on match is ignored
        assert_eq!(again, variety);

        let names = FruitRepository::get_with_varieties(&db, fruit.id)
            .await
            .unwrap()
            .varieties;
        assert_eq!(names, vec!["Granny Smith".to_string()]);
        assert_eq!(
            VarietyRepository::list_by_fruit(&db, fruit.id)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn unknown_fruit_is_a_conflict() {
        let db = establish_connection("sqlite::memory:", 1).await.unwrap();

        let draft = VarietyDraft {
            name: "Fuji".to_string(),
            fruit_id: 5,
        };
        let err = VarietyRepository::get_or_create(&db, draft.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, HarvestError::Conflict(_)));
        let err = VarietyRepository::create_if_absent(&db, draft)
            .await
            .unwrap_err();
        assert!(matches!(err, HarvestError::Conflict(_)));
        assert!(VarietyRepository::list(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn strict_create_conflicts_on_same_unique_key() {
        let db = establish_connection("sqlite::memory:", 1).await.unwrap();
        let fruit = FruitRepository::create_if_absent(
            &db,
            FruitDraft {
                name: "Apple".to_string(),
            },
        )
        .await
        .unwrap();

        VarietyRepository::create_if_absent(
            &db,
            VarietyDraft {
                name: "Granny Smith".to_string(),
                fruit_id: fruit.id,
            },
        )
        .await
        .unwrap();
        let err = VarietyRepository::create_if_absent(
            &db,
            VarietyDraft {
                name: "granny smith".to_string(),
                fruit_id: fruit.id,
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, HarvestError::Conflict(ref msg) if msg.contains("APPLE-GRANNY-SMITH")));
        assert_eq!(VarietyRepository::list(&db).await.unwrap().len(), 1);
    }
}

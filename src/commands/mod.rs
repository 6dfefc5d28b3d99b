pub mod app_command;

pub use app_command::{AppCommand, USAGE};

use crate::config::AppConfig;
use crate::ingest::IngestionDriver;
use crate::storage::entity::HarvestOrigin;
use crate::storage::repository::{
    ClientDraft, ClientRepository, FarmerDraft, FarmerRepository, FieldDraft, FieldRepository,
    FruitDraft, FruitRepository, HarvestDraft, HarvestRepository, Reconciler, VarietyDraft,
    VarietyRepository,
};
use anyhow::Result;
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use std::sync::Arc;

/// Runs one command and returns its JSON result. Errors are surfaced as-is;
/// only ingestion turns row problems into report entries.
pub async fn execute(
    cmd: AppCommand,
    db: &Arc<DatabaseConnection>,
    config: &AppConfig,
) -> Result<Value> {
    let conn = db.as_ref();
    let value = match cmd {
        AppCommand::Ingest { file } => {
            let path = config.resolve_upload(&file);
            let report = IngestionDriver::new(db.clone()).ingest(&path).await?;
            serde_json::to_value(report)?
        }
        AppCommand::HarvestCreate {
            variety_id,
            field_id,
            client_id,
        } => {
            let harvest = HarvestRepository::create(
                conn,
                HarvestDraft {
                    variety_id,
                    field_id,
                    client_id,
                    origin: HarvestOrigin::Manual,
                },
            )
            .await?;
            serde_json::to_value(harvest)?
        }
        AppCommand::HarvestGet { id } => {
            serde_json::to_value(HarvestRepository::get_detail(conn, id).await?)?
        }
        AppCommand::HarvestList => serde_json::to_value(HarvestRepository::list(conn).await?)?,
        AppCommand::ClientCreate {
            email,
            first_name,
            last_name,
        } => {
            let client = ClientRepository::create_if_absent(
                conn,
                ClientDraft {
                    email,
                    first_name,
                    last_name,
                },
            )
            .await?;
            serde_json::to_value(client)?
        }
        AppCommand::ClientGet { id } => serde_json::to_value(ClientRepository::get(conn, id).await?)?,
        AppCommand::ClientList => serde_json::to_value(ClientRepository::list(conn).await?)?,
        AppCommand::FarmerCreate {
            email,
            first_name,
            last_name,
        } => {
            let farmer = FarmerRepository::create_if_absent(
                conn,
                FarmerDraft {
                    email,
                    first_name,
                    last_name,
                },
            )
            .await?;
            serde_json::to_value(farmer)?
        }
        AppCommand::FarmerGet { id } => serde_json::to_value(FarmerRepository::get(conn, id).await?)?,
        AppCommand::FarmerList => serde_json::to_value(FarmerRepository::list(conn).await?)?,
        AppCommand::FieldCreate {
            farmer_id,
            name,
            location,
        } => {
            let field = FieldRepository::create_if_absent(
                conn,
                FieldDraft {
                    name,
                    location,
                    farmer_id,
                },
            )
            .await?;
            serde_json::to_value(field)?
        }
        AppCommand::FieldGet { id } => serde_json::to_value(FieldRepository::get(conn, id).await?)?,
        AppCommand::FieldList => serde_json::to_value(FieldRepository::list(conn).await?)?,
        AppCommand::FieldsByFarmer { farmer_id } => {
            serde_json::to_value(FieldRepository::list_by_farmer(conn, farmer_id).await?)?
        }
        AppCommand::FruitCreate { name } => {
            let fruit = FruitRepository::create_if_absent(conn, FruitDraft { name }).await?;
            serde_json::to_value(fruit)?
        }
        AppCommand::FruitGet { id } => {
            serde_json::to_value(FruitRepository::get_with_varieties(conn, id).await?)?
        }
        AppCommand::FruitList => serde_json::to_value(FruitRepository::list(conn).await?)?,
        AppCommand::VarietyCreate { fruit_id, name } => {
            let variety =
                VarietyRepository::create_if_absent(conn, VarietyDraft { name, fruit_id }).await?;
            serde_json::to_value(variety)?
        }
        AppCommand::VarietyGet { id } => {
            serde_json::to_value(VarietyRepository::get(conn, id).await?)?
        }
        AppCommand::VarietyList => serde_json::to_value(VarietyRepository::list(conn).await?)?,
        AppCommand::VarietiesByFruit { fruit_id } => {
            serde_json::to_value(VarietyRepository::list_by_fruit(conn, fruit_id).await?)?
        }
        AppCommand::Help => json!({ "usage": USAGE }),
        AppCommand::Unknown(msg) => anyhow::bail!("{}\n{}", msg, USAGE),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::establish_connection;

    #[tokio::test]
    async fn manual_path_surfaces_conflicts() {
        let db = Arc::new(establish_connection("sqlite::memory:", 1).await.unwrap());
        let config = AppConfig::default();

        let created = execute("fruit create apple".parse().unwrap(), &db, &config)
            .await
            .unwrap();
        assert_eq!(created["name"], "APPLE");

        let err = execute("fruit create Apple".parse().unwrap(), &db, &config)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<crate::error::HarvestError>(),
            Some(crate::error::HarvestError::Conflict(_))
        ));

        let err = execute("harvest create 1 1 1".parse().unwrap(), &db, &config)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}

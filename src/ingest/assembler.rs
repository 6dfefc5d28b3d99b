//! Turns one export row into a harvest, resolving its entities in a fixed order.

use crate::error::HarvestError;
use crate::ingest::source::HarvestRow;
use crate::storage::entity::HarvestOrigin;
use crate::storage::repository::{
    ClientDraft, ClientRepository, FarmerDraft, FarmerRepository, FieldDraft, FieldRepository,
    FruitDraft, FruitRepository, HarvestDraft, HarvestRepository, Reconciler, VarietyDraft,
    VarietyRepository,
};
use log::{error, warn};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Step at which a row was given up. Farmer never appears: a row without a
/// farmer fails at the field step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipStep {
    Client,
    Field,
    Variety,
}

impl fmt::Display for SkipStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SkipStep::Client => "client",
            SkipStep::Field => "field",
            SkipStep::Variety => "variety",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skip {
    pub step: SkipStep,
    pub reason: String,
}

impl Skip {
    fn new(step: SkipStep, reason: impl Into<String>) -> Self {
        Self {
            step,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowOutcome {
    Created {
        record_number: usize,
        harvest_id: i32,
    },
    Skipped {
        record_number: usize,
        step: SkipStep,
        reason: String,
    },
    WriteFailed {
        record_number: usize,
        reason: String,
    },
}

impl RowOutcome {
    pub fn record_number(&self) -> usize {
        match self {
            RowOutcome::Created { record_number, .. }
            | RowOutcome::Skipped { record_number, .. }
            | RowOutcome::WriteFailed { record_number, .. } => *record_number,
        }
    }

    pub fn skip_step(&self) -> Option<SkipStep> {
        match self {
            RowOutcome::Skipped { step, .. } => Some(*step),
            _ => None,
        }
    }
}

pub struct RowAssembler<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> RowAssembler<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Runs every step for `row` and writes the harvest. Never fails: data
    /// problems become `Skipped`, a rejected write becomes `WriteFailed`.
    pub async fn process(&self, row: &HarvestRow) -> RowOutcome {
        let record_number = row.record_number;
        let draft = match self.resolve(row).await {
            Ok(draft) => draft,
            Err(skip) => {
                warn!(
                    "Row {}: skipped at {} step: {}",
                    record_number, skip.step, skip.reason
                );
                return RowOutcome::Skipped {
                    record_number,
                    step: skip.step,
                    reason: skip.reason,
                };
            }
        };

        match HarvestRepository::create(self.db, draft).await {
            Ok(harvest) => RowOutcome::Created {
                record_number,
                harvest_id: harvest.id,
            },
            Err(e) => {
                error!("Row {}: failed to write harvest: {}", record_number, e);
                RowOutcome::WriteFailed {
                    record_number,
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Steps 1-4: client, farmer, field, fruit + variety. Stops at the first
    /// step that cannot be resolved.
    pub async fn resolve(&self, row: &HarvestRow) -> Result<HarvestDraft, Skip> {
        let db = self.db;

        if row.client_email.is_empty() {
            return Err(Skip::new(SkipStep::Client, "client email is empty"));
        }
        let client = ClientRepository::get_or_create(
            db,
            ClientDraft {
                email: row.client_email.clone(),
                first_name: row.client_first_name.clone(),
                last_name: row.client_last_name.clone(),
            },
        )
        .await
        .map_err(|e| Skip::new(SkipStep::Client, reason(e)))?;

        let farmer = if row.farmer_email.is_empty() {
            None
        } else {
            match FarmerRepository::get_or_create(
                db,
                FarmerDraft {
                    email: row.farmer_email.clone(),
                    first_name: row.farmer_first_name.clone(),
                    last_name: row.farmer_last_name.clone(),
                },
            )
            .await
            {
                Ok(farmer) => Some(farmer),
                Err(e) => {
                    warn!(
                        "Row {}: farmer {} unresolved: {}",
                        row.record_number, row.farmer_email, e
                    );
                    None
                }
            }
        };

        if row.field_name.is_empty() || row.field_location.is_empty() {
            return Err(Skip::new(
                SkipStep::Field,
                "field name or location is empty",
            ));
        }
        let Some(farmer) = farmer else {
            return Err(Skip::new(SkipStep::Field, "no farmer resolved for field"));
        };
        let field = FieldRepository::get_or_create(
            db,
            FieldDraft {
                name: row.field_name.clone(),
                location: row.field_location.clone(),
                farmer_id: farmer.id,
            },
        )
        .await
        .map_err(|e| Skip::new(SkipStep::Field, reason(e)))?;

        if row.harvested_fruit.is_empty() || row.harvested_variety.is_empty() {
            return Err(Skip::new(
                SkipStep::Variety,
                "harvested fruit or variety is empty",
            ));
        }
        let fruit = FruitRepository::get_or_create(
            db,
            FruitDraft {
                name: row.harvested_fruit.clone(),
            },
        )
        .await
        .map_err(|e| Skip::new(SkipStep::Variety, reason(e)))?;
        let variety = VarietyRepository::get_or_create(
            db,
            VarietyDraft {
                name: row.harvested_variety.clone(),
                fruit_id: fruit.id,
            },
        )
        .await
        .map_err(|e| Skip::new(SkipStep::Variety, reason(e)))?;

        Ok(HarvestDraft {
            variety_id: variety.id,
            field_id: field.id,
            client_id: client.id,
            origin: HarvestOrigin::File,
        })
    }
}

fn reason(err: HarvestError) -> String {
    err.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::establish_connection;

    fn full_row() -> HarvestRow {
        HarvestRow {
            record_number: 1,
            farmer_email: "f@x.com".to_string(),
            farmer_first_name: "Luis".to_string(),
            farmer_last_name: "Rojas".to_string(),
            client_email: "c@x.com".to_string(),
            client_first_name: "Ana".to_string(),
            client_last_name: "Diaz".to_string(),
            field_name: "F1".to_string(),
            field_location: "L1".to_string(),
            harvested_fruit: "Apple".to_string(),
            harvested_variety: "Granny Smith".to_string(),
        }
    }

    #[tokio::test]
    async fn empty_field_location_skips_at_field_even_with_farmer() {
        let db = establish_connection("sqlite::memory:", 1).await.unwrap();
        let row = HarvestRow {
            field_location: String::new(),
            ..full_row()
        };

        let outcome = RowAssembler::new(&db).process(&row).await;

        assert_eq!(outcome.skip_step(), Some(SkipStep::Field));
        // farmer is resolved before the field step gives up
        assert_eq!(FarmerRepository::list(&db).await.unwrap().len(), 1);
        assert!(FruitRepository::list(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_variety_skips_at_variety_without_creating_fruit() {
        let db = establish_connection("sqlite::memory:", 1).await.unwrap();
        let row = HarvestRow {
            harvested_variety: String::new(),
            ..full_row()
        };

        let outcome = RowAssembler::new(&db).process(&row).await;

        assert_eq!(outcome.skip_step(), Some(SkipStep::Variety));
        assert!(FruitRepository::list(&db).await.unwrap().is_empty());
        assert_eq!(FieldRepository::list(&db).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn complete_row_resolves_to_file_harvest() {
        let db = establish_connection("sqlite::memory:", 1).await.unwrap();

        let outcome = RowAssembler::new(&db).process(&full_row()).await;

        let RowOutcome::Created { harvest_id, .. } = outcome.clone() else {
            panic!("expected a created harvest, got {:?}", outcome);
        };
        let harvest = HarvestRepository::get(&db, harvest_id).await.unwrap();
        assert_eq!(harvest.origin(), Some(HarvestOrigin::File));
    }

    #[test]
    fn skip_step_display_is_lowercase() {
        assert_eq!(SkipStep::Client.to_string(), "client");
        assert_eq!(SkipStep::Variety.to_string(), "variety");
    }
}

pub mod client_repo;
pub mod farmer_repo;
pub mod field_repo;
pub mod fruit_repo;
pub mod harvest_repo;
pub mod reconciler;
pub mod variety_repo;

pub use client_repo::{ClientDraft, ClientRepository};
pub use farmer_repo::{FarmerDraft, FarmerRepository};
pub use field_repo::{FieldDraft, FieldKey, FieldRepository};
pub use fruit_repo::{FruitDraft, FruitDto, FruitRepository};
pub use harvest_repo::{HarvestDetail, HarvestDraft, HarvestRepository};
pub use reconciler::Reconciler;
pub use variety_repo::{variety_unique_key, VarietyDraft, VarietyRepository};

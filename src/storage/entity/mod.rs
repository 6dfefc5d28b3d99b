pub mod client;
pub mod farmer;
pub mod field;
pub mod fruit;
pub mod harvest;
pub mod variety;

pub use harvest::HarvestOrigin;

pub mod commands;
pub mod config;
pub mod error;
pub mod ingest;
pub mod storage;

pub use config::AppConfig;
pub use error::{HarvestError, Result};
pub use ingest::{IngestReport, IngestionDriver, RowOutcome, SkipStep};

use crate::error::Result;
use crate::ingest::assembler::{RowAssembler, RowOutcome};
use crate::ingest::source::RowSource;
use log::{error, info};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

/// Per-run tally plus the outcome of every row attempted, in file order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestReport {
    pub processed: usize,
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
    pub outcomes: Vec<RowOutcome>,
}

impl IngestReport {
    pub fn record(&mut self, outcome: RowOutcome) {
        self.processed += 1;
        match outcome {
            RowOutcome::Created { .. } => self.created += 1,
            RowOutcome::Skipped { .. } => self.skipped += 1,
            RowOutcome::WriteFailed { .. } => self.failed += 1,
        }
        self.outcomes.push(outcome);
    }
}

pub struct IngestionDriver {
    db: Arc<DatabaseConnection>,
}

impl IngestionDriver {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Ingests a whole export file. Only a file that cannot be opened or
    /// parsed is an error; rows that cannot be resolved are reported and
    /// skipped.
    pub async fn ingest(&self, path: &Path) -> Result<IngestReport> {
        info!("Ingesting harvest file {}", path.display());
        let mut report = IngestReport::default();
        let source = RowSource::open(path).map_err(|e| {
            error!("Cannot open {}: {}", path.display(), e);
            e
        })?;
        self.run(source, &mut report).await?;
        info!(
            "Finished {}: {} rows, {} created, {} skipped, {} failed",
            path.display(),
            report.processed,
            report.created,
            report.skipped,
            report.failed
        );
        Ok(report)
    }

    /// Drains `source` one row at a time into `report`. Each row is finished
    /// before the next is read, so later rows see entities created by earlier
    /// ones. A parse error stops the run; rows already recorded stay in
    /// `report`.
    pub async fn run<R: Read>(&self, source: RowSource<R>, report: &mut IngestReport) -> Result<()> {
        let assembler = RowAssembler::new(self.db.as_ref());
        for row in source {
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    error!(
                        "Aborting ingestion after {} rows: {}",
                        report.processed, e
                    );
                    return Err(e);
                }
            };
            let outcome = assembler.process(&row).await;
            report.record(outcome);
        }
        Ok(())
    }
}

pub mod assembler;
pub mod driver;
pub mod source;

pub use assembler::{RowAssembler, RowOutcome, Skip, SkipStep};
pub use driver::{IngestReport, IngestionDriver};
pub use source::{HarvestRow, RowSource};

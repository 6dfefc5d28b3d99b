use sea_orm::{DbErr, SqlErr};

#[derive(thiserror::Error, Debug)]
pub enum HarvestError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: i32 },
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("csv parse error: {0}")]
    Parse(#[from] csv::Error),
    #[error("missing column '{0}' in header")]
    MissingColumn(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("database error: {0}")]
    Db(DbErr),
}

impl HarvestError {
    pub fn not_found(entity: &'static str, id: i32) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Errors that make the row stream unusable and abort a whole ingestion run.
    pub fn is_parse_failure(&self) -> bool {
        matches!(
            self,
            HarvestError::Parse(_) | HarvestError::MissingColumn(_) | HarvestError::Io(_)
        )
    }
}

impl From<DbErr> for HarvestError {
    fn from(err: DbErr) -> Self {
        // unique index hit after a find-then-insert race
        if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
            return HarvestError::Conflict(detail);
        }
        HarvestError::Db(err)
    }
}

pub type Result<T> = std::result::Result<T, HarvestError>;

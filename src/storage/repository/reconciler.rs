use crate::error::Result;
use async_trait::async_trait;
use sea_orm::DatabaseConnection;

/// Find-or-create over an entity's natural key.
///
/// Implementors supply key derivation, lookup and the strict insert; the
/// composed `get_or_create` is shared. None of this is atomic: two callers can
/// both miss in `find_by_key` and both insert, and only the unique index on the
/// table turns the loser into a `Conflict`.
#[async_trait]
pub trait Reconciler {
    type Key: Send + Sync + 'static;
    type Draft: Send + Sync + 'static;
    type Model: Send + 'static;

    /// Normalized natural key for a draft. May consult the parent row when the
    /// key depends on it.
    async fn key_for(db: &DatabaseConnection, draft: &Self::Draft) -> Result<Self::Key>;

    async fn find_by_key(db: &DatabaseConnection, key: &Self::Key)
        -> Result<Option<Self::Model>>;

    /// Strict create: `Conflict` when the key is already taken or a required
    /// parent is missing.
    async fn create_if_absent(db: &DatabaseConnection, draft: Self::Draft) -> Result<Self::Model>;

    /// Applied to an existing row matched by `get_or_create`. Returns it
    /// unchanged unless overridden.
    async fn on_match(
        _db: &DatabaseConnection,
        found: Self::Model,
        _draft: Self::Draft,
    ) -> Result<Self::Model> {
        Ok(found)
    }

    async fn get_or_create(db: &DatabaseConnection, draft: Self::Draft) -> Result<Self::Model> {
        let key = Self::key_for(db, &draft).await?;
        match Self::find_by_key(db, &key).await? {
            Some(found) => Self::on_match(db, found, draft).await,
            None => Self::create_if_absent(db, draft).await,
        }
    }
}

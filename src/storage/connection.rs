use crate::storage::entity::{client, farmer, field, fruit, harvest, variety};
use log::info;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema,
    Statement,
};
use std::time::Duration;

pub async fn establish_connection(
    db_url: &str,
    max_connections: u32,
) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());
    if is_in_memory(db_url) {
        // every pooled connection would otherwise open its own empty database
        opt.max_connections(1).min_connections(1);
    } else {
        opt.max_connections(max_connections.max(1))
            .min_connections(1)
            .connect_timeout(Duration::from_secs(8))
            .acquire_timeout(Duration::from_secs(8))
            .idle_timeout(Duration::from_secs(8))
            .max_lifetime(Duration::from_secs(8));
    }
    opt.sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let db = Database::connect(opt).await?;

    if db.get_database_backend() == sea_orm::DatabaseBackend::Sqlite {
        db.execute(Statement::from_string(
            sea_orm::DatabaseBackend::Sqlite,
            "PRAGMA journal_mode=WAL;".to_string(),
        ))
        .await?;
    }

    create_tables(&db).await?;

    info!("Database connection established and tables initialized.");

    Ok(db)
}

fn is_in_memory(db_url: &str) -> bool {
    db_url.contains(":memory:") || db_url.contains("mode=memory")
}

async fn create_tables(db: &DatabaseConnection) -> Result<(), DbErr> {
    // parents before children so foreign keys resolve
    create_table(db, client::Entity).await?;
    create_table(db, farmer::Entity).await?;
    create_table(db, field::Entity).await?;
    create_table(db, fruit::Entity).await?;
    create_table(db, variety::Entity).await?;
    create_table(db, harvest::Entity).await?;

    // Reconcilers find-then-insert without a lock; this index is the only
    // thing keeping concurrent inserts of the same field unique.
    let backend = db.get_database_backend();
    db.execute(Statement::from_string(
        backend,
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_fields_name_location ON fields(name, location);"
            .to_string(),
    ))
    .await?;

    Ok(())
}

async fn create_table<E>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);
    let stmt = builder.build(schema.create_table_from_entity(entity).if_not_exists());
    db.execute(stmt).await?;
    Ok(())
}

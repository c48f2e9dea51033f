//! Database layer for the talent show.
//!
//! Entities, migrations and repositories over `sea-orm`. Every repository
//! maps driver failures through [`db_err`] so callers see one error shape.

pub mod entities;
pub mod migrations;
pub mod repositories;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr, SqlErr};
use std::time::Duration;
use talentshow_common::{AppError, Config};
use tracing::log::LevelFilter;

/// Initialize database connection.
pub async fn init(config: &Config) -> Result<DatabaseConnection, AppError> {
    let mut opt = ConnectOptions::new(&config.database.url);

    opt.max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(LevelFilter::Debug);

    Database::connect(opt).await.map_err(db_err)
}

/// Run pending migrations.
pub async fn migrate(db: &DatabaseConnection) -> Result<(), AppError> {
    use sea_orm_migration::MigratorTrait;
    migrations::Migrator::up(db, None).await.map_err(db_err)
}

/// Classify a driver error.
///
/// Connection failures become [`AppError::StoreUnavailable`] (retryable),
/// unique violations become [`AppError::Conflict`].
#[must_use]
pub fn db_err(err: DbErr) -> AppError {
    match &err {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => AppError::StoreUnavailable(err.to_string()),
        DbErr::RecordNotFound(what) => AppError::NotFound(what.clone()),
        _ => match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => AppError::Conflict(detail),
            _ => AppError::Database(err.to_string()),
        },
    }
}

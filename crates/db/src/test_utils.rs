//! Test utilities for database operations.
//!
//! Provides an in-memory SQLite database with all migrations applied, so
//! service and API tests run without an external server.

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use tracing::debug;

use crate::migrations::Migrator;

/// A migrated in-memory test database.
pub struct TestDatabase {
    /// Database connection.
    pub conn: Arc<DatabaseConnection>,
}

impl TestDatabase {
    /// Create a fresh database and run all migrations.
    ///
    /// The pool is pinned to a single connection: each SQLite in-memory
    /// connection is its own database.
    pub async fn new() -> Result<Self, DbErr> {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;
        Migrator::up(&conn, None).await?;

        debug!("Created in-memory test database");

        Ok(Self {
            conn: Arc::new(conn),
        })
    }

    /// Get a shared handle to the connection.
    #[must_use]
    pub fn connection(&self) -> Arc<DatabaseConnection> {
        self.conn.clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::Act;
    use sea_orm::{EntityTrait, PaginatorTrait};

    #[tokio::test]
    async fn test_new_database_is_migrated_and_empty() {
        let db = TestDatabase::new().await.unwrap();
        let count = Act::find().count(db.conn.as_ref()).await.unwrap();
        assert_eq!(count, 0);
    }
}

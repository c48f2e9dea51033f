//! Trivia repository.

use std::sync::Arc;

use crate::db_err;
use crate::entities::{Trivia, TriviaTally, trivia, trivia_tally};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
    sea_query::{Expr, OnConflict},
};
use talentshow_common::{AppError, AppResult};

/// Trivia repository for database operations.
#[derive(Clone)]
pub struct TriviaRepository {
    db: Arc<DatabaseConnection>,
}

impl TriviaRepository {
    /// Create a new trivia repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a trivia question by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<trivia::Model>> {
        Trivia::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Find a trivia question by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<trivia::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Trivia: {id}")))
    }

    /// All trivia questions, newest first.
    pub async fn list_all(&self) -> AppResult<Vec<trivia::Model>> {
        Trivia::find()
            .order_by_desc(trivia::Column::CreatedAt)
            .order_by_desc(trivia::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Every trivia question flagged active, lowest id first.
    pub async fn find_active(&self) -> AppResult<Vec<trivia::Model>> {
        Trivia::find()
            .filter(trivia::Column::IsActive.eq(true))
            .order_by_asc(trivia::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Create a new trivia question.
    ///
    /// A question created active displaces any other active one in the same
    /// transaction.
    pub async fn create(&self, model: trivia::ActiveModel) -> AppResult<trivia::Model> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let created = model.insert(&txn).await.map_err(db_err)?;

        if created.is_active {
            Trivia::update_many()
                .col_expr(trivia::Column::IsActive, Expr::value(false))
                .filter(trivia::Column::IsActive.eq(true))
                .filter(trivia::Column::Id.ne(created.id.as_str()))
                .exec(&txn)
                .await
                .map_err(db_err)?;
        }

        txn.commit().await.map_err(db_err)?;
        Ok(created)
    }

    /// Make `id` the only active trivia question.
    pub async fn activate_exclusive(&self, id: &str) -> AppResult<()> {
        let txn = self.db.begin().await.map_err(db_err)?;

        if Trivia::find_by_id(id).one(&txn).await.map_err(db_err)?.is_none() {
            return Err(AppError::NotFound(format!("Trivia: {id}")));
        }

        Trivia::update_many()
            .col_expr(trivia::Column::IsActive, Expr::value(false))
            .filter(trivia::Column::IsActive.eq(true))
            .filter(trivia::Column::Id.ne(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        Trivia::update_many()
            .col_expr(trivia::Column::IsActive, Expr::value(true))
            .filter(trivia::Column::Id.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)
    }

    /// Clear `is_active` on one trivia question.
    pub async fn deactivate(&self, id: &str) -> AppResult<()> {
        let result = Trivia::update_many()
            .col_expr(trivia::Column::IsActive, Expr::value(false))
            .filter(trivia::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Trivia: {id}")));
        }
        Ok(())
    }

    /// Delete a trivia question and its tallies.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let result = Trivia::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Trivia: {id}")));
        }
        Ok(())
    }

    /// Add one answer to an option's counter.
    ///
    /// Single upsert: inserts the row at 1 or bumps the existing count in
    /// place, without reading it first.
    pub async fn increment_tally(&self, trivia_id: &str, option_index: i32) -> AppResult<()> {
        let tally = trivia_tally::ActiveModel {
            trivia_id: Set(trivia_id.to_string()),
            option_index: Set(option_index),
            answer_count: Set(1),
        };

        TriviaTally::insert(tally)
            .on_conflict(
                OnConflict::columns([
                    trivia_tally::Column::TriviaId,
                    trivia_tally::Column::OptionIndex,
                ])
                .value(
                    trivia_tally::Column::AnswerCount,
                    Expr::col((TriviaTally, trivia_tally::Column::AnswerCount)).add(1),
                )
                .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// Tally rows for a question, by option index.
    pub async fn tallies(&self, trivia_id: &str) -> AppResult<Vec<trivia_tally::Model>> {
        TriviaTally::find()
            .filter(trivia_tally::Column::TriviaId.eq(trivia_id))
            .order_by_asc(trivia_tally::Column::OptionIndex)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_trivia(id: &str, is_active: bool) -> trivia::Model {
        trivia::Model {
            id: id.to_string(),
            question: "What is our school's motto?".to_string(),
            options: serde_json::json!(["Learn and grow", "Excellence in all", "Together we can"]),
            correct_option: 1,
            is_active,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_active() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_trivia("t1", true)]])
                .into_connection(),
        );

        let repo = TriviaRepository::new(db);
        let active = repo.find_active().await.unwrap();

        assert_eq!(active.len(), 1);
        assert_eq!(active[0].option_list().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_tallies() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    trivia_tally::Model {
                        trivia_id: "t1".to_string(),
                        option_index: 0,
                        answer_count: 3,
                    },
                    trivia_tally::Model {
                        trivia_id: "t1".to_string(),
                        option_index: 2,
                        answer_count: 1,
                    },
                ]])
                .into_connection(),
        );

        let repo = TriviaRepository::new(db);
        let tallies = repo.tallies("t1").await.unwrap();

        assert_eq!(tallies.len(), 2);
        assert_eq!(tallies[0].answer_count, 3);
        assert_eq!(tallies[1].option_index, 2);
    }

    #[tokio::test]
    async fn test_increment_tally_is_single_statement() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = TriviaRepository::new(db.clone());
        repo.increment_tally("t1", 2).await.unwrap();
        drop(repo);

        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        assert_eq!(log.len(), 1);
    }

    #[tokio::test]
    async fn test_deactivate_missing_is_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = TriviaRepository::new(db);
        assert!(matches!(
            repo.deactivate("missing").await,
            Err(AppError::NotFound(_))
        ));
    }
}

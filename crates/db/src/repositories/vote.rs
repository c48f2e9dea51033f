//! Vote repository.

use std::sync::Arc;

use crate::db_err;
use crate::entities::{Act, Vote, act, vote};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, TransactionTrait, sea_query::Expr,
};
use talentshow_common::AppResult;

/// Vote repository for database operations.
#[derive(Clone)]
pub struct VoteRepository {
    db: Arc<DatabaseConnection>,
}

impl VoteRepository {
    /// Create a new vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a vote by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<vote::Model>> {
        Vote::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Find the vote an identified voter cast on an act.
    pub async fn find_by_act_and_user(
        &self,
        act_id: &str,
        user_id: &str,
    ) -> AppResult<Option<vote::Model>> {
        Vote::find()
            .filter(vote::Column::ActId.eq(act_id))
            .filter(vote::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// All votes for an act, oldest first.
    pub async fn find_by_act(&self, act_id: &str) -> AppResult<Vec<vote::Model>> {
        Vote::find()
            .filter(vote::Column::ActId.eq(act_id))
            .order_by_asc(vote::Column::CreatedAt)
            .order_by_asc(vote::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Count votes for an act.
    pub async fn count_by_act(&self, act_id: &str) -> AppResult<u64> {
        Vote::find()
            .filter(vote::Column::ActId.eq(act_id))
            .count(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Insert a vote and fold its rating into the act aggregate.
    ///
    /// Both writes share one transaction. The aggregate update only matches
    /// an act whose voting is open; if it matches nothing the vote insert is
    /// rolled back and `Ok(None)` is returned.
    pub async fn record(&self, model: vote::ActiveModel) -> AppResult<Option<vote::Model>> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let vote = model.insert(&txn).await.map_err(db_err)?;

        let result = Act::update_many()
            .col_expr(
                act::Column::VotesCount,
                Expr::col(act::Column::VotesCount).add(1),
            )
            .col_expr(
                act::Column::ScoreSum,
                Expr::col(act::Column::ScoreSum).add(i64::from(vote.rating)),
            )
            .filter(act::Column::Id.eq(vote.act_id.as_str()))
            .filter(act::Column::IsVotingOpen.eq(true))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            txn.rollback().await.map_err(db_err)?;
            return Ok(None);
        }

        txn.commit().await.map_err(db_err)?;
        Ok(Some(vote))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Set};

    fn create_test_vote(id: &str, act_id: &str, rating: i32, user_id: Option<&str>) -> vote::Model {
        vote::Model {
            id: id.to_string(),
            act_id: act_id.to_string(),
            rating,
            user_id: user_id.map(ToString::to_string),
            created_at: Utc::now().into(),
        }
    }

    fn active_vote(vote: &vote::Model) -> vote::ActiveModel {
        vote::ActiveModel {
            id: Set(vote.id.clone()),
            act_id: Set(vote.act_id.clone()),
            rating: Set(vote.rating),
            user_id: Set(vote.user_id.clone()),
            created_at: Set(vote.created_at),
        }
    }

    #[tokio::test]
    async fn test_find_by_act_and_user_found() {
        let vote = create_test_vote("v1", "a1", 4, Some("device-1"));

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[vote.clone()]])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let found = repo
            .find_by_act_and_user("a1", "device-1")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.id, "v1");
        assert_eq!(found.rating, 4);
    }

    #[tokio::test]
    async fn test_record_commits_when_voting_open() {
        let vote = create_test_vote("v1", "a1", 5, None);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[vote.clone()]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let recorded = repo.record(active_vote(&vote)).await.unwrap();

        assert_eq!(recorded.unwrap().rating, 5);
    }

    #[tokio::test]
    async fn test_record_rolls_back_when_voting_closed() {
        let vote = create_test_vote("v1", "a1", 3, Some("device-1"));

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[vote.clone()]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let recorded = repo.record(active_vote(&vote)).await.unwrap();

        assert!(recorded.is_none());
    }
}

//! Act repository.

use std::sync::Arc;

use crate::db_err;
use crate::entities::{Act, act, act::ActStatus, notification};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait, prelude::DateTimeWithTimeZone, sea_query::Expr,
};
use talentshow_common::{AppError, AppResult};

/// Running order applied when a pending act is moderated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderAssignment {
    /// Leave `order` as it is
    Keep,
    /// Use this position
    At(i32),
    /// One past the highest order in use
    Next,
}

/// Act repository for database operations.
#[derive(Clone)]
pub struct ActRepository {
    db: Arc<DatabaseConnection>,
}

impl ActRepository {
    /// Create a new act repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an act by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<act::Model>> {
        Act::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Find an act by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<act::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Act: {id}")))
    }

    /// All acts in running order.
    ///
    /// Ties on `order` (every fresh registration sits at 0) fall back to
    /// creation time, then id, so the sequence is stable.
    pub async fn list_ordered(&self) -> AppResult<Vec<act::Model>> {
        Act::find()
            .order_by_asc(act::Column::Order)
            .order_by_asc(act::Column::CreatedAt)
            .order_by_asc(act::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Acts with the given status, newest submission first.
    pub async fn find_by_status(&self, status: ActStatus) -> AppResult<Vec<act::Model>> {
        Act::find()
            .filter(act::Column::Status.eq(status))
            .order_by_desc(act::Column::SubmissionDate)
            .order_by_desc(act::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Every act currently flagged active, lowest id first.
    pub async fn find_active(&self) -> AppResult<Vec<act::Model>> {
        Act::find()
            .filter(act::Column::IsActive.eq(true))
            .order_by_asc(act::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Highest `order` value in use, if any act exists.
    pub async fn max_order(&self) -> AppResult<Option<i32>> {
        let last = Act::find()
            .order_by_desc(act::Column::Order)
            .one(self.db.as_ref())
            .await
            .map_err(db_err)?;
        Ok(last.map(|a| a.order))
    }

    /// Create a new act.
    pub async fn create(&self, model: act::ActiveModel) -> AppResult<act::Model> {
        model.insert(self.db.as_ref()).await.map_err(db_err)
    }

    /// Delete an act. Votes and comments go with it.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let result = Act::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Act: {id}")));
        }
        Ok(())
    }

    /// Make `id` the only active act.
    ///
    /// Every other active act loses both `is_active` and `is_voting_open`
    /// in the same transaction that flags the target.
    pub async fn activate_exclusive(&self, id: &str) -> AppResult<()> {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let txn = self.db.begin().await.map_err(db_err)?;

        if Act::find_by_id(id).one(&txn).await.map_err(db_err)?.is_none() {
            return Err(AppError::NotFound(format!("Act: {id}")));
        }

        Act::update_many()
            .col_expr(act::Column::IsActive, Expr::value(false))
            .col_expr(act::Column::IsVotingOpen, Expr::value(false))
            .col_expr(act::Column::LastUpdated, Expr::value(now))
            .col_expr(act::Column::UpdatedAt, Expr::value(now))
            .filter(act::Column::IsActive.eq(true))
            .filter(act::Column::Id.ne(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        Act::update_many()
            .col_expr(act::Column::IsActive, Expr::value(true))
            .col_expr(act::Column::LastUpdated, Expr::value(now))
            .col_expr(act::Column::UpdatedAt, Expr::value(now))
            .filter(act::Column::Id.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)
    }

    /// Clear `is_active` and `is_voting_open` on one act.
    pub async fn deactivate(&self, id: &str) -> AppResult<u64> {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let result = Act::update_many()
            .col_expr(act::Column::IsActive, Expr::value(false))
            .col_expr(act::Column::IsVotingOpen, Expr::value(false))
            .col_expr(act::Column::LastUpdated, Expr::value(now))
            .col_expr(act::Column::UpdatedAt, Expr::value(now))
            .filter(act::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected)
    }

    /// Toggle `is_voting_open`, only on an active act.
    ///
    /// Returns the number of rows changed; zero means the act is missing or
    /// not active.
    pub async fn set_voting_open(&self, id: &str, open: bool) -> AppResult<u64> {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let result = Act::update_many()
            .col_expr(act::Column::IsVotingOpen, Expr::value(open))
            .col_expr(act::Column::UpdatedAt, Expr::value(now))
            .filter(act::Column::Id.eq(id))
            .filter(act::Column::IsActive.eq(true))
            .exec(self.db.as_ref())
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected)
    }

    /// Write an edited act and, when given, its notice in one transaction.
    pub async fn update_with_notice(
        &self,
        model: act::ActiveModel,
        notice: Option<notification::ActiveModel>,
    ) -> AppResult<(act::Model, Option<notification::Model>)> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let updated = model.update(&txn).await.map_err(db_err)?;
        let recorded = match notice {
            Some(notice) => Some(notice.insert(&txn).await.map_err(db_err)?),
            None => None,
        };
        txn.commit().await.map_err(db_err)?;
        Ok((updated, recorded))
    }

    /// Move a pending act to `status` and record the notice built from the
    /// updated row, in one transaction.
    ///
    /// [`OrderAssignment::Next`] reads the highest order inside the same
    /// transaction. Returns `None`, with nothing written, when the act is
    /// missing or no longer pending.
    pub async fn moderate<F>(
        &self,
        id: &str,
        status: ActStatus,
        order: OrderAssignment,
        notice: F,
    ) -> AppResult<Option<(act::Model, notification::Model)>>
    where
        F: FnOnce(&act::Model) -> notification::ActiveModel + Send,
    {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let txn = self.db.begin().await.map_err(db_err)?;

        let order = match order {
            OrderAssignment::Keep => None,
            OrderAssignment::At(order) => Some(order),
            OrderAssignment::Next => {
                let last = Act::find()
                    .order_by_desc(act::Column::Order)
                    .one(&txn)
                    .await
                    .map_err(db_err)?;
                Some(last.map_or(1, |a| a.order + 1))
            }
        };

        let mut update = Act::update_many()
            .col_expr(act::Column::Status, Expr::value(status.as_str()))
            .col_expr(act::Column::LastUpdated, Expr::value(now))
            .col_expr(act::Column::UpdatedAt, Expr::value(now));
        if let Some(order) = order {
            update = update.col_expr(act::Column::Order, Expr::value(order));
        }
        let result = update
            .filter(act::Column::Id.eq(id))
            .filter(act::Column::Status.eq(ActStatus::Pending))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Ok(None);
        }

        let moderated = Act::find_by_id(id)
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::NotFound(format!("Act: {id}")))?;
        let recorded = notice(&moderated).insert(&txn).await.map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        Ok(Some((moderated, recorded)))
    }
}

//! Notification repository.

use std::sync::Arc;

use crate::db_err;
use crate::entities::{Notification, notification};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    sea_query::Expr,
};
use talentshow_common::{AppError, AppResult};

/// Notification repository for database operations.
#[derive(Clone)]
pub struct NotificationRepository {
    db: Arc<DatabaseConnection>,
}

impl NotificationRepository {
    /// Create a new notification repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a notification by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<notification::Model>> {
        Notification::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Create a new notification.
    pub async fn create(
        &self,
        model: notification::ActiveModel,
    ) -> AppResult<notification::Model> {
        model.insert(self.db.as_ref()).await.map_err(db_err)
    }

    /// Notifications, newest first.
    pub async fn list(&self, unread_only: bool) -> AppResult<Vec<notification::Model>> {
        let mut query = Notification::find()
            .order_by_desc(notification::Column::CreatedAt)
            .order_by_desc(notification::Column::Id);

        if unread_only {
            query = query.filter(notification::Column::IsRead.eq(false));
        }

        query.all(self.db.as_ref()).await.map_err(db_err)
    }

    /// Notifications about one act, newest first.
    pub async fn find_by_act(&self, act_id: &str) -> AppResult<Vec<notification::Model>> {
        Notification::find()
            .filter(notification::Column::ActId.eq(act_id))
            .order_by_desc(notification::Column::CreatedAt)
            .order_by_desc(notification::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Mark a notification as read.
    pub async fn mark_read(&self, id: &str) -> AppResult<()> {
        let result = Notification::update_many()
            .col_expr(notification::Column::IsRead, Expr::value(true))
            .filter(notification::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Notification: {id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::notification::NotificationType;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_notification(id: &str, is_read: bool) -> notification::Model {
        notification::Model {
            id: id.to_string(),
            act_id: "a1".to_string(),
            submitted_by: "Jane Doe".to_string(),
            contact_email: Some("jane@example.com".to_string()),
            notification_type: NotificationType::Edit,
            message: "Your act was edited".to_string(),
            edit_history: serde_json::json!([
                {"field": "name", "oldValue": "Magic", "newValue": "Magic Show"}
            ]),
            is_read,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_list_unread() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_notification("n1", false)]])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);
        let list = repo.list(true).await.unwrap();

        assert_eq!(list.len(), 1);
        let entries = list[0].edit_entries().unwrap();
        assert_eq!(entries[0].field, "name");
        assert_eq!(entries[0].new_value, "Magic Show");
    }

    #[tokio::test]
    async fn test_mark_read_missing_is_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);
        assert!(matches!(
            repo.mark_read("missing").await,
            Err(AppError::NotFound(_))
        ));
    }
}

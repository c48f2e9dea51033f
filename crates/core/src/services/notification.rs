//! Notification service.
//!
//! Builds notices for act submitters. The act service stores them in the
//! same transaction as the act change; [`NotificationService::dispatch`]
//! then announces them and hands them to the delivery collaborator when the
//! act carries a contact email.

use crate::services::change_feed::{ChangeEvent, ChangeFeedService, Collection, publish_logged};
use crate::services::delivery::DeliveryService;
use chrono::Utc;
use sea_orm::Set;
use serde_json::Value as JsonValue;
use std::fmt::Write as _;
use talentshow_common::{AppError, AppResult, IdGenerator};
use talentshow_db::{
    entities::{
        act,
        notification::{self, EditEntry, NotificationType},
    },
    repositories::NotificationRepository,
};
use tracing::{info, warn};

/// Notification service for business logic.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
    delivery: DeliveryService,
    feed: ChangeFeedService,
    id_gen: IdGenerator,
}

/// Rendered email for a notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedNotice {
    pub subject: String,
    pub body: String,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(
        notification_repo: NotificationRepository,
        delivery: DeliveryService,
        feed: ChangeFeedService,
    ) -> Self {
        Self {
            notification_repo,
            delivery,
            feed,
            id_gen: IdGenerator::new(),
        }
    }

    /// Notice row for an admin edit. Returns `None` when nothing changed.
    pub fn edit_notice(
        &self,
        act: &act::Model,
        entries: &[EditEntry],
        admin: &str,
    ) -> AppResult<Option<notification::ActiveModel>> {
        if entries.is_empty() {
            return Ok(None);
        }

        let fields: Vec<&str> = entries.iter().map(|e| e.field.as_str()).collect();
        let message = format!("{admin} edited {}: {}", act.name, fields.join(", "));
        let edit_history = serde_json::to_value(entries)
            .map_err(|e| AppError::Internal(format!("Failed to encode edit history: {e}")))?;

        Ok(Some(self.notice(act, NotificationType::Edit, message, edit_history)))
    }

    /// Notice row for an approval.
    #[must_use]
    pub fn approved_notice(&self, act: &act::Model) -> notification::ActiveModel {
        let message = format!("{} was approved (position {})", act.name, act.order);
        self.notice(act, NotificationType::Approve, message, JsonValue::Array(Vec::new()))
    }

    /// Notice row for a rejection.
    #[must_use]
    pub fn rejected_notice(&self, act: &act::Model) -> notification::ActiveModel {
        let message = format!("{} was rejected", act.name);
        self.notice(act, NotificationType::Reject, message, JsonValue::Array(Vec::new()))
    }

    /// Announce a stored notice and mail it when the act has a contact
    /// email. Delivery failures are logged, never returned.
    pub async fn dispatch(
        &self,
        recorded: &notification::Model,
        act: &act::Model,
        rendered: RenderedNotice,
    ) {
        info!(
            notification_id = %recorded.id,
            act_id = %act.id,
            kind = ?recorded.notification_type,
            "Notification recorded"
        );

        publish_logged(
            self.feed.as_ref(),
            ChangeEvent::created(Collection::Notifications, &recorded.id),
        )
        .await;

        if let Some(email) = act.contact_email.as_deref() {
            if let Err(e) = self
                .delivery
                .deliver(email, &rendered.subject, &rendered.body)
                .await
            {
                warn!(
                    notification_id = %recorded.id,
                    to = %email,
                    error = %e,
                    "Notification delivery failed"
                );
            }
        }
    }

    /// List notifications, newest first.
    pub async fn list(&self, unread_only: bool) -> AppResult<Vec<notification::Model>> {
        self.notification_repo.list(unread_only).await
    }

    /// Notifications about one act, newest first.
    pub async fn list_for_act(&self, act_id: &str) -> AppResult<Vec<notification::Model>> {
        self.notification_repo.find_by_act(act_id).await
    }

    /// Mark a notification as read.
    pub async fn mark_read(&self, id: &str) -> AppResult<notification::Model> {
        self.notification_repo.mark_read(id).await?;
        publish_logged(
            self.feed.as_ref(),
            ChangeEvent::updated(Collection::Notifications, id),
        )
        .await;
        self.notification_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Notification: {id}")))
    }

    fn notice(
        &self,
        act: &act::Model,
        notification_type: NotificationType,
        message: String,
        edit_history: JsonValue,
    ) -> notification::ActiveModel {
        notification::ActiveModel {
            id: Set(self.id_gen.generate()),
            act_id: Set(act.id.clone()),
            submitted_by: Set(act.submitted_by.clone()),
            contact_email: Set(act.contact_email.clone()),
            notification_type: Set(notification_type),
            message: Set(message),
            edit_history: Set(edit_history),
            is_read: Set(false),
            created_at: Set(Utc::now().into()),
        }
    }
}

/// Subject and body for an edit notice.
#[must_use]
pub fn render_edit(act: &act::Model, entries: &[EditEntry], admin: &str) -> RenderedNotice {
    let subject = format!("Your talent show act \"{}\" was updated", act.name);
    let mut body = format!(
        "Hello {},\n\n{admin} made the following changes to your act:\n\n",
        act.submitted_by
    );
    for entry in entries {
        let _ = writeln!(
            body,
            "  {}: \"{}\" -> \"{}\"",
            entry.field, entry.old_value, entry.new_value
        );
    }
    body.push_str("\nIf anything looks wrong, please contact the show organisers.\n");
    RenderedNotice { subject, body }
}

/// Subject and body for an approval notice.
#[must_use]
pub fn render_approved(act: &act::Model) -> RenderedNotice {
    RenderedNotice {
        subject: format!("Your talent show act \"{}\" was approved", act.name),
        body: format!(
            "Hello {},\n\nGreat news: \"{}\" ({}) is in the show. \
             It is number {} in the running order.\n",
            act.submitted_by, act.name, act.grade, act.order
        ),
    }
}

/// Subject and body for a rejection notice.
#[must_use]
pub fn render_rejected(act: &act::Model) -> RenderedNotice {
    RenderedNotice {
        subject: format!("Your talent show act \"{}\" was not accepted", act.name),
        body: format!(
            "Hello {},\n\nThank you for submitting \"{}\" ({}). \
             Unfortunately it could not be included in this year's show.\n",
            act.submitted_by, act.name, act.grade
        ),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::change_feed::LocalChangeFeed;
    use crate::services::delivery::NotificationDelivery;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use talentshow_db::entities::act::ActStatus;
    use talentshow_db::test_utils::TestDatabase;

    #[derive(Default)]
    struct RecordingDelivery {
        sent: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl NotificationDelivery for RecordingDelivery {
        async fn deliver(&self, email: &str, subject: &str, _body: &str) -> AppResult<()> {
            self.sent
                .lock()
                .unwrap()
                .push((email.to_string(), subject.to_string()));
            if self.fail {
                return Err(AppError::ExternalService("smtp down".to_string()));
            }
            Ok(())
        }
    }

    fn test_act(email: Option<&str>) -> act::Model {
        let now = Utc::now().into();
        act::Model {
            id: "a1".to_string(),
            name: "Magic Show".to_string(),
            grade: "Grade 3".to_string(),
            description: "Tricks".to_string(),
            order: 4,
            is_active: false,
            is_voting_open: false,
            score_sum: 0,
            votes_count: 0,
            status: ActStatus::Approved,
            submitted_by: "Jane Doe".to_string(),
            contact_email: email.map(ToString::to_string),
            contact_phone: None,
            submission_date: now,
            last_updated: now,
            created_at: now,
            updated_at: now,
        }
    }

    fn name_change() -> Vec<EditEntry> {
        vec![EditEntry {
            field: "name".to_string(),
            old_value: "Magic".to_string(),
            new_value: "Magic Show".to_string(),
        }]
    }

    async fn service(delivery: Arc<RecordingDelivery>) -> (TestDatabase, NotificationService) {
        let db = TestDatabase::new().await.unwrap();
        let service = NotificationService::new(
            NotificationRepository::new(db.connection()),
            delivery,
            Arc::new(LocalChangeFeed::default()),
        );
        (db, service)
    }

    async fn store(db: &TestDatabase, model: notification::ActiveModel) -> notification::Model {
        NotificationRepository::new(db.connection())
            .create(model)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_edit_notice_dispatch_delivers() {
        let delivery = Arc::new(RecordingDelivery::default());
        let (db, service) = service(delivery.clone()).await;
        let act = test_act(Some("jane@example.com"));

        let notice = service
            .edit_notice(&act, &name_change(), "admin@x.com")
            .unwrap()
            .unwrap();
        let recorded = store(&db, notice).await;
        service
            .dispatch(&recorded, &act, render_edit(&act, &name_change(), "admin@x.com"))
            .await;

        assert_eq!(recorded.notification_type, NotificationType::Edit);
        assert_eq!(recorded.edit_entries().unwrap(), name_change());
        assert_eq!(recorded.message, "admin@x.com edited Magic Show: name");
        assert!(!recorded.is_read);

        let sent = delivery.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "jane@example.com");
    }

    #[tokio::test]
    async fn test_edit_notice_without_changes_is_none() {
        let (_db, service) = service(Arc::new(RecordingDelivery::default())).await;

        let notice = service
            .edit_notice(&test_act(Some("jane@example.com")), &[], "admin@x.com")
            .unwrap();

        assert!(notice.is_none());
    }

    #[tokio::test]
    async fn test_no_email_means_no_delivery() {
        let delivery = Arc::new(RecordingDelivery::default());
        let (db, service) = service(delivery.clone()).await;
        let act = test_act(None);

        let recorded = store(&db, service.rejected_notice(&act)).await;
        service.dispatch(&recorded, &act, render_rejected(&act)).await;

        assert!(delivery.sent.lock().unwrap().is_empty());
        assert_eq!(service.list(true).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delivery_failure_is_not_escalated() {
        let delivery = Arc::new(RecordingDelivery {
            fail: true,
            ..RecordingDelivery::default()
        });
        let (db, service) = service(delivery.clone()).await;
        let act = test_act(Some("jane@example.com"));

        let recorded = store(&db, service.approved_notice(&act)).await;
        service.dispatch(&recorded, &act, render_approved(&act)).await;

        assert_eq!(delivery.sent.lock().unwrap().len(), 1);
        assert_eq!(recorded.message, "Magic Show was approved (position 4)");
    }

    #[tokio::test]
    async fn test_mark_read() {
        let (db, service) = service(Arc::new(RecordingDelivery::default())).await;

        let recorded = store(&db, service.rejected_notice(&test_act(None))).await;
        let read = service.mark_read(&recorded.id).await.unwrap();

        assert!(read.is_read);
        assert!(service.list(true).await.unwrap().is_empty());
    }

    #[test]
    fn test_render_edit_lists_every_change() {
        let rendered = render_edit(&test_act(None), &name_change(), "admin@x.com");
        assert!(rendered.subject.contains("Magic Show"));
        assert!(rendered.body.contains("admin@x.com"));
        assert!(rendered.body.contains("name: \"Magic\" -> \"Magic Show\""));
    }

    #[test]
    fn test_render_approved_mentions_position() {
        let rendered = render_approved(&test_act(None));
        assert!(rendered.body.contains("number 4"));
    }
}

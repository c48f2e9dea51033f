//! Act lifecycle service.
//!
//! Registration and moderation (`pending -> approved | rejected`), admin
//! edits with an audit trail, and the exclusivity rules for the live act.

use crate::services::change_feed::{ChangeEvent, ChangeFeedService, Collection, publish_logged};
use crate::services::edit_history::{EDITABLE_ACT_FIELDS, diff_fields};
use crate::services::notification::{
    NotificationService, render_approved, render_edit, render_rejected,
};
use crate::services::retry::RetryPolicy;
use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use talentshow_common::{AppError, AppResult, IdGenerator};
use talentshow_db::{
    entities::{
        act::{self, ActStatus},
        notification,
    },
    repositories::{ActRepository, OrderAssignment},
};
use tracing::{info, warn};
use validator::Validate;

/// Act service for business logic.
#[derive(Clone)]
pub struct ActService {
    act_repo: ActRepository,
    notifications: NotificationService,
    feed: ChangeFeedService,
    retry: RetryPolicy,
    id_gen: IdGenerator,
}

/// Input for a self-service act registration.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterActInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(length(min = 1, max = 50))]
    pub grade: String,

    #[validate(length(max = 1000))]
    #[serde(default)]
    pub description: String,

    /// Name or contact of whoever submits the act
    #[validate(length(min = 1, max = 200))]
    pub submitted_by: String,

    #[validate(email)]
    pub contact_email: Option<String>,

    #[validate(length(max = 32))]
    pub contact_phone: Option<String>,
}

/// Input for an admin-created act.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateActInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(length(min = 1, max = 50))]
    pub grade: String,

    #[validate(length(max = 1000))]
    #[serde(default)]
    pub description: String,

    /// Running order; defaults to the next free position
    #[validate(range(min = 0))]
    pub order: Option<i32>,

    #[validate(length(min = 1, max = 200))]
    pub submitted_by: Option<String>,

    #[validate(email)]
    pub contact_email: Option<String>,

    #[validate(length(max = 32))]
    pub contact_phone: Option<String>,
}

/// Input for an admin edit. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EditActInput {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 50))]
    pub grade: Option<String>,

    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

/// Result of an admin edit.
#[derive(Debug, Clone)]
pub struct EditOutcome {
    pub act: act::Model,
    /// Present when at least one field changed
    pub notification: Option<notification::Model>,
}

fn trimmed(value: &str) -> String {
    value.trim().to_string()
}

/// Trim, mapping blank to `None`.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ActService {
    /// Create a new act service.
    #[must_use]
    pub const fn new(
        act_repo: ActRepository,
        notifications: NotificationService,
        feed: ChangeFeedService,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            act_repo,
            notifications,
            feed,
            retry,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register an act for moderation. Starts pending at order 0.
    pub async fn register_act(&self, input: RegisterActInput) -> AppResult<act::Model> {
        let input = RegisterActInput {
            name: trimmed(&input.name),
            grade: trimmed(&input.grade),
            description: trimmed(&input.description),
            submitted_by: trimmed(&input.submitted_by),
            contact_email: non_blank(input.contact_email),
            contact_phone: non_blank(input.contact_phone),
        };
        input.validate()?;

        let model = self.new_model(
            input.name,
            input.grade,
            input.description,
            0,
            ActStatus::Pending,
            input.submitted_by,
            input.contact_email,
            input.contact_phone,
        );
        let created = self.act_repo.create(model).await?;

        info!(act_id = %created.id, name = %created.name, "Act registered");
        self.publish(ChangeEvent::created(Collection::Acts, &created.id))
            .await;
        Ok(created)
    }

    /// Create an approved act directly.
    pub async fn create_act(&self, input: CreateActInput) -> AppResult<act::Model> {
        let input = CreateActInput {
            name: trimmed(&input.name),
            grade: trimmed(&input.grade),
            description: trimmed(&input.description),
            order: input.order,
            submitted_by: non_blank(input.submitted_by),
            contact_email: non_blank(input.contact_email),
            contact_phone: non_blank(input.contact_phone),
        };
        input.validate()?;

        let order = match input.order {
            Some(order) => order,
            None => self.next_order().await?,
        };

        let model = self.new_model(
            input.name,
            input.grade,
            input.description,
            order,
            ActStatus::Approved,
            input.submitted_by.unwrap_or_else(|| "Admin".to_string()),
            input.contact_email,
            input.contact_phone,
        );
        let created = self.act_repo.create(model).await?;

        info!(act_id = %created.id, order, "Act created");
        self.publish(ChangeEvent::created(Collection::Acts, &created.id))
            .await;
        Ok(created)
    }

    /// Apply an admin edit and notify the submitter of what changed.
    ///
    /// The act is always written (timestamp refresh). A notification is
    /// recorded, and delivered if the act has a contact email, only when at
    /// least one tracked field actually changed.
    pub async fn edit_act(
        &self,
        id: &str,
        input: EditActInput,
        admin: &str,
    ) -> AppResult<EditOutcome> {
        let input = EditActInput {
            name: input.name.map(|v| trimmed(&v)),
            grade: input.grade.map(|v| trimmed(&v)),
            description: input.description.map(|v| trimmed(&v)),
        };
        input.validate()?;

        let old = self.act_repo.get_by_id(id).await?;

        let mut proposed = old.clone();
        if let Some(name) = input.name {
            proposed.name = name;
        }
        if let Some(grade) = input.grade {
            proposed.grade = grade;
        }
        if let Some(description) = input.description {
            proposed.description = description;
        }

        let entries = diff_fields(&old, &proposed, EDITABLE_ACT_FIELDS);
        let notice = self.notifications.edit_notice(&proposed, &entries, admin)?;
        let now = Utc::now().into();

        let mut active: act::ActiveModel = old.into();
        active.name = Set(proposed.name);
        active.grade = Set(proposed.grade);
        active.description = Set(proposed.description);
        active.updated_at = Set(now);
        if !entries.is_empty() {
            active.last_updated = Set(now);
        }
        let (updated, notification) = self.act_repo.update_with_notice(active, notice).await?;

        info!(act_id = %id, changed = entries.len(), %admin, "Act edited");
        self.publish(ChangeEvent::updated(Collection::Acts, id)).await;

        if let Some(recorded) = &notification {
            self.notifications
                .dispatch(recorded, &updated, render_edit(&updated, &entries, admin))
                .await;
        }

        Ok(EditOutcome {
            act: updated,
            notification,
        })
    }

    /// Delete an act with its votes and comments.
    pub async fn delete_act(&self, id: &str) -> AppResult<()> {
        self.act_repo.delete(id).await?;
        info!(act_id = %id, "Act deleted");
        self.publish(ChangeEvent::deleted(Collection::Acts, id)).await;
        Ok(())
    }

    /// Make `id` the live act.
    ///
    /// Every other active act is switched off (voting included) in the same
    /// transaction. Afterwards the active set is re-read; anything other than
    /// exactly the target is reported as [`AppError::PartialBatchFailure`].
    pub async fn activate(&self, id: &str) -> AppResult<act::Model> {
        let repo = &self.act_repo;
        self.retry
            .run("activate_act", move || repo.activate_exclusive(id))
            .await?;

        self.publish(ChangeEvent::updated(Collection::Acts, id)).await;

        let active = self.act_repo.find_active().await?;
        let target_active = active.iter().any(|a| a.id == id);
        let inconsistent: Vec<String> = active
            .into_iter()
            .filter(|a| a.id != id)
            .map(|a| a.id)
            .collect();
        if !target_active || !inconsistent.is_empty() {
            warn!(target = %id, ?inconsistent, "Activation left the active set inconsistent");
            return Err(AppError::PartialBatchFailure {
                target: id.to_string(),
                inconsistent,
            });
        }

        info!(act_id = %id, "Act activated");
        self.act_repo.get_by_id(id).await
    }

    /// Take `id` off stage, closing its voting.
    pub async fn deactivate(&self, id: &str) -> AppResult<act::Model> {
        if self.act_repo.deactivate(id).await? == 0 {
            return Err(AppError::NotFound(format!("Act: {id}")));
        }
        info!(act_id = %id, "Act deactivated");
        self.publish(ChangeEvent::updated(Collection::Acts, id)).await;
        self.act_repo.get_by_id(id).await
    }

    /// Open voting on the active act.
    pub async fn open_voting(&self, id: &str) -> AppResult<act::Model> {
        self.set_voting(id, true).await
    }

    /// Close voting on the active act.
    pub async fn close_voting(&self, id: &str) -> AppResult<act::Model> {
        self.set_voting(id, false).await
    }

    async fn set_voting(&self, id: &str, open: bool) -> AppResult<act::Model> {
        if self.act_repo.set_voting_open(id, open).await? == 0 {
            // Tell a missing act apart from an inactive one
            self.act_repo.get_by_id(id).await?;
            return Err(AppError::Conflict(format!("Act {id} is not active")));
        }
        info!(act_id = %id, open, "Voting toggled");
        self.publish(ChangeEvent::updated(Collection::Acts, id)).await;
        self.act_repo.get_by_id(id).await
    }

    /// Approve a pending act at running position `order`, or at the next
    /// free position when `order` is `None`.
    pub async fn approve_act(&self, id: &str, order: Option<i32>) -> AppResult<act::Model> {
        let order = match order {
            Some(order) if order < 0 => {
                return Err(AppError::Validation(format!(
                    "order must not be negative, got {order}"
                )));
            }
            Some(order) => OrderAssignment::At(order),
            None => OrderAssignment::Next,
        };
        let (act, recorded) = self
            .moderate(id, ActStatus::Approved, order, |act| {
                self.notifications.approved_notice(act)
            })
            .await?;
        self.notifications
            .dispatch(&recorded, &act, render_approved(&act))
            .await;
        Ok(act)
    }

    /// Reject a pending act.
    pub async fn reject_act(&self, id: &str) -> AppResult<act::Model> {
        let (act, recorded) = self
            .moderate(id, ActStatus::Rejected, OrderAssignment::Keep, |act| {
                self.notifications.rejected_notice(act)
            })
            .await?;
        self.notifications
            .dispatch(&recorded, &act, render_rejected(&act))
            .await;
        Ok(act)
    }

    /// Run a pending transition together with its notice.
    async fn moderate<F>(
        &self,
        id: &str,
        status: ActStatus,
        order: OrderAssignment,
        notice: F,
    ) -> AppResult<(act::Model, notification::Model)>
    where
        F: FnOnce(&act::Model) -> notification::ActiveModel + Send,
    {
        let Some((act, recorded)) = self.act_repo.moderate(id, status, order, notice).await? else {
            let current = self.act_repo.get_by_id(id).await?;
            return Err(AppError::Conflict(format!(
                "Act {id} is {}, not pending",
                current.status.as_str()
            )));
        };
        info!(act_id = %id, status = status.as_str(), order = act.order, "Act moderated");
        self.publish(ChangeEvent::updated(Collection::Acts, id)).await;
        Ok((act, recorded))
    }

    /// Get an act by ID.
    pub async fn get_act(&self, id: &str) -> AppResult<act::Model> {
        self.act_repo.get_by_id(id).await
    }

    /// All acts in running order.
    pub async fn list_acts(&self) -> AppResult<Vec<act::Model>> {
        self.act_repo.list_ordered().await
    }

    /// Acts with the given status, newest submission first.
    pub async fn get_acts_by_status(&self, status: ActStatus) -> AppResult<Vec<act::Model>> {
        self.act_repo.find_by_status(status).await
    }

    /// One past the highest order in use (1 when there are no acts).
    pub async fn next_order(&self) -> AppResult<i32> {
        Ok(self.act_repo.max_order().await?.map_or(1, |max| max + 1))
    }

    fn new_model(
        &self,
        name: String,
        grade: String,
        description: String,
        order: i32,
        status: ActStatus,
        submitted_by: String,
        contact_email: Option<String>,
        contact_phone: Option<String>,
    ) -> act::ActiveModel {
        let now = Utc::now().into();
        act::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(name),
            grade: Set(grade),
            description: Set(description),
            order: Set(order),
            is_active: Set(false),
            is_voting_open: Set(false),
            score_sum: Set(0),
            votes_count: Set(0),
            status: Set(status),
            submitted_by: Set(submitted_by),
            contact_email: Set(contact_email),
            contact_phone: Set(contact_phone),
            submission_date: Set(now),
            last_updated: Set(now),
            created_at: Set(now),
            updated_at: Set(now),
        }
    }

    async fn publish(&self, event: ChangeEvent) {
        publish_logged(self.feed.as_ref(), event).await;
    }
}

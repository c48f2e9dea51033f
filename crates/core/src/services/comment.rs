//! Comment service.
//!
//! Audience comments start hidden and only reach the audience feed once an
//! admin approves them.

use crate::services::change_feed::{ChangeEvent, ChangeFeedService, Collection, publish_logged};
use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use talentshow_common::{AppError, AppResult, IdGenerator};
use talentshow_db::{
    entities::comment,
    repositories::{ActRepository, CommentRepository},
};
use tracing::info;
use validator::Validate;

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    act_repo: ActRepository,
    feed: ChangeFeedService,
    id_gen: IdGenerator,
}

/// Input for submitting a comment.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitCommentInput {
    pub act_id: String,

    #[validate(length(max = 200))]
    pub text: Option<String>,

    #[validate(length(max = 16))]
    pub emoji: Option<String>,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(
        comment_repo: CommentRepository,
        act_repo: ActRepository,
        feed: ChangeFeedService,
    ) -> Self {
        Self {
            comment_repo,
            act_repo,
            feed,
            id_gen: IdGenerator::new(),
        }
    }

    /// Submit a comment for moderation.
    pub async fn submit_comment(&self, input: SubmitCommentInput) -> AppResult<comment::Model> {
        let input = SubmitCommentInput {
            act_id: input.act_id,
            text: input
                .text
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            emoji: input
                .emoji
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty()),
        };
        input.validate()?;

        if input.text.is_none() && input.emoji.is_none() {
            return Err(AppError::Validation(
                "A comment needs text or an emoji".to_string(),
            ));
        }

        self.act_repo.get_by_id(&input.act_id).await?;

        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            act_id: Set(input.act_id),
            text: Set(input.text),
            emoji: Set(input.emoji),
            approved: Set(false),
            created_at: Set(Utc::now().into()),
        };
        let created = self.comment_repo.create(model).await?;

        info!(comment_id = %created.id, act_id = %created.act_id, "Comment submitted");
        publish_logged(
            self.feed.as_ref(),
            ChangeEvent::created(Collection::Comments, &created.id),
        )
        .await;
        Ok(created)
    }

    /// Approve a comment, making it visible to the audience.
    pub async fn approve_comment(&self, id: &str) -> AppResult<comment::Model> {
        self.comment_repo.approve(id).await?;
        info!(comment_id = %id, "Comment approved");
        publish_logged(
            self.feed.as_ref(),
            ChangeEvent::updated(Collection::Comments, id),
        )
        .await;
        self.comment_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Comment: {id}")))
    }

    /// Delete a comment.
    pub async fn delete_comment(&self, id: &str) -> AppResult<()> {
        self.comment_repo.delete(id).await?;
        info!(comment_id = %id, "Comment deleted");
        publish_logged(
            self.feed.as_ref(),
            ChangeEvent::deleted(Collection::Comments, id),
        )
        .await;
        Ok(())
    }

    /// Comments awaiting moderation, oldest first.
    pub async fn list_pending(&self) -> AppResult<Vec<comment::Model>> {
        self.comment_repo.find_pending().await
    }

    /// Approved comments for an act, newest first.
    pub async fn list_approved(&self, act_id: &str) -> AppResult<Vec<comment::Model>> {
        self.comment_repo.find_approved_by_act(act_id).await
    }
}

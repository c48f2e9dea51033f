//! Voting service.

use crate::services::change_feed::{ChangeEvent, ChangeFeedService, Collection, publish_logged};
use crate::services::retry::RetryPolicy;
use chrono::Utc;
use sea_orm::Set;
use talentshow_common::{AppError, AppResult, IdGenerator};
use talentshow_db::{
    entities::vote,
    repositories::{ActRepository, VoteRepository},
};
use tracing::{debug, info};

/// Lowest accepted rating.
pub const MIN_RATING: i32 = 1;
/// Highest accepted rating.
pub const MAX_RATING: i32 = 5;

/// Voting service for business logic.
#[derive(Clone)]
pub struct VotingService {
    vote_repo: VoteRepository,
    act_repo: ActRepository,
    feed: ChangeFeedService,
    retry: RetryPolicy,
    id_gen: IdGenerator,
}

impl VotingService {
    /// Create a new voting service.
    #[must_use]
    pub const fn new(
        vote_repo: VoteRepository,
        act_repo: ActRepository,
        feed: ChangeFeedService,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            vote_repo,
            act_repo,
            feed,
            retry,
            id_gen: IdGenerator::new(),
        }
    }

    /// Cast a rating for an act.
    ///
    /// An identified voter gets one vote per act; a repeat returns
    /// [`AppError::AlreadyVoted`] carrying the stored vote. Anonymous votes
    /// (no or blank `voter_id`) are never deduplicated. Transient store
    /// failures are retried, and every attempt re-runs the duplicate check.
    pub async fn cast_vote(
        &self,
        act_id: &str,
        rating: i32,
        voter_id: Option<&str>,
    ) -> AppResult<vote::Model> {
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(AppError::Validation(format!(
                "rating must be between {MIN_RATING} and {MAX_RATING}, got {rating}"
            )));
        }
        let voter = voter_id.map(str::trim).filter(|v| !v.is_empty());

        let vote = self
            .retry
            .run("cast_vote", move || self.try_cast(act_id, rating, voter))
            .await?;

        info!(vote_id = %vote.id, act_id = %act_id, rating, anonymous = voter.is_none(), "Vote cast");
        publish_logged(
            self.feed.as_ref(),
            ChangeEvent::created(Collection::Votes, &vote.id),
        )
        .await;
        publish_logged(
            self.feed.as_ref(),
            ChangeEvent::updated(Collection::Acts, act_id),
        )
        .await;

        Ok(vote)
    }

    async fn try_cast(
        &self,
        act_id: &str,
        rating: i32,
        voter: Option<&str>,
    ) -> AppResult<vote::Model> {
        let act = self.act_repo.get_by_id(act_id).await?;
        if !act.is_voting_open {
            return Err(AppError::VotingClosed(act_id.to_string()));
        }

        if let Some(voter) = voter
            && let Some(existing) = self.vote_repo.find_by_act_and_user(act_id, voter).await?
        {
            return Err(already_voted(existing));
        }

        let model = vote::ActiveModel {
            id: Set(self.id_gen.generate()),
            act_id: Set(act_id.to_string()),
            rating: Set(rating),
            user_id: Set(voter.map(ToString::to_string)),
            created_at: Set(Utc::now().into()),
        };

        match self.vote_repo.record(model).await {
            Ok(Some(vote)) => Ok(vote),
            // Voting closed between the check and the write
            Ok(None) => Err(AppError::VotingClosed(act_id.to_string())),
            Err(AppError::Conflict(detail)) => {
                // Lost a race with the same voter on another connection
                let Some(voter) = voter else {
                    return Err(AppError::Conflict(detail));
                };
                debug!(act_id = %act_id, voter, "Duplicate vote caught by unique index");
                match self.vote_repo.find_by_act_and_user(act_id, voter).await? {
                    Some(existing) => Err(already_voted(existing)),
                    None => Err(AppError::Conflict(detail)),
                }
            }
            Err(e) => Err(e),
        }
    }

    /// The vote an identified voter cast on an act, if any.
    pub async fn find_vote(&self, act_id: &str, voter_id: &str) -> AppResult<Option<vote::Model>> {
        self.vote_repo.find_by_act_and_user(act_id, voter_id).await
    }

    /// All votes for an act, oldest first.
    pub async fn list_votes(&self, act_id: &str) -> AppResult<Vec<vote::Model>> {
        self.act_repo.get_by_id(act_id).await?;
        self.vote_repo.find_by_act(act_id).await
    }
}

fn already_voted(existing: vote::Model) -> AppError {
    AppError::AlreadyVoted {
        vote_id: existing.id,
        rating: existing.rating,
    }
}

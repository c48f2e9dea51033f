//! Live queries.
//!
//! Each watcher is a spawned task that owns one change-feed receiver. It
//! sends the current snapshot immediately, then re-runs its query whenever an
//! event for a relevant collection arrives and forwards the result if it
//! differs from the last one sent. Snapshots for one subscription are sent
//! from a single task, so they arrive in order.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use serde::Serialize;
use talentshow_common::AppResult;
use talentshow_db::{
    entities::{act, comment, trivia},
    repositories::{ActRepository, CommentRepository, TriviaRepository},
};
use tokio::sync::{broadcast::error::RecvError, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::change_feed::{ChangeFeedService, Collection};
use super::trivia::tally_map;

/// Active trivia question with its current tallies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriviaSnapshot {
    pub trivia: trivia::Model,
    /// Answer count per option index; absent keys are zero
    pub results: BTreeMap<i32, i64>,
}

/// A live stream of snapshots.
///
/// Dropping the subscription (or calling [`Subscription::cancel`]) stops the
/// watcher task and releases its feed receiver.
pub struct Subscription<T> {
    rx: mpsc::Receiver<T>,
    task: JoinHandle<()>,
}

impl<T> Subscription<T> {
    /// Wait for the next snapshot. `None` once the watcher has stopped.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Stop receiving updates.
    pub fn cancel(self) {}

    /// Whether the watcher task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl<T> Stream for Subscription<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Live views over the store.
#[derive(Clone)]
pub struct LiveQueryService {
    act_repo: ActRepository,
    comment_repo: CommentRepository,
    trivia_repo: TriviaRepository,
    feed: ChangeFeedService,
    buffer: usize,
}

impl LiveQueryService {
    /// Create a new live query service. `buffer` bounds how many unread
    /// snapshots each subscription holds.
    #[must_use]
    pub fn new(
        act_repo: ActRepository,
        comment_repo: CommentRepository,
        trivia_repo: TriviaRepository,
        feed: ChangeFeedService,
        buffer: usize,
    ) -> Self {
        Self {
            act_repo,
            comment_repo,
            trivia_repo,
            feed,
            buffer: buffer.max(1),
        }
    }

    /// All acts in running order.
    #[must_use]
    pub fn watch_all_acts(&self) -> Subscription<Vec<act::Model>> {
        let repo = self.act_repo.clone();
        self.spawn_watch("all_acts", &[Collection::Acts], move || {
            let repo = repo.clone();
            async move { repo.list_ordered().await }
        })
    }

    /// The active act, if any.
    ///
    /// Several active acts means the exclusivity invariant was broken; the
    /// lowest id wins and a warning is logged.
    #[must_use]
    pub fn watch_active_act(&self) -> Subscription<Option<act::Model>> {
        let repo = self.act_repo.clone();
        self.spawn_watch("active_act", &[Collection::Acts], move || {
            let repo = repo.clone();
            async move {
                let active = repo.find_active().await?;
                if active.len() > 1 {
                    let ids: Vec<&str> = active.iter().map(|a| a.id.as_str()).collect();
                    warn!(?ids, "More than one act is active");
                }
                Ok(active.into_iter().next())
            }
        })
    }

    /// Approved comments for one act, newest first.
    #[must_use]
    pub fn watch_approved_comments(&self, act_id: &str) -> Subscription<Vec<comment::Model>> {
        let repo = self.comment_repo.clone();
        let act_id = act_id.to_string();
        // Act deletion cascades to comments without a comment event
        self.spawn_watch(
            "approved_comments",
            &[Collection::Comments, Collection::Acts],
            move || {
                let repo = repo.clone();
                let act_id = act_id.clone();
                async move { repo.find_approved_by_act(&act_id).await }
            },
        )
    }

    /// The active trivia question and its tallies, if any.
    #[must_use]
    pub fn watch_active_trivia(&self) -> Subscription<Option<TriviaSnapshot>> {
        let repo = self.trivia_repo.clone();
        self.spawn_watch("active_trivia", &[Collection::Trivia], move || {
            let repo = repo.clone();
            async move {
                let active = repo.find_active().await?;
                if active.len() > 1 {
                    let ids: Vec<&str> = active.iter().map(|t| t.id.as_str()).collect();
                    warn!(?ids, "More than one trivia question is active");
                }
                let Some(trivia) = active.into_iter().next() else {
                    return Ok(None);
                };
                let results = tally_map(repo.tallies(&trivia.id).await?);
                Ok(Some(TriviaSnapshot { trivia, results }))
            }
        })
    }

    fn spawn_watch<T, F, Fut>(
        &self,
        name: &'static str,
        collections: &'static [Collection],
        query: F,
    ) -> Subscription<T>
    where
        T: Clone + PartialEq + Send + 'static,
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = AppResult<T>> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(self.buffer);
        // Subscribe before the first query so no change slips between them
        let mut events = self.feed.subscribe();

        let task = tokio::spawn(async move {
            let mut last: Option<T> = None;
            let mut refresh = true;

            loop {
                if refresh {
                    match query().await {
                        Ok(snapshot) if last.as_ref() != Some(&snapshot) => {
                            if tx.send(snapshot.clone()).await.is_err() {
                                break;
                            }
                            last = Some(snapshot);
                        }
                        Ok(_) => {}
                        Err(e) => warn!(watch = name, error = %e, "Live query failed"),
                    }
                }

                refresh = match events.recv().await {
                    Ok(event) => collections.contains(&event.collection),
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(watch = name, skipped, "Change feed lagged, re-querying");
                        true
                    }
                    Err(RecvError::Closed) => break,
                };
            }

            debug!(watch = name, "Live query stopped");
        });

        Subscription { rx, task }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::change_feed::{ChangeEvent, ChangeFeed, LocalChangeFeed};
    use chrono::Utc;
    use futures::StreamExt;
    use sea_orm::Set;
    use std::sync::Arc;
    use std::time::Duration;
    use talentshow_db::entities::act::ActStatus;
    use talentshow_db::test_utils::TestDatabase;

    struct Fixture {
        _db: TestDatabase,
        acts: ActRepository,
        comments: CommentRepository,
        feed: Arc<LocalChangeFeed>,
        live: LiveQueryService,
    }

    async fn fixture() -> Fixture {
        let db = TestDatabase::new().await.unwrap();
        let conn = db.connection();
        let acts = ActRepository::new(conn.clone());
        let comments = CommentRepository::new(conn.clone());
        let trivia = TriviaRepository::new(conn);
        let feed = Arc::new(LocalChangeFeed::new(16));
        let live = LiveQueryService::new(
            acts.clone(),
            comments.clone(),
            trivia,
            feed.clone(),
            8,
        );
        Fixture {
            _db: db,
            acts,
            comments,
            feed,
            live,
        }
    }

    fn new_act(id: &str, order: i32) -> act::ActiveModel {
        let now = Utc::now().into();
        act::ActiveModel {
            id: Set(id.to_string()),
            name: Set(format!("Act {id}")),
            grade: Set("Grade 2".to_string()),
            description: Set(String::new()),
            order: Set(order),
            is_active: Set(false),
            is_voting_open: Set(false),
            score_sum: Set(0),
            votes_count: Set(0),
            status: Set(ActStatus::Approved),
            submitted_by: Set("Admin".to_string()),
            contact_email: Set(None),
            contact_phone: Set(None),
            submission_date: Set(now),
            last_updated: Set(now),
            created_at: Set(now),
            updated_at: Set(now),
        }
    }

    async fn next<T>(sub: &mut Subscription<T>) -> T {
        tokio::time::timeout(Duration::from_secs(5), sub.recv())
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn test_watch_all_acts_initial_and_update() {
        let f = fixture().await;
        f.acts.create(new_act("a2", 2)).await.unwrap();

        let mut sub = f.live.watch_all_acts();
        let initial = next(&mut sub).await;
        assert_eq!(initial.len(), 1);

        f.acts.create(new_act("a1", 1)).await.unwrap();
        f.feed
            .publish(ChangeEvent::created(Collection::Acts, "a1"))
            .await
            .unwrap();

        let updated = next(&mut sub).await;
        let ids: Vec<&str> = updated.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a2"]);
    }

    #[tokio::test]
    async fn test_unrelated_events_do_not_emit() {
        let f = fixture().await;
        let mut sub = f.live.watch_active_act();
        assert!(next(&mut sub).await.is_none());

        f.feed
            .publish(ChangeEvent::created(Collection::Votes, "v1"))
            .await
            .unwrap();
        // Same snapshot again: suppressed
        f.feed
            .publish(ChangeEvent::updated(Collection::Acts, "a1"))
            .await
            .unwrap();

        let pending = tokio::time::timeout(Duration::from_millis(200), sub.recv()).await;
        assert!(pending.is_err());
    }

    #[tokio::test]
    async fn test_watch_active_act_picks_lowest_id() {
        let f = fixture().await;
        let mut a = new_act("b", 1);
        a.is_active = Set(true);
        f.acts.create(a).await.unwrap();
        let mut b = new_act("a", 2);
        b.is_active = Set(true);
        f.acts.create(b).await.unwrap();

        let mut sub = f.live.watch_active_act();
        assert_eq!(next(&mut sub).await.unwrap().id, "a");
    }

    #[tokio::test]
    async fn test_watch_approved_comments_hides_pending() {
        let f = fixture().await;
        f.acts.create(new_act("a1", 1)).await.unwrap();
        f.comments
            .create(talentshow_db::entities::comment::ActiveModel {
                id: Set("c1".to_string()),
                act_id: Set("a1".to_string()),
                text: Set(Some("Wow".to_string())),
                emoji: Set(None),
                approved: Set(false),
                created_at: Set(Utc::now().into()),
            })
            .await
            .unwrap();

        let mut sub = f.live.watch_approved_comments("a1");
        assert!(next(&mut sub).await.is_empty());

        f.comments.approve("c1").await.unwrap();
        f.feed
            .publish(ChangeEvent::updated(Collection::Comments, "c1"))
            .await
            .unwrap();

        let approved = next(&mut sub).await;
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].id, "c1");
    }

    #[tokio::test]
    async fn test_subscription_is_a_stream_and_cancels() {
        let f = fixture().await;
        let mut sub = f.live.watch_all_acts();
        let first = tokio::time::timeout(Duration::from_secs(5), sub.next())
            .await
            .unwrap();
        assert_eq!(first, Some(vec![]));

        let receivers_before = f.feed.sender().receiver_count();
        sub.cancel();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(f.feed.sender().receiver_count() < receivers_before);
    }
}

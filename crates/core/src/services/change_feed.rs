//! Change feed.
//!
//! Every committed write publishes a [`ChangeEvent`]. Live queries listen on
//! the feed and re-evaluate. The in-process implementation lives here; the
//! Redis-backed one is provided by the pubsub crate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use talentshow_common::AppResult;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Record collections a change can touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Collection {
    Acts,
    Votes,
    Comments,
    Trivia,
    Notifications,
}

/// What happened to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

/// A committed change to one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub collection: Collection,
    pub id: String,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    #[must_use]
    pub fn created(collection: Collection, id: impl Into<String>) -> Self {
        Self {
            collection,
            id: id.into(),
            kind: ChangeKind::Created,
        }
    }

    #[must_use]
    pub fn updated(collection: Collection, id: impl Into<String>) -> Self {
        Self {
            collection,
            id: id.into(),
            kind: ChangeKind::Updated,
        }
    }

    #[must_use]
    pub fn deleted(collection: Collection, id: impl Into<String>) -> Self {
        Self {
            collection,
            id: id.into(),
            kind: ChangeKind::Deleted,
        }
    }
}

/// Trait for publishing and receiving change events.
///
/// This allows the core services to announce writes without depending on
/// the transport.
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    /// Publish one change.
    async fn publish(&self, event: ChangeEvent) -> AppResult<()>;

    /// Receive every change published after this call.
    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent>;
}

/// Type alias for a shared change feed.
pub type ChangeFeedService = Arc<dyn ChangeFeed>;

/// Publish, logging instead of failing: the write has already committed.
pub async fn publish_logged(feed: &dyn ChangeFeed, event: ChangeEvent) {
    let collection = event.collection;
    let id = event.id.clone();
    if let Err(e) = feed.publish(event).await {
        warn!(?collection, %id, error = %e, "Failed to publish change event");
    }
}

/// In-process change feed over a broadcast channel.
#[derive(Clone)]
pub struct LocalChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl LocalChangeFeed {
    /// Create a feed whose subscribers may fall `capacity` events behind
    /// before they observe a lag.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Sender half, for bridges that inject events received elsewhere.
    #[must_use]
    pub fn sender(&self) -> broadcast::Sender<ChangeEvent> {
        self.sender.clone()
    }
}

impl Default for LocalChangeFeed {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl ChangeFeed for LocalChangeFeed {
    async fn publish(&self, event: ChangeEvent) -> AppResult<()> {
        debug!(collection = ?event.collection, id = %event.id, kind = ?event.kind, "Change");
        // No receivers is not an error
        let _ = self.sender.send(event);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_feed_delivers_in_order() {
        let feed = LocalChangeFeed::new(8);
        let mut rx = feed.subscribe();

        feed.publish(ChangeEvent::created(Collection::Votes, "v1"))
            .await
            .unwrap();
        feed.publish(ChangeEvent::updated(Collection::Acts, "a1"))
            .await
            .unwrap();

        assert_eq!(
            rx.recv().await.unwrap(),
            ChangeEvent::created(Collection::Votes, "v1")
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            ChangeEvent::updated(Collection::Acts, "a1")
        );
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ok() {
        let feed = LocalChangeFeed::default();
        feed.publish(ChangeEvent::deleted(Collection::Comments, "c1"))
            .await
            .unwrap();
    }

    #[test]
    fn test_event_wire_format() {
        let event = ChangeEvent::updated(Collection::Trivia, "t1");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"collection": "trivia", "id": "t1", "kind": "updated"})
        );
    }
}

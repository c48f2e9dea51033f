//! Redis Pub/Sub change feed.
//!
//! Lets several server processes share one change feed. Every event is
//! published to a single Redis channel; each process, the publisher
//! included, receives it back through its subscriber client and re-emits it
//! on a local broadcast channel, so all processes observe one ordered stream.

#![allow(missing_docs)]

use async_trait::async_trait;
use fred::clients::{Client, SubscriberClient};
use fred::interfaces::{ClientLike, EventInterface, PubsubInterface};
use fred::types::config::Config as FredConfig;
use talentshow_common::config::RedisConfig;
use talentshow_common::{AppError, AppResult};
use talentshow_core::{ChangeEvent, ChangeFeed, LocalChangeFeed};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Channel carrying change events for a key prefix.
#[must_use]
pub fn changes_channel(prefix: &str) -> String {
    format!("{prefix}:changes")
}

/// Encode an event for the wire.
pub fn encode_event(event: &ChangeEvent) -> AppResult<String> {
    serde_json::to_string(event)
        .map_err(|e| AppError::Internal(format!("Failed to encode change event: {e}")))
}

/// Decode an event received from Redis.
pub fn decode_event(payload: &str) -> AppResult<ChangeEvent> {
    serde_json::from_str(payload)
        .map_err(|e| AppError::Redis(format!("Malformed change event: {e}")))
}

fn redis_err(err: fred::error::Error) -> AppError {
    AppError::Redis(err.to_string())
}

/// Change feed backed by Redis Pub/Sub.
pub struct RedisChangeFeed {
    publisher: Client,
    subscriber: SubscriberClient,
    channel: String,
    local: LocalChangeFeed,
    forwarder: JoinHandle<()>,
}

impl RedisChangeFeed {
    /// Connect both clients, subscribe to the changes channel and start
    /// forwarding received events to local subscribers.
    pub async fn connect(config: &RedisConfig, capacity: usize) -> AppResult<Self> {
        let fred_config = FredConfig::from_url(&config.url).map_err(redis_err)?;

        let publisher = Client::new(fred_config.clone(), None, None, None);
        publisher.init().await.map_err(redis_err)?;

        let subscriber = SubscriberClient::new(fred_config, None, None, None);
        subscriber.init().await.map_err(redis_err)?;

        let channel = changes_channel(&config.prefix);
        let local = LocalChangeFeed::new(capacity);

        // Take the message receiver before subscribing so nothing is missed
        let mut messages = subscriber.message_rx();
        subscriber
            .subscribe(channel.as_str())
            .await
            .map_err(redis_err)?;

        let local_tx = local.sender();
        let forwarder = tokio::spawn(async move {
            loop {
                match messages.recv().await {
                    Ok(message) => {
                        let Some(payload) = message.value.as_string() else {
                            warn!("Non-string Pub/Sub payload");
                            continue;
                        };
                        match decode_event(&payload) {
                            Ok(event) => {
                                debug!(collection = ?event.collection, id = %event.id, "Received change");
                                // No local receivers is not an error
                                let _ = local_tx.send(event);
                            }
                            Err(e) => warn!(error = %e, "Dropping Pub/Sub message"),
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "Redis message stream lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            info!("Redis message stream ended");
        });

        info!(channel = %channel, "Redis change feed connected");

        Ok(Self {
            publisher,
            subscriber,
            channel,
            local,
            forwarder,
        })
    }

    /// Channel this feed publishes to.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Unsubscribe and close both connections.
    pub async fn shutdown(&self) -> AppResult<()> {
        self.subscriber
            .unsubscribe(self.channel.as_str())
            .await
            .map_err(redis_err)?;
        self.forwarder.abort();
        self.subscriber.quit().await.map_err(redis_err)?;
        self.publisher.quit().await.map_err(redis_err)?;
        info!(channel = %self.channel, "Redis change feed closed");
        Ok(())
    }
}

#[async_trait]
impl ChangeFeed for RedisChangeFeed {
    async fn publish(&self, event: ChangeEvent) -> AppResult<()> {
        let payload = encode_event(&event)?;
        let _: () = self
            .publisher
            .publish(self.channel.as_str(), payload)
            .await
            .map_err(redis_err)?;
        debug!(channel = %self.channel, collection = ?event.collection, id = %event.id, "Published change");
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.local.subscribe()
    }
}

impl Drop for RedisChangeFeed {
    fn drop(&mut self) {
        self.forwarder.abort();
    }
}

//! Outbound notification delivery.
//!
//! Provides an abstraction for handing a rendered notice to the submitter.
//! The SMTP implementation lives in [`super::email`].

use async_trait::async_trait;
use std::sync::Arc;
use talentshow_common::AppResult;
use tracing::info;

/// Trait for delivering a rendered notice to a recipient.
#[async_trait]
pub trait NotificationDelivery: Send + Sync {
    /// Deliver `subject` and `body` to `email`.
    async fn deliver(&self, email: &str, subject: &str, body: &str) -> AppResult<()>;
}

/// Type alias for a shared delivery collaborator.
pub type DeliveryService = Arc<dyn NotificationDelivery>;

/// Delivery that only logs, for deployments without email.
#[derive(Clone, Default)]
pub struct LogDelivery;

#[async_trait]
impl NotificationDelivery for LogDelivery {
    async fn deliver(&self, email: &str, subject: &str, body: &str) -> AppResult<()> {
        info!(to = %email, %subject, body_len = body.len(), "Notification (not sent, email disabled)");
        Ok(())
    }
}

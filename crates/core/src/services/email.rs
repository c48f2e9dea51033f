//! SMTP notification delivery.

use async_trait::async_trait;
use lettre::{
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use talentshow_common::{AppError, AppResult, config::EmailConfig};
use tracing::debug;

use super::delivery::NotificationDelivery;

/// Sends notices over SMTP.
#[derive(Clone)]
pub struct SmtpDelivery {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpDelivery {
    /// Build a transport from the `[email]` configuration section.
    pub fn from_config(config: &EmailConfig) -> AppResult<Self> {
        let builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
        }
        .map_err(|e| AppError::Config(format!("Invalid SMTP host: {e}")))?;

        let mut builder = builder.port(config.smtp_port);
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        let address: Address = config
            .from_address
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid from address: {e}")))?;

        Ok(Self {
            transport: builder.build(),
            from: Mailbox::new(Some(config.from_name.clone()), address),
        })
    }
}

#[async_trait]
impl NotificationDelivery for SmtpDelivery {
    async fn deliver(&self, email: &str, subject: &str, body: &str) -> AppResult<()> {
        let to: Address = email
            .parse()
            .map_err(|e| AppError::BadRequest(format!("Invalid recipient {email}: {e}")))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(Mailbox::new(None, to))
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to build email: {e}")))?;

        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| AppError::ExternalService(format!("SMTP send failed: {e}")))?;

        debug!(to = %email, code = %response.code(), "Email sent");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn email_config() -> EmailConfig {
        EmailConfig {
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 587,
            username: Some("mailer".to_string()),
            password: Some("secret".to_string()),
            from_address: "show@example.com".to_string(),
            from_name: "Talent Show".to_string(),
            starttls: true,
        }
    }

    #[tokio::test]
    async fn test_from_config() {
        let delivery = SmtpDelivery::from_config(&email_config()).unwrap();
        assert_eq!(delivery.from.email.to_string(), "show@example.com");
    }

    #[tokio::test]
    async fn test_from_config_rejects_bad_sender() {
        let mut config = email_config();
        config.from_address = "not an address".to_string();
        assert!(matches!(
            SmtpDelivery::from_config(&config),
            Err(AppError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_deliver_rejects_bad_recipient() {
        let delivery = SmtpDelivery::from_config(&email_config()).unwrap();
        let result = delivery.deliver("nope", "Subject", "Body").await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}

//! Outgoing mail for contact form notifications

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Arc;

use crate::config::MailConfig;

/// A plain-text email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub body: String,
}

/// Something that can deliver a [`MailMessage`]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: MailMessage) -> Result<()>;
}

/// SMTP delivery through lettre
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build a mailer from configuration, `None` when mail is disabled
    pub fn from_config(config: &MailConfig) -> Result<Option<Arc<dyn Mailer>>> {
        if !config.is_enabled() {
            return Ok(None);
        }
        let host = config
            .smtp_host
            .as_deref()
            .ok_or_else(|| anyhow!("SMTP host not configured"))?;

        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e| anyhow!("Invalid from address '{}': {}", config.from, e))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .map_err(|e| anyhow!("Failed to create SMTP transport: {}", e))?
            .port(config.smtp_port);
        if let (Some(user), Some(pass)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        tracing::info!(host, port = config.smtp_port, "SMTP notifications enabled");
        let mailer: Arc<dyn Mailer> = Arc::new(Self {
            transport: builder.build(),
            from,
        });
        Ok(Some(mailer))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: MailMessage) -> Result<()> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .to(message
                .to
                .parse()
                .map_err(|e| anyhow!("Invalid to address: {}", e))?)
            .subject(message.subject)
            .header(ContentType::TEXT_PLAIN);
        if let Some(reply_to) = message.reply_to {
            builder = builder.reply_to(
                reply_to
                    .parse()
                    .map_err(|e| anyhow!("Invalid reply-to address: {}", e))?,
            );
        }
        let email = builder
            .body(message.body)
            .map_err(|e| anyhow!("Failed to build email: {}", e))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| anyhow!("Failed to send email: {}", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_without_host() {
        let config = MailConfig::default();
        assert!(SmtpMailer::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn test_disabled_without_recipient() {
        let config = MailConfig {
            smtp_host: Some("smtp.example.com".to_string()),
            ..Default::default()
        };
        assert!(SmtpMailer::from_config(&config).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_enabled_with_host_and_recipient() {
        let config = MailConfig {
            smtp_host: Some("smtp.example.com".to_string()),
            notify_to: Some("bureau@latrouvaille.fr".to_string()),
            from: "La Trouvaille <noreply@latrouvaille.fr>".to_string(),
            ..Default::default()
        };
        assert!(SmtpMailer::from_config(&config).unwrap().is_some());
    }

    #[test]
    fn test_invalid_from_is_rejected() {
        let config = MailConfig {
            smtp_host: Some("smtp.example.com".to_string()),
            notify_to: Some("bureau@latrouvaille.fr".to_string()),
            from: "not an address".to_string(),
            ..Default::default()
        };
        assert!(SmtpMailer::from_config(&config).is_err());
    }
}

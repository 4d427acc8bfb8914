//! Contact form service
//!
//! Messages are stored first; the email notification to the association is
//! best effort.

use std::sync::Arc;

use super::mail::{MailMessage, Mailer};
use super::{optional_text, require_email, require_length, ServiceError};
use crate::db::repositories::ContactRepository;
use crate::models::{Contact, ContactInput};

pub const MAX_NAME: usize = 100;
pub const MAX_SUBJECT: usize = 200;
pub const MIN_MESSAGE: usize = 10;
pub const MAX_MESSAGE: usize = 5000;

pub struct ContactService {
    repo: Arc<dyn ContactRepository>,
    mailer: Option<Arc<dyn Mailer>>,
    notify_to: Option<String>,
    site_name: String,
}

impl ContactService {
    pub fn new(
        repo: Arc<dyn ContactRepository>,
        mailer: Option<Arc<dyn Mailer>>,
        notify_to: Option<String>,
        site_name: impl Into<String>,
    ) -> Self {
        Self {
            repo,
            mailer,
            notify_to,
            site_name: site_name.into(),
        }
    }

    /// Validate, store and forward a contact message
    pub async fn submit(&self, input: ContactInput) -> Result<Contact, ServiceError> {
        let phone = optional_text(input.phone.as_deref());
        if phone.as_ref().is_some_and(|p| p.chars().count() > 30) {
            return Err(ServiceError::ValidationError(
                "Phone must be at most 30 characters".to_string(),
            ));
        }
        let input = ContactInput {
            name: require_length("Name", &input.name, 1, MAX_NAME)?,
            email: require_email(&input.email)?,
            phone,
            subject: require_length("Subject", &input.subject, 1, MAX_SUBJECT)?,
            message: require_length("Message", &input.message, MIN_MESSAGE, MAX_MESSAGE)?,
        };

        let contact = self.repo.create(&input).await?;
        tracing::info!(contact_id = contact.id, "Contact message stored");

        if let (Some(mailer), Some(to)) = (&self.mailer, &self.notify_to) {
            let message = self.notification(&contact, to);
            if let Err(e) = mailer.send(message).await {
                tracing::warn!(contact_id = contact.id, error = %e, "Failed to send contact notification");
            }
        }

        Ok(contact)
    }

    fn notification(&self, contact: &Contact, to: &str) -> MailMessage {
        let mut body = format!("From: {} <{}>\n", contact.name, contact.email);
        if let Some(phone) = &contact.phone {
            body.push_str(&format!("Phone: {}\n", phone));
        }
        body.push('\n');
        body.push_str(&contact.message);

        MailMessage {
            to: to.to_string(),
            reply_to: Some(contact.email.clone()),
            subject: format!("[{}] {}", self.site_name, contact.subject),
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fixtures::migrated_pool;
    use crate::db::repositories::SqlxContactRepository;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<MailMessage>>,
        fail: bool,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, message: MailMessage) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("connection refused");
            }
            self.sent.lock().unwrap().push(message);
            Ok(())
        }
    }

    fn input() -> ContactInput {
        ContactInput {
            name: "Léa".to_string(),
            email: "Lea@Example.com".to_string(),
            phone: Some(" ".to_string()),
            subject: "Bénévolat".to_string(),
            message: "Bonjour, je voudrais aider samedi.".to_string(),
        }
    }

    #[tokio::test]
    async fn test_submit_stores_and_notifies() {
        let pool = migrated_pool().await;
        let mailer = Arc::new(RecordingMailer::default());
        let service = ContactService::new(
            SqlxContactRepository::boxed(pool.clone()),
            Some(mailer.clone()),
            Some("bureau@latrouvaille.fr".to_string()),
            "La Trouvaille",
        );

        let contact = service.submit(input()).await.unwrap();
        assert_eq!(contact.email, "lea@example.com");
        assert_eq!(contact.phone, None);

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "bureau@latrouvaille.fr");
        assert_eq!(sent[0].subject, "[La Trouvaille] Bénévolat");
        assert_eq!(sent[0].reply_to.as_deref(), Some("lea@example.com"));
        assert!(sent[0].body.contains("je voudrais aider"));
    }

    #[tokio::test]
    async fn test_failed_notification_does_not_fail_submit() {
        let pool = migrated_pool().await;
        let mailer = Arc::new(RecordingMailer {
            fail: true,
            ..Default::default()
        });
        let service = ContactService::new(
            SqlxContactRepository::boxed(pool.clone()),
            Some(mailer),
            Some("bureau@latrouvaille.fr".to_string()),
            "La Trouvaille",
        );

        assert!(service.submit(input()).await.is_ok());
    }

    #[tokio::test]
    async fn test_validation() {
        let pool = migrated_pool().await;
        let service = ContactService::new(SqlxContactRepository::boxed(pool.clone()), None, None, "La Trouvaille");

        let mut short = input();
        short.message = "Salut".to_string();
        assert!(matches!(service.submit(short).await, Err(ServiceError::ValidationError(_))));

        let mut no_subject = input();
        no_subject.subject = "".to_string();
        assert!(matches!(service.submit(no_subject).await, Err(ServiceError::ValidationError(_))));

        let mut bad_email = input();
        bad_email.email = "lea".to_string();
        assert!(matches!(service.submit(bad_email).await, Err(ServiceError::ValidationError(_))));

        assert!(service.submit(input()).await.is_ok());
    }
}

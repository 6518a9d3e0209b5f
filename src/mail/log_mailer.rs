use async_trait::async_trait;

use crate::mail::{MailError, Mailer, OutgoingEmail};

/// A [Mailer] that writes emails to the log instead of sending them.
///
/// Used when no SMTP credentials are configured, e.g. during local development.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        tracing::info!(
            "Email to {} with subject \"{}\" (SMTP is not configured):\n{}",
            email.to,
            email.subject,
            email.html
        );

        Ok(())
    }
}

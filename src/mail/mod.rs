//! Sending emails to users.
//!
//! Handlers talk to a [Mailer] so that the SMTP relay can be swapped for the
//! [LogMailer] during development, or a recording mailer in tests.

mod log_mailer;
mod smtp;
mod templates;

#[cfg(test)]
mod recording;

use async_trait::async_trait;

pub use log_mailer::LogMailer;
pub use smtp::{SmtpConfig, SmtpMailer};

#[cfg(test)]
pub use recording::{FailingMailer, RecordingMailer, extract_otp};

/// An HTML email ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    /// The recipient's email address.
    pub to: String,
    /// The subject line.
    pub subject: String,
    /// The HTML body.
    pub html: String,
}

/// The errors that may occur when sending an email.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// The sender or recipient address could not be parsed.
    #[error("invalid email address: {0}")]
    Address(String),

    /// The message could not be built, e.g. a header was invalid.
    #[error("could not build email: {0}")]
    Message(String),

    /// The SMTP server could not be reached or rejected the message.
    #[error("SMTP transport error: {0}")]
    Transport(String),
}

/// Something that can deliver emails.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver `email` to its recipient.
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError>;
}

/// Email the one-time password for a password reset to `to`.
pub async fn send_password_reset_email(
    mailer: &dyn Mailer,
    to: &str,
    otp: &str,
) -> Result<(), MailError> {
    mailer
        .send(OutgoingEmail {
            to: to.to_owned(),
            subject: "Password Reset OTP".to_owned(),
            html: templates::password_reset_email(otp).into_string(),
        })
        .await
}

/// Email a welcome message with a link to the log-in page to `to`.
pub async fn send_welcome_email(
    mailer: &dyn Mailer,
    to: &str,
    name: &str,
    frontend_url: &str,
) -> Result<(), MailError> {
    mailer
        .send(OutgoingEmail {
            to: to.to_owned(),
            subject: "Welcome to Finance Tracker".to_owned(),
            html: templates::welcome_email(name, frontend_url).into_string(),
        })
        .await
}

//! Test doubles for [Mailer].

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::mail::{MailError, Mailer, OutgoingEmail};

/// A mailer that keeps every email it is asked to send.
#[derive(Debug, Default, Clone)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<OutgoingEmail>>>,
}

impl RecordingMailer {
    /// The emails sent so far, oldest first.
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

/// A mailer whose relay is always down.
#[derive(Debug, Default, Clone)]
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _email: OutgoingEmail) -> Result<(), MailError> {
        Err(MailError::Transport("connection refused".to_owned()))
    }
}

/// Get the one-time password out of a password reset email.
pub fn extract_otp(html: &str) -> Option<String> {
    let start = html.find("id=\"otp\"")?;
    let value_start = start + html[start..].find('>')? + 1;
    let value_end = value_start + html[value_start..].find('<')?;

    Some(html[value_start..value_end].to_owned())
}

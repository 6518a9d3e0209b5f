use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};

use crate::mail::{MailError, Mailer, OutgoingEmail};

/// The display name used in the `From` header.
const SENDER_NAME: &str = "Finance Tracker";

/// Connection details for an SMTP relay.
#[derive(Clone)]
pub struct SmtpConfig {
    /// The relay's host name, e.g. "smtp.gmail.com".
    pub host: String,
    /// The relay's port, 465 for implicit TLS.
    pub port: u16,
    /// The account to log in as, also used as the sender address.
    pub username: String,
    /// The account's password or app password.
    pub password: String,
}

/// A [Mailer] that sends emails through an SMTP relay over TLS.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpMailer {
    /// Create a mailer for the relay in `config`.
    ///
    /// No connection is made until the first email is sent, see [SmtpMailer::verify].
    ///
    /// # Errors
    /// Returns a:
    /// - [MailError::Address] if the username is not a valid sender address,
    /// - or [MailError::Transport] if the TLS parameters for the host could not be created.
    pub fn new(config: SmtpConfig) -> Result<Self, MailError> {
        let sender = format!("{SENDER_NAME} <{}>", config.username)
            .parse::<Mailbox>()
            .map_err(|error| MailError::Address(error.to_string()))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|error| MailError::Transport(error.to_string()))?
            .port(config.port)
            .credentials(Credentials::new(config.username, config.password))
            .build();

        Ok(Self { transport, sender })
    }

    /// Check that the relay accepts connections and log the outcome.
    ///
    /// Returns `true` if the connection succeeded.
    pub async fn verify(&self) -> bool {
        match self.transport.test_connection().await {
            Ok(true) => {
                tracing::info!("Connected to SMTP server as {}", self.sender.email);
                true
            }
            Ok(false) => {
                tracing::error!("SMTP server did not accept the connection");
                false
            }
            Err(error) => {
                tracing::error!("Could not connect to SMTP server: {error}");
                false
            }
        }
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        let recipient = email
            .to
            .parse::<Mailbox>()
            .map_err(|error| MailError::Address(error.to_string()))?;

        let message = Message::builder()
            .from(self.sender.clone())
            .to(recipient)
            .subject(email.subject)
            .header(ContentType::TEXT_HTML)
            .body(email.html)
            .map_err(|error| MailError::Message(error.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|error| MailError::Transport(error.to_string()))?;

        tracing::debug!("Sent email to {}", email.to);

        Ok(())
    }
}

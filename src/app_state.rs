//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use time::Duration;

use crate::{
    Error, PasswordHash,
    auth::{DEFAULT_TOKEN_DURATION, JwtKeys},
    db::initialize,
    mail::Mailer,
};

/// The state of the REST server.
#[derive(Clone)]
pub struct AppState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,

    /// The keys for signing and verifying bearer tokens.
    pub jwt_keys: JwtKeys,

    /// How long bearer tokens are valid for after log-in.
    pub token_duration: Duration,

    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// Used for users that have not set their own timezone.
    pub local_timezone: String,

    /// The bcrypt cost used when hashing new passwords.
    pub password_cost: u32,

    /// Sends welcome and password reset emails.
    pub mailer: Arc<dyn Mailer>,

    /// The base URL of the web client, used for links in emails.
    pub frontend_url: String,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        jwt_secret: &str,
        local_timezone: &str,
        mailer: Arc<dyn Mailer>,
        frontend_url: &str,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            jwt_keys: JwtKeys::from_secret(jwt_secret),
            token_duration: DEFAULT_TOKEN_DURATION,
            local_timezone: local_timezone.to_owned(),
            password_cost: PasswordHash::DEFAULT_COST,
            mailer,
            frontend_url: frontend_url.to_owned(),
        })
    }

    /// Set how long bearer tokens are valid for.
    pub fn with_token_duration(mut self, token_duration: Duration) -> Self {
        self.token_duration = token_duration;
        self
    }

    /// Set the bcrypt cost for new password hashes.
    ///
    /// Lower costs are only suitable for tests.
    pub fn with_password_cost(mut self, password_cost: u32) -> Self {
        self.password_cost = password_cost;
        self
    }
}

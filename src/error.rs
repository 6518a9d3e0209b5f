//! Defines the app level error type and its conversion to JSON error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::transaction::TransactionKind;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The email and password did not match a registered user.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The bearer token was missing, malformed, expired or signed with the
    /// wrong key.
    #[error("Unauthorized")]
    Unauthorized,

    /// One or more required fields were missing from the request body.
    ///
    /// The string is the message shown to the client, e.g. "Title, amount,
    /// and category are required".
    #[error("{0}")]
    MissingFields(&'static str),

    /// A field in the request body had a value that is not allowed, e.g. a
    /// negative monthly budget or an empty title.
    #[error("{0}")]
    InvalidField(String),

    /// A transaction amount of zero or less.
    #[error("Amount must be greater than 0")]
    NonPositiveAmount,

    /// The user provided a password that is too easy to guess.
    #[error("Password is too weak: {0}")]
    TooWeak(String),

    /// The email address could not be parsed.
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    /// Another user has already registered with the email address.
    #[error("User already exists")]
    DuplicateEmail,

    /// No registered user has the email address given for a password reset.
    #[error("User not found with this email")]
    UnknownEmail,

    /// The one-time password did not match, has expired, or has been
    /// guessed wrong too many times.
    #[error("Invalid or expired OTP")]
    InvalidOtp,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// A JSON web token could not be created.
    #[error("could not create token: {0}")]
    TokenCreation(String),

    /// An email could not be sent.
    #[error("could not send email: {0}")]
    EmailError(String),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The user does not exist, or belongs to someone other than the caller.
    #[error("User not found")]
    MissingUser,

    /// The transaction does not exist, belongs to another user, or is of the
    /// other kind.
    #[error("{}", missing_transaction_message(.0))]
    MissingTransaction(TransactionKind),

    /// The goal does not exist or belongs to another user.
    #[error("Goal not found")]
    MissingGoal,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

fn missing_transaction_message(kind: &TransactionKind) -> &'static str {
    match kind {
        TransactionKind::Income => "Income record not found",
        TransactionKind::Expense => "Expense not found",
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidCredentials
            | Error::MissingFields(_)
            | Error::InvalidField(_)
            | Error::NonPositiveAmount
            | Error::TooWeak(_)
            | Error::InvalidEmail(_)
            | Error::DuplicateEmail
            | Error::UnknownEmail
            | Error::InvalidOtp => StatusCode::BAD_REQUEST,
            Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::NotFound
            | Error::MissingUser
            | Error::MissingTransaction(_)
            | Error::MissingGoal => StatusCode::NOT_FOUND,
            Error::HashingError(_)
            | Error::TokenCreation(_)
            | Error::EmailError(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = if status.is_server_error() {
            // Any internal details are not intended to be shown to the client.
            tracing::error!("An unexpected error occurred: {}", self);
            json!({ "error": "Internal server error" })
        } else {
            json!({ "msg": self.to_string() })
        };

        (status, Json(body)).into_response()
    }
}

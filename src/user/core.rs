//! The user model, the user table, and queries for users.

use std::fmt::Display;

use email_address::EmailAddress;
use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, PasswordHash, database_id::DatabaseId};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserId(DatabaseId);

impl UserId {
    /// Create a new user ID.
    pub fn new(id: DatabaseId) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered user of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserId,
    /// The user's display name.
    pub name: String,
    /// The email address the user logs in with.
    pub email: EmailAddress,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// An optional phone number.
    pub phone: Option<String>,
    /// An optional free text location, e.g. "Auckland".
    pub location: Option<String>,
    /// The user's preferred language.
    pub language: Option<String>,
    /// The user's preferred currency code.
    pub currency: Option<String>,
    /// A canonical timezone name, e.g. "Pacific/Auckland".
    pub timezone: Option<String>,
    /// How much the user plans to spend each month.
    pub monthly_budget: f64,
    /// When the user signed up.
    pub join_date: OffsetDateTime,
}

/// The details needed to register a user.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    /// The user's display name.
    pub name: String,
    /// The email address the user logs in with.
    pub email: EmailAddress,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// An optional phone number.
    pub phone: Option<String>,
    /// When the user signed up.
    pub join_date: OffsetDateTime,
}

/// Changes to a user's profile. `None` fields are left unchanged.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProfileUpdate {
    /// A new display name.
    pub name: Option<String>,
    /// A new email address.
    pub email: Option<EmailAddress>,
    /// A new phone number.
    pub phone: Option<String>,
    /// A new location.
    pub location: Option<String>,
    /// A new preferred language.
    pub language: Option<String>,
    /// A new preferred currency.
    pub currency: Option<String>,
    /// A new timezone name.
    pub timezone: Option<String>,
    /// A new monthly budget, must not be negative.
    pub monthly_budget: Option<f64>,
}

/// The public view of a user that is returned by the profile endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// The user's ID.
    pub id: UserId,
    /// The user's display name.
    pub name: String,
    /// The user's email address.
    pub email: String,
    /// The user's phone number.
    pub phone: Option<String>,
    /// The user's location.
    pub location: Option<String>,
    /// When the user signed up.
    #[serde(with = "time::serde::rfc3339")]
    pub join_date: OffsetDateTime,
    /// The user's preferred language.
    pub language: Option<String>,
    /// The user's preferred currency.
    pub currency: Option<String>,
    /// The user's timezone.
    pub timezone: Option<String>,
    /// How much the user plans to spend each month.
    pub monthly_budget: f64,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email.to_string(),
            phone: user.phone,
            location: user.location,
            join_date: user.join_date,
            language: user.language,
            currency: user.currency,
            timezone: user.timezone,
            monthly_budget: user.monthly_budget,
        }
    }
}

const USER_COLUMNS: &str = "id, name, email, password, phone, location, language, currency, \
    timezone, monthly_budget, join_date";

/// Create the user table.
///
/// Emails are compared case insensitively, so "Alice@Example.com" and
/// "alice@example.com" are the same account.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE COLLATE NOCASE,
                password TEXT NOT NULL,
                phone TEXT,
                location TEXT,
                language TEXT,
                currency TEXT,
                timezone TEXT,
                monthly_budget REAL NOT NULL DEFAULT 0 CHECK (monthly_budget >= 0),
                join_date TEXT NOT NULL,
                reset_token_hash TEXT,
                reset_token_expiry TEXT,
                reset_attempts INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns a:
/// - [Error::DuplicateEmail] if the email is already registered,
/// - or [Error::SqlError] if some other SQL related error occurred.
pub fn create_user(new_user: NewUser, connection: &Connection) -> Result<User, Error> {
    let user = connection
        .prepare(&format!(
            "INSERT INTO user (name, email, password, phone, join_date)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING {USER_COLUMNS}"
        ))?
        .query_row(
            params![
                new_user.name,
                new_user.email.as_str(),
                new_user.password_hash.as_ref(),
                new_user.phone,
                new_user.join_date,
            ],
            map_user_row,
        )?;

    Ok(user)
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user ([Error::NotFound]),
/// - there was an error trying to access the database.
pub fn get_user_by_id(user_id: UserId, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(&format!("SELECT {USER_COLUMNS} FROM user WHERE id = :id"))?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(|error| error.into())
}

/// Get the user registered with `email`, ignoring case.
///
/// # Errors
///
/// This function will return an error if:
/// - `email` does not belong to a registered user ([Error::NotFound]),
/// - there was an error trying to access the database.
pub fn get_user_by_email(email: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(&format!(
            "SELECT {USER_COLUMNS} FROM user WHERE email = :email"
        ))?
        .query_row(&[(":email", &email.trim())], map_user_row)
        .map_err(|error| error.into())
}

/// Apply `update` to the profile of `user_id` and return the updated user.
///
/// # Errors
///
/// This function will return a:
/// - [Error::NotFound] if `user_id` does not belong to a registered user,
/// - [Error::DuplicateEmail] if the new email belongs to another user,
/// - or [Error::SqlError] if some other SQL related error occurred.
pub fn update_user_profile(
    user_id: UserId,
    update: &ProfileUpdate,
    connection: &Connection,
) -> Result<User, Error> {
    connection
        .prepare(&format!(
            "UPDATE user SET
                name = COALESCE(?1, name),
                email = COALESCE(?2, email),
                phone = COALESCE(?3, phone),
                location = COALESCE(?4, location),
                language = COALESCE(?5, language),
                currency = COALESCE(?6, currency),
                timezone = COALESCE(?7, timezone),
                monthly_budget = COALESCE(?8, monthly_budget),
                updated_at = CURRENT_TIMESTAMP
             WHERE id = ?9
             RETURNING {USER_COLUMNS}"
        ))?
        .query_row(
            params![
                update.name,
                update.email.as_ref().map(EmailAddress::as_str),
                update.phone,
                update.location,
                update.language,
                update.currency,
                update.timezone,
                update.monthly_budget,
                user_id.as_i64(),
            ],
            map_user_row,
        )
        .map_err(|error| error.into())
}

/// Replace the password of `user_id`.
///
/// # Errors
///
/// This function will return a:
/// - [Error::NotFound] if `user_id` does not belong to a registered user,
/// - or [Error::SqlError] if some other SQL related error occurred.
pub fn update_password(
    user_id: UserId,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET password = ?1, updated_at = CURRENT_TIMESTAMP WHERE id = ?2",
        params![password_hash.as_ref(), user_id.as_i64()],
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

/// Map a database row to a [User], the columns must be in the order of [USER_COLUMNS].
fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_email: String = row.get(2)?;
    let raw_password_hash: String = row.get(3)?;

    Ok(User {
        id: UserId::new(row.get(0)?),
        name: row.get(1)?,
        // Emails are validated before they are written.
        email: EmailAddress::new_unchecked(raw_email),
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        phone: row.get(4)?,
        location: row.get(5)?,
        language: row.get(6)?,
        currency: row.get(7)?,
        timezone: row.get(8)?,
        monthly_budget: row.get(9)?,
        join_date: row.get(10)?,
    })
}

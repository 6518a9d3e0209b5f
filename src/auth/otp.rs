//! One-time passwords for resetting a forgotten password.
//!
//! Only the SHA-256 hash of an OTP is stored. An OTP can be used once, expires after
//! [OTP_DURATION], and stops working after [MAX_OTP_ATTEMPTS] wrong guesses.

use rand::Rng;
use rusqlite::{Connection, OptionalExtension, params};
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};

use crate::{Error, user::UserId};

/// How long an OTP is valid for after it is issued.
pub const OTP_DURATION: Duration = Duration::minutes(15);

/// The number of wrong guesses after which an OTP can no longer be used.
pub const MAX_OTP_ATTEMPTS: u32 = 5;

/// A six digit one-time password.
#[derive(Debug, Clone, PartialEq)]
pub struct OneTimePassword(String);

impl OneTimePassword {
    /// Generate a random OTP between 100000 and 999999.
    pub fn generate() -> Self {
        let code: u32 = rand::thread_rng().gen_range(100_000..=999_999);
        Self(code.to_string())
    }

    /// The hash to store in place of the OTP.
    pub fn hash(&self) -> OtpHash {
        OtpHash::of(&self.0)
    }
}

impl AsRef<str> for OneTimePassword {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The hex encoded SHA-256 hash of an OTP.
#[derive(Debug, Clone, PartialEq)]
pub struct OtpHash(String);

impl OtpHash {
    /// Hash the OTP a user typed in, ignoring surrounding whitespace.
    pub fn of(otp: &str) -> Self {
        Self(format!("{:x}", Sha256::digest(otp.trim().as_bytes())))
    }
}

impl AsRef<str> for OtpHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// An OTP that has been issued to a user and not yet used.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedOtp {
    /// The hash of the OTP that was emailed.
    pub hash: OtpHash,
    /// When the OTP stops working.
    pub expires_at: OffsetDateTime,
    /// The number of wrong guesses so far.
    pub failed_attempts: u32,
}

impl IssuedOtp {
    /// Whether `candidate` is the issued OTP and may still be used at `now`.
    pub fn accepts(&self, candidate: &str, now: OffsetDateTime) -> bool {
        self.failed_attempts < MAX_OTP_ATTEMPTS
            && now < self.expires_at
            && OtpHash::of(candidate) == self.hash
    }
}

/// Store the hash of a new OTP for `user_id`, replacing any earlier OTP and its attempt count.
///
/// # Errors
/// Returns a [Error::NotFound] if the user does not exist, or [Error::SqlError] for other SQL errors.
pub fn save_otp(
    user_id: UserId,
    hash: &OtpHash,
    expires_at: OffsetDateTime,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET reset_token_hash = ?1, reset_token_expiry = ?2, reset_attempts = 0
         WHERE id = ?3",
        params![hash.as_ref(), expires_at, user_id.as_i64()],
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

/// Get the OTP issued to `user_id`, or `None` if there is no unused OTP.
///
/// # Errors
/// Returns a [Error::NotFound] if the user does not exist, or [Error::SqlError] for other SQL errors.
pub fn get_issued_otp(user_id: UserId, connection: &Connection) -> Result<Option<IssuedOtp>, Error> {
    let row: (Option<String>, Option<OffsetDateTime>, u32) = connection
        .query_row(
            "SELECT reset_token_hash, reset_token_expiry, reset_attempts FROM user WHERE id = ?1",
            [user_id.as_i64()],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?
        .ok_or(Error::NotFound)?;

    Ok(match row {
        (Some(hash), Some(expires_at), failed_attempts) => Some(IssuedOtp {
            hash: OtpHash(hash),
            expires_at,
            failed_attempts,
        }),
        _ => None,
    })
}

/// Count a wrong guess against the OTP issued to `user_id`.
///
/// # Errors
/// Returns a [Error::SqlError] if there is an SQL error.
pub fn record_failed_attempt(user_id: UserId, connection: &Connection) -> Result<(), Error> {
    connection.execute(
        "UPDATE user SET reset_attempts = reset_attempts + 1 WHERE id = ?1",
        [user_id.as_i64()],
    )?;

    Ok(())
}

/// Remove the OTP issued to `user_id` so that it cannot be used again.
///
/// # Errors
/// Returns a [Error::SqlError] if there is an SQL error.
pub fn clear_otp(user_id: UserId, connection: &Connection) -> Result<(), Error> {
    connection.execute(
        "UPDATE user SET reset_token_hash = NULL, reset_token_expiry = NULL, reset_attempts = 0
         WHERE id = ?1",
        [user_id.as_i64()],
    )?;

    Ok(())
}


#[cfg(test)]
mod database_tests {
    use std::str::FromStr;

    use email_address::EmailAddress;
    use rusqlite::Connection;
    use time::{OffsetDateTime, macros::datetime};

    use crate::{
        Error, PasswordHash,
        auth::otp::{OtpHash, clear_otp, get_issued_otp, record_failed_attempt, save_otp},
        db::initialize,
        user::{NewUser, UserId, create_user},
    };

    fn get_test_connection() -> (Connection, UserId) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user(
            NewUser {
                name: "Alice".to_owned(),
                email: EmailAddress::from_str("alice@example.com").unwrap(),
                password_hash: PasswordHash::new_unchecked("hunter2"),
                phone: None,
                join_date: OffsetDateTime::now_utc(),
            },
            &conn,
        )
        .unwrap();

        (conn, user.id)
    }

    #[test]
    fn no_otp_before_one_is_issued() {
        let (conn, user_id) = get_test_connection();

        assert_eq!(get_issued_otp(user_id, &conn), Ok(None));
    }

    #[test]
    fn saved_otp_can_be_fetched() {
        let (conn, user_id) = get_test_connection();
        let expires_at = datetime!(2026-10-16 12:15:00 UTC);

        save_otp(user_id, &OtpHash::of("123456"), expires_at, &conn).unwrap();

        let issued = get_issued_otp(user_id, &conn).unwrap().unwrap();
        assert_eq!(issued.hash, OtpHash::of("123456"));
        assert_eq!(issued.expires_at, expires_at);
        assert_eq!(issued.failed_attempts, 0);
    }

    #[test]
    fn failed_attempts_are_counted_and_reset_by_new_otp() {
        let (conn, user_id) = get_test_connection();
        let expires_at = datetime!(2026-10-16 12:15:00 UTC);
        save_otp(user_id, &OtpHash::of("123456"), expires_at, &conn).unwrap();

        record_failed_attempt(user_id, &conn).unwrap();
        record_failed_attempt(user_id, &conn).unwrap();
        assert_eq!(
            get_issued_otp(user_id, &conn).unwrap().unwrap().failed_attempts,
            2
        );

        save_otp(user_id, &OtpHash::of("999999"), expires_at, &conn).unwrap();
        assert_eq!(
            get_issued_otp(user_id, &conn).unwrap().unwrap().failed_attempts,
            0
        );
    }

    #[test]
    fn cleared_otp_is_gone() {
        let (conn, user_id) = get_test_connection();
        save_otp(
            user_id,
            &OtpHash::of("123456"),
            datetime!(2026-10-16 12:15:00 UTC),
            &conn,
        )
        .unwrap();

        clear_otp(user_id, &conn).unwrap();

        assert_eq!(get_issued_otp(user_id, &conn), Ok(None));
    }

    #[test]
    fn missing_user_is_not_found() {
        let (conn, _) = get_test_connection();

        assert_eq!(get_issued_otp(UserId::new(42), &conn), Err(Error::NotFound));
        assert_eq!(
            save_otp(
                UserId::new(42),
                &OtpHash::of("123456"),
                OffsetDateTime::now_utc(),
                &conn
            ),
            Err(Error::NotFound)
        );
    }
}

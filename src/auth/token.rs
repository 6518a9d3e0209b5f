//! Bearer tokens: JSON Web Tokens that identify a logged in user.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, user::UserId};

/// How long a token is valid for after it is issued, unless configured otherwise.
pub const DEFAULT_TOKEN_DURATION: Duration = Duration::days(7);

/// The keys for signing and verifying tokens, derived from a shared secret.
#[derive(Clone)]
pub struct JwtKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtKeys {
    /// Create the HS256 signing and verification keys from `secret`.
    pub fn from_secret(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// The key used to verify tokens.
    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

/// The contents of a JSON Web Token.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// The ID of the user the token was issued to, as a string.
    pub sub: String,
    /// The time the token was issued as a unix timestamp.
    pub iat: u64,
    /// The expiry time of the token as a unix timestamp.
    pub exp: u64,
}

impl Claims {
    /// The user the token was issued to.
    ///
    /// # Errors
    /// Returns an [Error::Unauthorized] if the subject is not a user ID.
    pub fn user_id(&self) -> Result<UserId, Error> {
        self.sub
            .parse()
            .map(UserId::new)
            .map_err(|_| Error::Unauthorized)
    }
}

/// Create a signed token for `user_id` that expires after `duration`.
///
/// # Errors
/// Returns an [Error::TokenCreation] if the token could not be signed.
pub fn encode_jwt(user_id: UserId, keys: &JwtKeys, duration: Duration) -> Result<String, Error> {
    let now = OffsetDateTime::now_utc();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.unix_timestamp().max(0) as u64,
        exp: (now + duration).unix_timestamp().max(0) as u64,
    };

    encode(&Header::default(), &claims, &keys.encoding_key)
        .map_err(|error| Error::TokenCreation(error.to_string()))
}

/// Verify the signature and expiry of `token` and return its claims.
///
/// # Errors
/// Returns an [Error::Unauthorized] if the token is malformed, expired, or
/// was not signed with `decoding_key`.
pub fn decode_jwt(token: &str, decoding_key: &DecodingKey) -> Result<Claims, Error> {
    decode::<Claims>(token, decoding_key, &Validation::default())
        .map(|token_data| token_data.claims)
        .map_err(|error| {
            tracing::debug!("Rejected bearer token: {error}");
            Error::Unauthorized
        })
}

//! The endpoint for logging in and receiving a bearer token.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{
    AppState, Error,
    auth::token::{JwtKeys, encode_jwt},
    db::lock_connection,
    user::{User, UserId, get_user_by_email},
};

/// The state needed to perform a login.
#[derive(Clone)]
pub struct LogInState {
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The keys for signing the bearer token.
    pub jwt_keys: JwtKeys,
    /// How long the bearer token is valid for.
    pub token_duration: Duration,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            jwt_keys: state.jwt_keys.clone(),
            token_duration: state.token_duration,
        }
    }
}

/// The body of a log-in request.
#[derive(Debug, Deserialize)]
pub struct LogInForm {
    email: Option<String>,
    password: Option<String>,
}

/// The user details sent back with a bearer token.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionUser {
    id: UserId,
    name: String,
    email: String,
    phone: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    join_date: OffsetDateTime,
    language: Option<String>,
    currency: Option<String>,
    timezone: Option<String>,
}

impl From<User> for SessionUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email.to_string(),
            phone: user.phone,
            join_date: user.join_date,
            language: user.language,
            currency: user.currency,
            timezone: user.timezone,
        }
    }
}

#[derive(Debug, Serialize)]
struct LogInResponse {
    token: String,
    user: SessionUser,
}

/// Handler for log-in requests.
///
/// On success, responds with a bearer token and the user's details.
/// An unknown email and a wrong password give the same error so that
/// clients cannot tell which emails are registered.
pub async fn log_in(State(state): State<LogInState>, Json(form): Json<LogInForm>) -> Response {
    match check_credentials(&state, form) {
        Ok(response) => Json(response).into_response(),
        Err(error) => error.into_response(),
    }
}

fn check_credentials(state: &LogInState, form: LogInForm) -> Result<LogInResponse, Error> {
    let (Some(email), Some(password)) = (form.email, form.password) else {
        return Err(Error::InvalidCredentials);
    };

    let user = {
        let connection = lock_connection(&state.db_connection)?;

        match get_user_by_email(&email, &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => return Err(Error::InvalidCredentials),
            Err(error) => return Err(error),
        }
    };

    let is_password_correct = user.password_hash.verify(&password).map_err(|error| {
        tracing::error!("Error verifying password: {error}");
        Error::HashingError(error.to_string())
    })?;

    if !is_password_correct {
        return Err(Error::InvalidCredentials);
    }

    let token = encode_jwt(user.id, &state.jwt_keys, state.token_duration)?;

    tracing::info!("User {} logged in", user.id);

    Ok(LogInResponse {
        token,
        user: user.into(),
    })
}

#[cfg(test)]
mod log_in_tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        auth::token::decode_jwt,
        endpoints,
        test_utils::{assert_msg, must_create_test_app, must_create_user},
    };

    #[tokio::test]
    async fn log_in_succeeds_with_valid_credentials() {
        let app = must_create_test_app();
        let user = must_create_user(&app.state, "Alice", "alice@example.com");

        let response = app
            .server
            .post(endpoints::LOG_IN)
            .json(&json!({
                "email": "alice@example.com",
                "password": crate::test_utils::TEST_PASSWORD,
            }))
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        let token = body["token"].as_str().expect("token should be a string");
        let claims = decode_jwt(token, app.state.jwt_keys.decoding_key()).unwrap();
        assert_eq!(claims.user_id(), Ok(user.id));
        assert_eq!(body["user"]["id"], json!(user.id.as_i64()));
        assert_eq!(body["user"]["name"], json!("Alice"));
        assert_eq!(body["user"]["email"], json!("alice@example.com"));
        assert!(body["user"]["joinDate"].is_string());
        assert!(body["user"].get("password").is_none());
        assert!(body["user"].get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn log_in_ignores_email_case() {
        let app = must_create_test_app();
        must_create_user(&app.state, "Alice", "alice@example.com");

        let response = app
            .server
            .post(endpoints::LOG_IN)
            .json(&json!({
                "email": "ALICE@example.com",
                "password": crate::test_utils::TEST_PASSWORD,
            }))
            .await;

        response.assert_status_ok();
    }

    #[tokio::test]
    async fn log_in_fails_with_wrong_password() {
        let app = must_create_test_app();
        must_create_user(&app.state, "Alice", "alice@example.com");

        let response = app
            .server
            .post(endpoints::LOG_IN)
            .json(&json!({
                "email": "alice@example.com",
                "password": "definitely-not-the-password",
            }))
            .await;

        assert_msg(&response, StatusCode::BAD_REQUEST, "Invalid credentials");
    }

    #[tokio::test]
    async fn log_in_fails_with_unknown_email() {
        let app = must_create_test_app();

        let response = app
            .server
            .post(endpoints::LOG_IN)
            .json(&json!({
                "email": "nobody@example.com",
                "password": crate::test_utils::TEST_PASSWORD,
            }))
            .await;

        assert_msg(&response, StatusCode::BAD_REQUEST, "Invalid credentials");
    }

    #[tokio::test]
    async fn log_in_fails_with_missing_password() {
        let app = must_create_test_app();
        must_create_user(&app.state, "Alice", "alice@example.com");

        let response = app
            .server
            .post(endpoints::LOG_IN)
            .json(&json!({ "email": "alice@example.com" }))
            .await;

        assert_msg(&response, StatusCode::BAD_REQUEST, "Invalid credentials");
    }
}

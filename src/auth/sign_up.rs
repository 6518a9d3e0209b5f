//! The endpoint for registering a new user.

use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use axum::{
    Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use email_address::EmailAddress;
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;
use time::OffsetDateTime;

use crate::{
    AppState, Error, PasswordHash,
    db::lock_connection,
    mail::{Mailer, send_welcome_email},
    user::{NewUser, User, create_user},
};

/// The state needed to register a user.
#[derive(Clone)]
pub struct SignUpState {
    /// The database connection for managing users.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The bcrypt cost for the new password hash.
    pub password_cost: u32,
    /// Sends the welcome email.
    pub mailer: Arc<dyn Mailer>,
    /// The base URL of the web client for the link in the welcome email.
    pub frontend_url: String,
}

impl FromRef<AppState> for SignUpState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            password_cost: state.password_cost,
            mailer: state.mailer.clone(),
            frontend_url: state.frontend_url.clone(),
        }
    }
}

/// The body of a sign-up request.
#[derive(Debug, Deserialize)]
pub struct SignUpForm {
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
    phone: Option<String>,
}

const MISSING_FIELDS: &str = "Name, email, and password are required";

/// Register a new user and send them a welcome email.
///
/// The user is registered even if the welcome email could not be sent.
pub async fn sign_up(State(state): State<SignUpState>, Json(form): Json<SignUpForm>) -> Response {
    let user = match register(&state, form) {
        Ok(user) => user,
        Err(error) => return error.into_response(),
    };

    tracing::info!("Registered user {}", user.id);

    if let Err(error) = send_welcome_email(
        state.mailer.as_ref(),
        user.email.as_str(),
        &user.name,
        &state.frontend_url,
    )
    .await
    {
        tracing::error!("Could not send welcome email to {}: {error}", user.email);
    }

    Json(json!({ "msg": "User registered successfully. Check your email!" })).into_response()
}

fn register(state: &SignUpState, form: SignUpForm) -> Result<User, Error> {
    let name = form
        .name
        .map(|name| name.trim().to_owned())
        .filter(|name| !name.is_empty())
        .ok_or(Error::MissingFields(MISSING_FIELDS))?;
    let raw_email = form
        .email
        .map(|email| email.trim().to_owned())
        .filter(|email| !email.is_empty())
        .ok_or(Error::MissingFields(MISSING_FIELDS))?;
    let password = form
        .password
        .filter(|password| !password.is_empty())
        .ok_or(Error::MissingFields(MISSING_FIELDS))?;

    let email = EmailAddress::from_str(&raw_email)
        .map_err(|error| Error::InvalidEmail(error.to_string()))?;

    let password_hash = PasswordHash::from_raw_password(
        &password,
        &[&name, email.as_str()],
        state.password_cost,
    )?;

    let connection = lock_connection(&state.db_connection)?;

    create_user(
        NewUser {
            name,
            email,
            password_hash,
            phone: form.phone.filter(|phone| !phone.trim().is_empty()),
            join_date: OffsetDateTime::now_utc(),
        },
        &connection,
    )
}

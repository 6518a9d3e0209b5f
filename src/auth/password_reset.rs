//! The endpoints for resetting a forgotten password with an emailed OTP.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;
use time::OffsetDateTime;

use crate::{
    AppState, Error, PasswordHash,
    auth::otp::{
        OTP_DURATION, OneTimePassword, clear_otp, get_issued_otp, record_failed_attempt, save_otp,
    },
    db::lock_connection,
    mail::{Mailer, send_password_reset_email},
    user::{User, get_user_by_email, update_password},
};

/// The state needed for password resets.
#[derive(Clone)]
pub struct PasswordResetState {
    /// The database connection for managing users.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The bcrypt cost for the new password hash.
    pub password_cost: u32,
    /// Sends the OTP email.
    pub mailer: Arc<dyn Mailer>,
}

impl FromRef<AppState> for PasswordResetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            password_cost: state.password_cost,
            mailer: state.mailer.clone(),
        }
    }
}

/// The body of a forgot password request.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordForm {
    email: Option<String>,
}

/// Issue a new OTP for the user with the given email and email it to them.
///
/// Any earlier OTP for the user stops working. The request succeeds even if
/// the email could not be sent.
pub async fn forgot_password(
    State(state): State<PasswordResetState>,
    Json(form): Json<ForgotPasswordForm>,
) -> Response {
    let Some(email) = form
        .email
        .map(|email| email.trim().to_owned())
        .filter(|email| !email.is_empty())
    else {
        return Error::MissingFields("Email is required").into_response();
    };

    let otp = match issue_otp(&state, &email) {
        Ok(otp) => otp,
        Err(error) => return error.into_response(),
    };

    if let Err(error) = send_password_reset_email(state.mailer.as_ref(), &email, otp.as_ref()).await
    {
        tracing::error!("Could not send password reset email to {email}: {error}");
    }

    Json(json!({
        "msg": "Check your email for the OTP code",
        "email": email,
    }))
    .into_response()
}

fn issue_otp(state: &PasswordResetState, email: &str) -> Result<OneTimePassword, Error> {
    let connection = lock_connection(&state.db_connection)?;

    let user = match get_user_by_email(email, &connection) {
        Ok(user) => user,
        Err(Error::NotFound) => return Err(Error::UnknownEmail),
        Err(error) => return Err(error),
    };

    let otp = OneTimePassword::generate();
    save_otp(
        user.id,
        &otp.hash(),
        OffsetDateTime::now_utc() + OTP_DURATION,
        &connection,
    )?;

    tracing::info!("Issued password reset OTP for user {}", user.id);

    Ok(otp)
}

/// The body of a reset password request.
///
/// Older clients send `resetToken` instead of `otp` and `password` instead of `newPassword`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordForm {
    email: Option<String>,
    otp: Option<String>,
    reset_token: Option<String>,
    new_password: Option<String>,
    password: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

/// Set a new password for a user that has a valid OTP.
///
/// A wrong OTP counts towards the attempt limit. A successful reset uses up the OTP.
pub async fn reset_password(
    State(state): State<PasswordResetState>,
    Json(form): Json<ResetPasswordForm>,
) -> Response {
    match reset(&state, form) {
        Ok(()) => Json(json!({
            "msg": "Password reset successfully. Please login with your new password."
        }))
        .into_response(),
        Err(error) => error.into_response(),
    }
}

fn reset(state: &PasswordResetState, form: ResetPasswordForm) -> Result<(), Error> {
    let email = non_empty(form.email);
    let otp = non_empty(form.otp).or(non_empty(form.reset_token));
    let new_password = non_empty(form.new_password).or(non_empty(form.password));

    let (Some(email), Some(otp), Some(new_password)) = (email, otp, new_password) else {
        return Err(Error::MissingFields(
            "Email, OTP, and new password are required",
        ));
    };

    let user = check_otp(state, &email, &otp)?;

    let password_hash = PasswordHash::from_raw_password(
        &new_password,
        &[&user.name, user.email.as_str()],
        state.password_cost,
    )?;

    let connection = lock_connection(&state.db_connection)?;

    // Another reset may have used the OTP while the password was being hashed.
    match get_issued_otp(user.id, &connection)? {
        Some(issued_otp) if issued_otp.accepts(&otp, OffsetDateTime::now_utc()) => {}
        _ => return Err(Error::InvalidOtp),
    }

    update_password(user.id, &password_hash, &connection)?;
    clear_otp(user.id, &connection)?;

    tracing::info!("Reset password for user {}", user.id);

    Ok(())
}

/// Get the user with `email` if `otp` is their current OTP.
///
/// The database lock is released before returning so that hashing the new
/// password does not block other requests.
fn check_otp(state: &PasswordResetState, email: &str, otp: &str) -> Result<User, Error> {
    let connection = lock_connection(&state.db_connection)?;

    let user = match get_user_by_email(email, &connection) {
        Ok(user) => user,
        Err(Error::NotFound) => return Err(Error::InvalidOtp),
        Err(error) => return Err(error),
    };

    let Some(issued_otp) = get_issued_otp(user.id, &connection)? else {
        return Err(Error::InvalidOtp);
    };

    if !issued_otp.accepts(otp, OffsetDateTime::now_utc()) {
        record_failed_attempt(user.id, &connection)?;
        tracing::warn!("Rejected password reset OTP for user {}", user.id);
        return Err(Error::InvalidOtp);
    }

    Ok(user)
}

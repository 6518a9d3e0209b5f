//! Endpoints for checking that authentication and email delivery work.

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::{
    AppState, Error,
    mail::{Mailer, send_welcome_email},
    user::UserId,
};

/// The state needed to send a test email.
#[derive(Clone)]
pub struct TestEmailState {
    /// Sends the test email.
    pub mailer: Arc<dyn Mailer>,
    /// The base URL of the web client for the link in the email.
    pub frontend_url: String,
}

impl FromRef<AppState> for TestEmailState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            mailer: state.mailer.clone(),
            frontend_url: state.frontend_url.clone(),
        }
    }
}

/// The body of a test email request.
#[derive(Debug, Deserialize)]
pub struct TestEmailForm {
    email: Option<String>,
}

/// Send a welcome email to the given address to check the SMTP settings.
pub async fn send_test_email(
    State(state): State<TestEmailState>,
    Json(form): Json<TestEmailForm>,
) -> Response {
    let Some(email) = form.email.filter(|email| !email.trim().is_empty()) else {
        return Error::MissingFields("Email is required").into_response();
    };

    match send_welcome_email(
        state.mailer.as_ref(),
        email.trim(),
        "Test User",
        &state.frontend_url,
    )
    .await
    {
        Ok(()) => Json(json!({ "msg": "Test email sent successfully" })).into_response(),
        Err(error) => Error::EmailError(error.to_string()).into_response(),
    }
}

/// Respond with the ID of the authenticated user.
pub async fn get_protected(Extension(user_id): Extension<UserId>) -> Json<serde_json::Value> {
    Json(json!({
        "msg": "Protected data",
        "user": { "id": user_id },
    }))
}

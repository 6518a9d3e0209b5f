//! Endpoints for viewing and editing a user's profile.

use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use email_address::EmailAddress;
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState, Error,
    database_id::DatabaseId,
    db::lock_connection,
    timezone::get_local_offset,
    user::core::{ProfileUpdate, UserId, UserProfile, get_user_by_id, update_user_profile},
};

/// The state needed to view and edit profiles.
#[derive(Debug, Clone)]
pub struct ProfileState {
    /// The database connection for managing users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ProfileState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Check that the user in the path is the authenticated user.
///
/// Other users' profiles are reported as missing so that clients cannot
/// probe which user IDs exist.
pub(super) fn check_is_caller(path_id: DatabaseId, caller: UserId) -> Result<(), Error> {
    if path_id == caller.as_i64() {
        Ok(())
    } else {
        Err(Error::MissingUser)
    }
}

/// Get the profile of the authenticated user.
pub async fn get_profile(
    State(state): State<ProfileState>,
    Extension(caller): Extension<UserId>,
    Path(user_id): Path<DatabaseId>,
) -> Response {
    let result = check_is_caller(user_id, caller).and_then(|_| {
        let connection = lock_connection(&state.db_connection)?;
        get_user_by_id(caller, &connection).map_err(missing_user)
    });

    match result {
        Ok(user) => Json(UserProfile::from(user)).into_response(),
        Err(error) => error.into_response(),
    }
}

/// The body of a profile update. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileForm {
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    location: Option<String>,
    language: Option<String>,
    currency: Option<String>,
    timezone: Option<String>,
    monthly_budget: Option<f64>,
}

impl TryFrom<ProfileForm> for ProfileUpdate {
    type Error = Error;

    fn try_from(form: ProfileForm) -> Result<Self, Self::Error> {
        let name = match form.name {
            Some(name) if name.trim().is_empty() => {
                return Err(Error::InvalidField("Name cannot be empty".to_owned()));
            }
            name => name.map(|name| name.trim().to_owned()),
        };

        let email = form
            .email
            .map(|email| EmailAddress::from_str(email.trim()))
            .transpose()
            .map_err(|error| Error::InvalidEmail(error.to_string()))?;

        if let Some(timezone) = &form.timezone {
            if get_local_offset(timezone).is_none() {
                return Err(Error::InvalidField(format!("Unknown timezone: {timezone}")));
            }
        }

        if form
            .monthly_budget
            .is_some_and(|budget| !(budget.is_finite() && budget >= 0.0))
        {
            return Err(Error::InvalidField(
                "Monthly budget cannot be negative".to_owned(),
            ));
        }

        Ok(ProfileUpdate {
            name,
            email,
            phone: form.phone,
            location: form.location,
            language: form.language,
            currency: form.currency,
            timezone: form.timezone,
            monthly_budget: form.monthly_budget,
        })
    }
}

/// Update the profile of the authenticated user.
pub async fn update_profile(
    State(state): State<ProfileState>,
    Extension(caller): Extension<UserId>,
    Path(user_id): Path<DatabaseId>,
    Json(form): Json<ProfileForm>,
) -> Response {
    let result = check_is_caller(user_id, caller)
        .and_then(|_| ProfileUpdate::try_from(form))
        .and_then(|update| {
            let connection = lock_connection(&state.db_connection)?;
            update_user_profile(caller, &update, &connection).map_err(missing_user)
        });

    match result {
        Ok(user) => {
            tracing::info!("Updated profile of user {}", user.id);
            Json(json!({
                "msg": "Profile updated successfully",
                "user": UserProfile::from(user),
            }))
            .into_response()
        }
        Err(error) => error.into_response(),
    }
}

pub(super) fn missing_user(error: Error) -> Error {
    match error {
        Error::NotFound => Error::MissingUser,
        error => error,
    }
}

#[cfg(test)]
mod profile_endpoint_tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        endpoints::{self, format_endpoint},
        test_utils::{assert_msg, must_create_test_app, must_create_user, must_log_in},
    };

    #[tokio::test]
    async fn get_profile_returns_public_fields() {
        let app = must_create_test_app();
        let user = must_create_user(&app.state, "Alice", "alice@example.com");
        let token = must_log_in(&app.state, user.id);

        let response = app
            .server
            .get(&format_endpoint(endpoints::USER, user.id.as_i64()))
            .authorization_bearer(token)
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["id"], json!(user.id.as_i64()));
        assert_eq!(body["name"], json!("Alice"));
        assert_eq!(body["email"], json!("alice@example.com"));
        assert_eq!(body["monthlyBudget"], json!(0.0));
        assert_eq!(body["timezone"], Value::Null);
        assert!(body["joinDate"].is_string());
        assert!(body.get("password").is_none());
    }

    #[tokio::test]
    async fn get_profile_of_other_user_is_not_found() {
        let app = must_create_test_app();
        let alice = must_create_user(&app.state, "Alice", "alice@example.com");
        let bob = must_create_user(&app.state, "Bob", "bob@example.com");
        let token = must_log_in(&app.state, alice.id);

        let response = app
            .server
            .get(&format_endpoint(endpoints::USER, bob.id.as_i64()))
            .authorization_bearer(token)
            .await;

        assert_msg(&response, StatusCode::NOT_FOUND, "User not found");
    }

    #[tokio::test]
    async fn get_profile_requires_token() {
        let app = must_create_test_app();
        let user = must_create_user(&app.state, "Alice", "alice@example.com");

        app.server
            .get(&format_endpoint(endpoints::USER, user.id.as_i64()))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn update_profile_changes_given_fields() {
        let app = must_create_test_app();
        let user = must_create_user(&app.state, "Alice", "alice@example.com");
        let token = must_log_in(&app.state, user.id);

        let response = app
            .server
            .put(&format_endpoint(endpoints::USER, user.id.as_i64()))
            .authorization_bearer(token)
            .json(&json!({
                "location": "Auckland",
                "currency": "NZD",
                "timezone": "Pacific/Auckland",
                "monthlyBudget": 2500.0,
            }))
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["msg"], json!("Profile updated successfully"));
        assert_eq!(body["user"]["name"], json!("Alice"));
        assert_eq!(body["user"]["location"], json!("Auckland"));
        assert_eq!(body["user"]["currency"], json!("NZD"));
        assert_eq!(body["user"]["timezone"], json!("Pacific/Auckland"));
        assert_eq!(body["user"]["monthlyBudget"], json!(2500.0));
    }

    #[tokio::test]
    async fn update_profile_rejects_negative_budget() {
        let app = must_create_test_app();
        let user = must_create_user(&app.state, "Alice", "alice@example.com");
        let token = must_log_in(&app.state, user.id);

        let response = app
            .server
            .put(&format_endpoint(endpoints::USER, user.id.as_i64()))
            .authorization_bearer(token)
            .json(&json!({ "monthlyBudget": -1.0 }))
            .await;

        assert_msg(
            &response,
            StatusCode::BAD_REQUEST,
            "Monthly budget cannot be negative",
        );
    }

    #[tokio::test]
    async fn update_profile_rejects_invalid_email() {
        let app = must_create_test_app();
        let user = must_create_user(&app.state, "Alice", "alice@example.com");
        let token = must_log_in(&app.state, user.id);

        let response = app
            .server
            .put(&format_endpoint(endpoints::USER, user.id.as_i64()))
            .authorization_bearer(token)
            .json(&json!({ "email": "alice" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_profile_rejects_taken_email() {
        let app = must_create_test_app();
        let user = must_create_user(&app.state, "Alice", "alice@example.com");
        must_create_user(&app.state, "Bob", "bob@example.com");
        let token = must_log_in(&app.state, user.id);

        let response = app
            .server
            .put(&format_endpoint(endpoints::USER, user.id.as_i64()))
            .authorization_bearer(token)
            .json(&json!({ "email": "bob@example.com" }))
            .await;

        assert_msg(&response, StatusCode::BAD_REQUEST, "User already exists");
    }

    #[tokio::test]
    async fn update_profile_rejects_unknown_timezone() {
        let app = must_create_test_app();
        let user = must_create_user(&app.state, "Alice", "alice@example.com");
        let token = must_log_in(&app.state, user.id);

        let response = app
            .server
            .put(&format_endpoint(endpoints::USER, user.id.as_i64()))
            .authorization_bearer(token)
            .json(&json!({ "timezone": "Middle/Earth" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_profile_of_other_user_is_not_found() {
        let app = must_create_test_app();
        let alice = must_create_user(&app.state, "Alice", "alice@example.com");
        let bob = must_create_user(&app.state, "Bob", "bob@example.com");
        let token = must_log_in(&app.state, alice.id);

        let response = app
            .server
            .put(&format_endpoint(endpoints::USER, bob.id.as_i64()))
            .authorization_bearer(token)
            .json(&json!({ "name": "Mallory" }))
            .await;

        assert_msg(&response, StatusCode::NOT_FOUND, "User not found");
    }
}

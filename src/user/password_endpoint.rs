use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState, Error, PasswordHash,
    database_id::DatabaseId,
    db::lock_connection,
    user::{
        core::{UserId, get_user_by_id, update_password},
        profile_endpoint::{check_is_caller, missing_user},
    },
};

/// The state needed to change a password.
#[derive(Debug, Clone)]
pub struct UpdatePasswordState {
    /// The database connection for managing users.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The bcrypt cost for the new password hash.
    pub password_cost: u32,
}

impl FromRef<AppState> for UpdatePasswordState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            password_cost: state.password_cost,
        }
    }
}

/// The body of a password change.
#[derive(Debug, Deserialize)]
pub struct UpdatePasswordForm {
    password: Option<String>,
}

/// Replace the password of the authenticated user.
pub async fn update_password_endpoint(
    State(state): State<UpdatePasswordState>,
    Extension(caller): Extension<UserId>,
    Path(user_id): Path<DatabaseId>,
    Json(form): Json<UpdatePasswordForm>,
) -> Response {
    match change_password(&state, caller, user_id, form) {
        Ok(()) => {
            tracing::info!("Updated password of user {caller}");
            Json(json!({ "msg": "Password updated successfully" })).into_response()
        }
        Err(error) => error.into_response(),
    }
}

fn change_password(
    state: &UpdatePasswordState,
    caller: UserId,
    user_id: DatabaseId,
    form: UpdatePasswordForm,
) -> Result<(), Error> {
    check_is_caller(user_id, caller)?;

    let password = form
        .password
        .filter(|password| !password.is_empty())
        .ok_or(Error::MissingFields("Password required"))?;

    let user = {
        let connection = lock_connection(&state.db_connection)?;
        get_user_by_id(caller, &connection).map_err(missing_user)?
    };

    let password_hash = PasswordHash::from_raw_password(
        &password,
        &[&user.name, user.email.as_str()],
        state.password_cost,
    )?;

    let connection = lock_connection(&state.db_connection)?;
    update_password(caller, &password_hash, &connection).map_err(missing_user)
}

#[cfg(test)]
mod update_password_tests {
    use std::{
        thread,
        time::{Duration, Instant},
    };

    use axum::http::StatusCode;
    use serde_json::json;

    use crate::{
        endpoints::{self, format_endpoint},
        test_utils::{assert_msg, must_create_test_app, must_create_user, must_log_in},
        user::get_user_by_id,
    };

    use super::{UpdatePasswordForm, UpdatePasswordState, change_password};

    #[tokio::test]
    async fn update_password_succeeds() {
        let app = must_create_test_app();
        let user = must_create_user(&app.state, "Alice", "alice@example.com");
        let token = must_log_in(&app.state, user.id);
        let new_password = "a-brand-new-tortoise-shell-77";

        let response = app
            .server
            .put(&format_endpoint(endpoints::USER_PASSWORD, user.id.as_i64()))
            .authorization_bearer(token)
            .json(&json!({ "password": new_password }))
            .await;

        assert_msg(&response, StatusCode::OK, "Password updated successfully");
        let user = get_user_by_id(user.id, &app.state.db_connection.lock().unwrap()).unwrap();
        assert!(user.password_hash.verify(new_password).unwrap());
    }

    #[tokio::test]
    async fn update_password_fails_without_password() {
        let app = must_create_test_app();
        let user = must_create_user(&app.state, "Alice", "alice@example.com");
        let token = must_log_in(&app.state, user.id);

        let response = app
            .server
            .put(&format_endpoint(endpoints::USER_PASSWORD, user.id.as_i64()))
            .authorization_bearer(token)
            .json(&json!({}))
            .await;

        assert_msg(&response, StatusCode::BAD_REQUEST, "Password required");
    }

    #[tokio::test]
    async fn update_password_fails_on_weak_password() {
        let app = must_create_test_app();
        let user = must_create_user(&app.state, "Alice", "alice@example.com");
        let token = must_log_in(&app.state, user.id);

        let response = app
            .server
            .put(&format_endpoint(endpoints::USER_PASSWORD, user.id.as_i64()))
            .authorization_bearer(token)
            .json(&json!({ "password": "alice" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_password_of_other_user_is_not_found() {
        let app = must_create_test_app();
        let alice = must_create_user(&app.state, "Alice", "alice@example.com");
        let bob = must_create_user(&app.state, "Bob", "bob@example.com");
        let token = must_log_in(&app.state, alice.id);

        let response = app
            .server
            .put(&format_endpoint(endpoints::USER_PASSWORD, bob.id.as_i64()))
            .authorization_bearer(token)
            .json(&json!({ "password": "a-brand-new-tortoise-shell-77" }))
            .await;

        assert_msg(&response, StatusCode::NOT_FOUND, "User not found");
    }

    #[tokio::test]
    async fn database_is_not_locked_while_hashing_password() {
        let app = must_create_test_app();
        let user = must_create_user(&app.state, "Alice", "alice@example.com");
        let state = UpdatePasswordState {
            db_connection: app.state.db_connection.clone(),
            password_cost: 12,
        };

        let changer = thread::spawn(move || {
            change_password(
                &state,
                user.id,
                user.id.as_i64(),
                UpdatePasswordForm {
                    password: Some("a-brand-new-tortoise-shell-77".to_owned()),
                },
            )
        });
        thread::sleep(Duration::from_millis(20));

        let start = Instant::now();
        drop(app.state.db_connection.lock().unwrap());
        let waited = start.elapsed();

        assert_eq!(changer.join().unwrap(), Ok(()));
        assert!(
            waited < Duration::from_millis(100),
            "waited {waited:?} for the database lock"
        );
    }
}

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    database_id::DatabaseId,
    db::lock_connection,
    goal::core::{get_goal, get_goals},
    user::UserId,
};

/// The state needed to read goals.
#[derive(Debug, Clone)]
pub struct GoalsState {
    /// The database connection for managing goals.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for GoalsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

pub(super) fn missing_goal(error: Error) -> Error {
    match error {
        Error::NotFound => Error::MissingGoal,
        error => error,
    }
}

/// List the goals of the authenticated user, most recently created first.
pub async fn list_goals(
    State(state): State<GoalsState>,
    Extension(user_id): Extension<UserId>,
) -> Response {
    let result = lock_connection(&state.db_connection)
        .and_then(|connection| get_goals(user_id, None, &connection));

    match result {
        Ok(goals) => Json(goals).into_response(),
        Err(error) => error.into_response(),
    }
}

/// Get a single goal of the authenticated user.
pub async fn get_goal_endpoint(
    State(state): State<GoalsState>,
    Extension(user_id): Extension<UserId>,
    Path(goal_id): Path<DatabaseId>,
) -> Response {
    let result = lock_connection(&state.db_connection)
        .and_then(|connection| get_goal(goal_id, user_id, &connection).map_err(missing_goal));

    match result {
        Ok(goal) => Json(goal).into_response(),
        Err(error) => error.into_response(),
    }
}

#[cfg(test)]
mod list_goals_tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        endpoints::{self, format_endpoint},
        test_utils::{
            assert_msg, must_create_goal, must_create_test_app, must_create_user, must_log_in,
        },
    };

    #[tokio::test]
    async fn lists_own_goals_newest_first() {
        let app = must_create_test_app();
        let alice = must_create_user(&app.state, "Alice", "alice@example.com");
        let bob = must_create_user(&app.state, "Bob", "bob@example.com");
        let car = must_create_goal(&app.state, alice.id, "Car", 15000.0, 0.0);
        let holiday = must_create_goal(&app.state, alice.id, "Holiday", 3000.0, 1500.0);
        must_create_goal(&app.state, bob.id, "Boat", 50000.0, 0.0);
        let token = must_log_in(&app.state, alice.id);

        let response = app
            .server
            .get(endpoints::GOALS)
            .authorization_bearer(token)
            .await;

        response.assert_status_ok();
        let body = response.json::<Vec<Value>>();
        let ids: Vec<_> = body.iter().map(|goal| goal["id"].clone()).collect();
        assert_eq!(ids, vec![json!(holiday.id), json!(car.id)]);
        assert_eq!(body[0]["progress"], json!(50.0));
        assert_eq!(body[0]["status"], json!("active"));
        assert_eq!(body[0]["targetAmount"], json!(3000.0));
        assert_eq!(body[0]["deadline"], json!("2026-12-01"));
    }

    #[tokio::test]
    async fn gets_goal() {
        let app = must_create_test_app();
        let user = must_create_user(&app.state, "Alice", "alice@example.com");
        let goal = must_create_goal(&app.state, user.id, "Car", 15000.0, 15000.0);
        let token = must_log_in(&app.state, user.id);

        let response = app
            .server
            .get(&format_endpoint(endpoints::GOAL, goal.id))
            .authorization_bearer(token)
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["title"], json!("Car"));
        assert_eq!(body["status"], json!("completed"));
    }

    #[tokio::test]
    async fn other_users_goal_is_not_found() {
        let app = must_create_test_app();
        let alice = must_create_user(&app.state, "Alice", "alice@example.com");
        let bob = must_create_user(&app.state, "Bob", "bob@example.com");
        let goal = must_create_goal(&app.state, bob.id, "Boat", 50000.0, 0.0);
        let token = must_log_in(&app.state, alice.id);

        let response = app
            .server
            .get(&format_endpoint(endpoints::GOAL, goal.id))
            .authorization_bearer(token)
            .await;

        assert_msg(&response, StatusCode::NOT_FOUND, "Goal not found");
    }
}

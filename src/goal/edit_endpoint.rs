use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState, Error,
    database_id::DatabaseId,
    db::lock_connection,
    goal::{
        core::{Goal, delete_goal, update_goal},
        form::GoalForm,
        list_endpoint::missing_goal,
    },
    user::UserId,
};

/// The state needed to edit or delete a goal.
#[derive(Debug, Clone)]
pub struct EditGoalState {
    /// The database connection for managing goals.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditGoalState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

fn edit(
    state: &EditGoalState,
    user_id: UserId,
    goal_id: DatabaseId,
    form: GoalForm,
) -> Result<Goal, Error> {
    let update = form.into_update()?;

    let connection = lock_connection(&state.db_connection)?;
    update_goal(goal_id, user_id, &update, &connection).map_err(missing_goal)
}

/// Change the fields given in the body of a goal, responds with the updated goal.
pub async fn edit_goal_endpoint(
    State(state): State<EditGoalState>,
    Extension(user_id): Extension<UserId>,
    Path(goal_id): Path<DatabaseId>,
    Json(form): Json<GoalForm>,
) -> Response {
    match edit(&state, user_id, goal_id, form) {
        Ok(goal) => {
            tracing::info!("Updated goal {} ({}%)", goal.id, goal.progress);
            Json(goal).into_response()
        }
        Err(error) => error.into_response(),
    }
}

/// Delete a goal of the authenticated user.
pub async fn delete_goal_endpoint(
    State(state): State<EditGoalState>,
    Extension(user_id): Extension<UserId>,
    Path(goal_id): Path<DatabaseId>,
) -> Response {
    let result = lock_connection(&state.db_connection)
        .and_then(|connection| delete_goal(goal_id, user_id, &connection).map_err(missing_goal));

    match result {
        Ok(()) => {
            tracing::info!("Deleted goal {goal_id}");
            Json(json!({ "msg": "Goal deleted successfully" })).into_response()
        }
        Err(error) => error.into_response(),
    }
}

#[cfg(test)]
mod edit_goal_tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        endpoints::{self, format_endpoint},
        test_utils::{
            assert_msg, must_create_goal, must_create_test_app, must_create_user, must_log_in,
        },
    };

    #[tokio::test]
    async fn reaching_target_completes_goal() {
        let app = must_create_test_app();
        let user = must_create_user(&app.state, "Alice", "alice@example.com");
        let goal = must_create_goal(&app.state, user.id, "Car", 15000.0, 5000.0);
        let token = must_log_in(&app.state, user.id);

        let response = app
            .server
            .put(&format_endpoint(endpoints::GOAL, goal.id))
            .authorization_bearer(token)
            .json(&json!({ "currentAmount": 15000 }))
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["progress"], json!(100.0));
        assert_eq!(body["status"], json!("completed"));
        assert_eq!(body["title"], json!("Car"));
    }

    #[tokio::test]
    async fn edit_other_users_goal_is_not_found() {
        let app = must_create_test_app();
        let alice = must_create_user(&app.state, "Alice", "alice@example.com");
        let bob = must_create_user(&app.state, "Bob", "bob@example.com");
        let goal = must_create_goal(&app.state, bob.id, "Boat", 50000.0, 0.0);
        let token = must_log_in(&app.state, alice.id);

        let response = app
            .server
            .put(&format_endpoint(endpoints::GOAL, goal.id))
            .authorization_bearer(token)
            .json(&json!({ "currentAmount": 50000 }))
            .await;

        assert_msg(&response, StatusCode::NOT_FOUND, "Goal not found");
    }

    #[tokio::test]
    async fn deletes_goal() {
        let app = must_create_test_app();
        let user = must_create_user(&app.state, "Alice", "alice@example.com");
        let goal = must_create_goal(&app.state, user.id, "Car", 15000.0, 0.0);
        let token = must_log_in(&app.state, user.id);

        let response = app
            .server
            .delete(&format_endpoint(endpoints::GOAL, goal.id))
            .authorization_bearer(&token)
            .await;

        assert_msg(&response, StatusCode::OK, "Goal deleted successfully");

        let response = app
            .server
            .get(&format_endpoint(endpoints::GOAL, goal.id))
            .authorization_bearer(&token)
            .await;

        assert_msg(&response, StatusCode::NOT_FOUND, "Goal not found");
    }

    #[tokio::test]
    async fn delete_missing_goal() {
        let app = must_create_test_app();
        let user = must_create_user(&app.state, "Alice", "alice@example.com");
        let token = must_log_in(&app.state, user.id);

        let response = app
            .server
            .delete(&format_endpoint(endpoints::GOAL, 7))
            .authorization_bearer(token)
            .await;

        assert_msg(&response, StatusCode::NOT_FOUND, "Goal not found");
    }
}

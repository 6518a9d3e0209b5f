use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    db::lock_connection,
    goal::{
        core::{Goal, create_goal},
        form::GoalForm,
    },
    user::UserId,
};

/// The state needed to create a goal.
#[derive(Debug, Clone)]
pub struct CreateGoalState {
    /// The database connection for managing goals.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateGoalState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

fn create(state: &CreateGoalState, user_id: UserId, form: GoalForm) -> Result<Goal, Error> {
    let new_goal = form.into_new_goal()?;

    let connection = lock_connection(&state.db_connection)?;
    create_goal(user_id, new_goal, &connection).map_err(|error| match error {
        Error::NotFound => Error::MissingUser,
        error => error,
    })
}

/// Create a goal for the authenticated user, responds with 201 Created.
pub async fn create_goal_endpoint(
    State(state): State<CreateGoalState>,
    Extension(user_id): Extension<UserId>,
    Json(form): Json<GoalForm>,
) -> Response {
    match create(&state, user_id, form) {
        Ok(goal) => {
            tracing::info!("Created goal {} for user {user_id}", goal.id);
            (StatusCode::CREATED, Json(goal)).into_response()
        }
        Err(error) => error.into_response(),
    }
}

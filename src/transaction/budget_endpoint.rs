//! How much of the monthly budget is left after this month's expenses.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Serialize;

use crate::{
    AppState, Error,
    dashboard::month_containing,
    db::lock_connection,
    timezone::today_in,
    transaction::core::{TransactionKind, sum_transactions_in_date_range},
    user::{UserId, get_user_by_id},
};

/// The state needed to work out the remaining budget.
#[derive(Debug, Clone)]
pub struct RemainingBudgetState {
    /// The database connection for reading users and expenses.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The server's timezone, used when the user has not set one.
    pub local_timezone: String,
}

impl FromRef<AppState> for RemainingBudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The monthly budget against the current month's expenses.
#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemainingBudget {
    monthly_budget: f64,
    total_spent: f64,
    remaining_budget: f64,
    spent_percentage: f64,
}

impl RemainingBudget {
    fn new(monthly_budget: f64, total_spent: f64) -> Self {
        let spent_percentage = if monthly_budget > 0.0 {
            total_spent / monthly_budget * 100.0
        } else {
            0.0
        };

        Self {
            monthly_budget,
            total_spent,
            remaining_budget: monthly_budget - total_spent,
            spent_percentage,
        }
    }
}

fn remaining_budget(
    state: &RemainingBudgetState,
    user_id: UserId,
) -> Result<RemainingBudget, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let user = get_user_by_id(user_id, &connection).map_err(|error| match error {
        Error::NotFound => Error::MissingUser,
        error => error,
    })?;

    let today = today_in(user.timezone.as_deref(), &state.local_timezone);
    let total_spent = sum_transactions_in_date_range(
        user_id,
        TransactionKind::Expense,
        month_containing(today),
        &connection,
    )?;

    Ok(RemainingBudget::new(user.monthly_budget, total_spent))
}

/// Get the remaining budget of the authenticated user for the current month.
pub async fn get_remaining_budget(
    State(state): State<RemainingBudgetState>,
    Extension(user_id): Extension<UserId>,
) -> Response {
    match remaining_budget(&state, user_id) {
        Ok(budget) => Json(budget).into_response(),
        Err(error) => error.into_response(),
    }
}

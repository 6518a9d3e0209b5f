//! Dashboard HTTP handlers.
//!
//! This module contains:
//! - The monthly summary of budget, income, expenses and goals
//! - The combined list of incomes and expenses

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
    dashboard::{
        aggregation::{BudgetFigures, CategoryTotal, aggregate},
        month::{month_containing, month_label},
    },
    db::lock_connection,
    goal::{Goal, GoalStatus, get_goals},
    timezone::today_in,
    transaction::{Transaction, get_transactions, get_transactions_in_date_range},
    user::{UserId, get_user_by_id},
};

/// How many of the latest transactions the summary includes.
const RECENT_TRANSACTION_COUNT: u32 = 10;

/// The state needed for the dashboard endpoints.
///
/// Contains the database connection and timezone information required
/// by dashboard handlers.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading users, transactions and goals.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// Used for users that have not set their own timezone.
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// An overview of the current month.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    monthly_budget: f64,
    total_expenses: f64,
    total_income: f64,
    remaining_credits: f64,
    net_income: f64,
    expense_percentage: f64,
    income_percentage: f64,
    category_breakdown: Vec<CategoryTotal>,
    recent_transactions: Vec<Transaction>,
    active_goals: Vec<Goal>,
    month: String,
}

fn build_summary(
    user_id: UserId,
    local_timezone: &str,
    connection: &Connection,
) -> Result<DashboardSummary, Error> {
    let user = get_user_by_id(user_id, connection).map_err(|error| match error {
        Error::NotFound => Error::MissingUser,
        error => error,
    })?;

    let today = today_in(user.timezone.as_deref(), local_timezone);
    let this_month = get_transactions_in_date_range(user_id, month_containing(today), connection)?;
    let totals = aggregate(&this_month);
    let figures = BudgetFigures::new(user.monthly_budget, &totals);

    let recent_transactions =
        get_transactions(user_id, None, Some(RECENT_TRANSACTION_COUNT), connection)?;
    let active_goals = get_goals(user_id, Some(GoalStatus::Active), connection)?;

    Ok(DashboardSummary {
        monthly_budget: user.monthly_budget,
        total_expenses: totals.expenses,
        total_income: totals.income,
        remaining_credits: figures.remaining_credits,
        net_income: figures.net_income,
        expense_percentage: figures.expense_percentage,
        income_percentage: figures.income_percentage,
        category_breakdown: totals.category_breakdown,
        recent_transactions,
        active_goals,
        month: month_label(today),
    })
}

/// Get the summary of the current month for the authenticated user.
///
/// The month is taken from the user's timezone if they have set one, otherwise
/// the server's timezone.
pub async fn get_dashboard_summary(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Response, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let summary = build_summary(user_id, &state.local_timezone, &connection)?;

    Ok(Json(summary).into_response())
}

/// Get every income and expense of the authenticated user, newest first.
pub async fn get_dashboard_transactions(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Response, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let transactions = get_transactions(user_id, None, None, &connection)?;

    Ok(Json(transactions).into_response())
}

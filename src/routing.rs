//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::{
    AppState,
    auth::{
        auth_guard, forgot_password, get_protected, log_in, reset_password, send_test_email,
        sign_up,
    },
    dashboard::{get_dashboard_summary, get_dashboard_transactions},
    endpoints,
    goal::{
        create_goal_endpoint, delete_goal_endpoint, edit_goal_endpoint, get_goal_endpoint,
        list_goals,
    },
    transaction::{
        create_expense, create_income, delete_expense, delete_income, edit_expense, edit_income,
        get_expense, get_income, get_remaining_budget, list_expenses, list_incomes,
    },
    user::{get_profile, update_password_endpoint, update_profile},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::ROOT, get(get_root))
        .route(endpoints::SIGN_UP, post(sign_up))
        .route(endpoints::LOG_IN, post(log_in))
        .route(endpoints::FORGOT_PASSWORD, post(forgot_password))
        .route(endpoints::RESET_PASSWORD, post(reset_password));

    let protected_routes = Router::new()
        .route(endpoints::TEST_EMAIL, post(send_test_email))
        .route(endpoints::PROTECTED, get(get_protected))
        .route(endpoints::USER, get(get_profile).put(update_profile))
        .route(endpoints::USER_PASSWORD, put(update_password_endpoint))
        .route(endpoints::INCOMES, get(list_incomes).post(create_income))
        .route(
            endpoints::INCOME,
            get(get_income).put(edit_income).delete(delete_income),
        )
        .route(endpoints::EXPENSES, get(list_expenses).post(create_expense))
        .route(
            endpoints::EXPENSE,
            get(get_expense).put(edit_expense).delete(delete_expense),
        )
        .route(endpoints::REMAINING_BUDGET, get(get_remaining_budget))
        .route(endpoints::GOALS, get(list_goals).post(create_goal_endpoint))
        .route(
            endpoints::GOAL,
            get(get_goal_endpoint)
                .put(edit_goal_endpoint)
                .delete(delete_goal_endpoint),
        )
        .route(endpoints::DASHBOARD_SUMMARY, get(get_dashboard_summary))
        .route(
            endpoints::DASHBOARD_TRANSACTIONS,
            get(get_dashboard_transactions),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn get_root() -> &'static str {
    "Finance Tracker API Running"
}

async fn get_404_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "msg": "Route not found" })),
    )
}

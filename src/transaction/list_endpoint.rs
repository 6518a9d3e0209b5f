//! Endpoints for reading incomes and expenses.

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
    transaction::core::{TransactionKind, get_transaction, get_transactions},
    user::UserId,
};

/// The state needed to read transactions.
#[derive(Debug, Clone)]
pub struct TransactionsState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Turn a missing row into the not found error for `kind`.
pub(super) fn missing_transaction(kind: TransactionKind) -> impl FnOnce(Error) -> Error {
    move |error| match error {
        Error::NotFound => Error::MissingTransaction(kind),
        error => error,
    }
}

fn list(state: &TransactionsState, user_id: UserId, kind: TransactionKind) -> Response {
    let result = lock_connection(&state.db_connection)
        .and_then(|connection| get_transactions(user_id, Some(kind), None, &connection));

    match result {
        Ok(transactions) => Json(transactions).into_response(),
        Err(error) => error.into_response(),
    }
}

fn get_one(
    state: &TransactionsState,
    user_id: UserId,
    kind: TransactionKind,
    transaction_id: DatabaseId,
) -> Response {
    let result = lock_connection(&state.db_connection).and_then(|connection| {
        get_transaction(transaction_id, user_id, kind, &connection)
            .map_err(missing_transaction(kind))
    });

    match result {
        Ok(transaction) => Json(transaction).into_response(),
        Err(error) => error.into_response(),
    }
}

/// List the incomes of the authenticated user, newest first.
pub async fn list_incomes(
    State(state): State<TransactionsState>,
    Extension(user_id): Extension<UserId>,
) -> Response {
    list(&state, user_id, TransactionKind::Income)
}

/// List the expenses of the authenticated user, newest first.
pub async fn list_expenses(
    State(state): State<TransactionsState>,
    Extension(user_id): Extension<UserId>,
) -> Response {
    list(&state, user_id, TransactionKind::Expense)
}

/// Get a single income of the authenticated user.
pub async fn get_income(
    State(state): State<TransactionsState>,
    Extension(user_id): Extension<UserId>,
    Path(transaction_id): Path<DatabaseId>,
) -> Response {
    get_one(&state, user_id, TransactionKind::Income, transaction_id)
}

/// Get a single expense of the authenticated user.
pub async fn get_expense(
    State(state): State<TransactionsState>,
    Extension(user_id): Extension<UserId>,
    Path(transaction_id): Path<DatabaseId>,
) -> Response {
    get_one(&state, user_id, TransactionKind::Expense, transaction_id)
}

#[cfg(test)]
mod list_endpoint_tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use time::macros::date;

    use crate::{
        endpoints::{self, format_endpoint},
        test_utils::{
            assert_msg, must_create_test_app, must_create_transaction, must_create_user,
            must_log_in,
        },
        transaction::{Transaction, TransactionKind},
    };

    #[tokio::test]
    async fn lists_only_own_records_of_kind() {
        let app = must_create_test_app();
        let alice = must_create_user(&app.state, "Alice", "alice@example.com");
        let bob = must_create_user(&app.state, "Bob", "bob@example.com");
        let older = must_create_transaction(
            &app.state,
            alice.id,
            Transaction::build(
                TransactionKind::Income,
                "Salary",
                5000.0,
                "Salary",
                date!(2025 - 09 - 01),
            ),
        );
        let newer = must_create_transaction(
            &app.state,
            alice.id,
            Transaction::build(
                TransactionKind::Income,
                "Bonus",
                500.0,
                "Salary",
                date!(2025 - 10 - 01),
            ),
        );
        must_create_transaction(
            &app.state,
            alice.id,
            Transaction::build(
                TransactionKind::Expense,
                "Rent",
                1500.0,
                "Housing",
                date!(2025 - 10 - 02),
            ),
        );
        must_create_transaction(
            &app.state,
            bob.id,
            Transaction::build(
                TransactionKind::Income,
                "Salary",
                4000.0,
                "Salary",
                date!(2025 - 10 - 01),
            ),
        );
        let token = must_log_in(&app.state, alice.id);

        let response = app
            .server
            .get(endpoints::INCOMES)
            .authorization_bearer(token)
            .await;

        response.assert_status_ok();
        let body = response.json::<Vec<Value>>();
        let ids: Vec<_> = body.iter().map(|income| income["id"].clone()).collect();
        assert_eq!(ids, vec![json!(newer.id), json!(older.id)]);
        assert!(body.iter().all(|income| income["type"] == json!("income")));
    }

    #[tokio::test]
    async fn list_requires_token() {
        let app = must_create_test_app();

        app.server
            .get(endpoints::EXPENSES)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn gets_expense() {
        let app = must_create_test_app();
        let user = must_create_user(&app.state, "Alice", "alice@example.com");
        let expense = must_create_transaction(
            &app.state,
            user.id,
            Transaction::build(
                TransactionKind::Expense,
                "Lunch",
                12.5,
                "Food",
                date!(2025 - 10 - 05),
            ),
        );
        let token = must_log_in(&app.state, user.id);

        let response = app
            .server
            .get(&format_endpoint(endpoints::EXPENSE, expense.id))
            .authorization_bearer(token)
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["title"], json!("Lunch"));
        assert_eq!(body["amount"], json!(12.5));
        assert_eq!(body["date"], json!("2025-10-05"));
        assert_eq!(body["paymentMethod"], json!("cash"));
        assert_eq!(body["userId"], json!(user.id.as_i64()));
    }

    #[tokio::test]
    async fn expense_is_not_an_income() {
        let app = must_create_test_app();
        let user = must_create_user(&app.state, "Alice", "alice@example.com");
        let expense = must_create_transaction(
            &app.state,
            user.id,
            Transaction::build(
                TransactionKind::Expense,
                "Lunch",
                12.5,
                "Food",
                date!(2025 - 10 - 05),
            ),
        );
        let token = must_log_in(&app.state, user.id);

        let response = app
            .server
            .get(&format_endpoint(endpoints::INCOME, expense.id))
            .authorization_bearer(token)
            .await;

        assert_msg(&response, StatusCode::NOT_FOUND, "Income record not found");
    }

    #[tokio::test]
    async fn other_users_expense_is_not_found() {
        let app = must_create_test_app();
        let alice = must_create_user(&app.state, "Alice", "alice@example.com");
        let bob = must_create_user(&app.state, "Bob", "bob@example.com");
        let expense = must_create_transaction(
            &app.state,
            bob.id,
            Transaction::build(
                TransactionKind::Expense,
                "Lunch",
                12.5,
                "Food",
                date!(2025 - 10 - 05),
            ),
        );
        let token = must_log_in(&app.state, alice.id);

        let response = app
            .server
            .get(&format_endpoint(endpoints::EXPENSE, expense.id))
            .authorization_bearer(token)
            .await;

        assert_msg(&response, StatusCode::NOT_FOUND, "Expense not found");
    }
}

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    db::lock_connection,
    timezone::today_in,
    transaction::{
        core::{Transaction, TransactionKind, create_transaction},
        form::TransactionForm,
    },
    user::UserId,
};

/// The state needed to record a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The server's timezone, used for the default date.
    pub local_timezone: String,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

fn create(
    state: &CreateTransactionState,
    user_id: UserId,
    kind: TransactionKind,
    form: TransactionForm,
) -> Result<Transaction, Error> {
    let today = today_in(None, &state.local_timezone);
    let builder = form.into_builder(kind, today)?;

    let connection = lock_connection(&state.db_connection)?;
    create_transaction(user_id, builder, &connection).map_err(|error| match error {
        Error::NotFound => Error::MissingUser,
        error => error,
    })
}

fn respond(result: Result<Transaction, Error>) -> Response {
    match result {
        Ok(transaction) => {
            tracing::info!(
                "Created {} {} for user {}",
                transaction.kind,
                transaction.id,
                transaction.user_id
            );
            Json(transaction).into_response()
        }
        Err(error) => error.into_response(),
    }
}

/// Record a new income for the authenticated user.
pub async fn create_income(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserId>,
    Json(form): Json<TransactionForm>,
) -> Response {
    respond(create(&state, user_id, TransactionKind::Income, form))
}

/// Record a new expense for the authenticated user.
pub async fn create_expense(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserId>,
    Json(form): Json<TransactionForm>,
) -> Response {
    respond(create(&state, user_id, TransactionKind::Expense, form))
}

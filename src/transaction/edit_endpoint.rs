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
    transaction::{
        core::{Transaction, TransactionKind, update_transaction},
        form::TransactionForm,
        list_endpoint::missing_transaction,
    },
    user::UserId,
};

/// The state needed to edit a transaction.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

fn edit(
    state: &EditTransactionState,
    user_id: UserId,
    kind: TransactionKind,
    transaction_id: DatabaseId,
    form: TransactionForm,
) -> Result<Transaction, Error> {
    let update = form.into_update(kind)?;

    let connection = lock_connection(&state.db_connection)?;
    update_transaction(transaction_id, user_id, kind, &update, &connection)
        .map_err(missing_transaction(kind))
}

fn respond(result: Result<Transaction, Error>) -> Response {
    match result {
        Ok(transaction) => {
            tracing::info!("Updated {} {}", transaction.kind, transaction.id);
            Json(transaction).into_response()
        }
        Err(error) => error.into_response(),
    }
}

/// Change the fields given in the body of an income.
pub async fn edit_income(
    State(state): State<EditTransactionState>,
    Extension(user_id): Extension<UserId>,
    Path(transaction_id): Path<DatabaseId>,
    Json(form): Json<TransactionForm>,
) -> Response {
    respond(edit(
        &state,
        user_id,
        TransactionKind::Income,
        transaction_id,
        form,
    ))
}

/// Change the fields given in the body of an expense.
pub async fn edit_expense(
    State(state): State<EditTransactionState>,
    Extension(user_id): Extension<UserId>,
    Path(transaction_id): Path<DatabaseId>,
    Json(form): Json<TransactionForm>,
) -> Response {
    respond(edit(
        &state,
        user_id,
        TransactionKind::Expense,
        transaction_id,
        form,
    ))
}

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState,
    database_id::DatabaseId,
    db::lock_connection,
    transaction::{
        core::{TransactionKind, delete_transaction},
        list_endpoint::missing_transaction,
    },
    user::UserId,
};

/// The state needed to delete a transaction.
#[derive(Debug, Clone)]
pub struct DeleteTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

fn delete(
    state: &DeleteTransactionState,
    user_id: UserId,
    kind: TransactionKind,
    transaction_id: DatabaseId,
) -> Response {
    let result = lock_connection(&state.db_connection).and_then(|connection| {
        delete_transaction(transaction_id, user_id, kind, &connection)
            .map_err(missing_transaction(kind))
    });

    let msg = match kind {
        TransactionKind::Income => "Income record deleted successfully",
        TransactionKind::Expense => "Expense deleted successfully",
    };

    match result {
        Ok(()) => {
            tracing::info!("Deleted {kind} {transaction_id}");
            Json(json!({ "msg": msg })).into_response()
        }
        Err(error) => error.into_response(),
    }
}

/// Delete an income of the authenticated user.
pub async fn delete_income(
    State(state): State<DeleteTransactionState>,
    Extension(user_id): Extension<UserId>,
    Path(transaction_id): Path<DatabaseId>,
) -> Response {
    delete(&state, user_id, TransactionKind::Income, transaction_id)
}

/// Delete an expense of the authenticated user.
pub async fn delete_expense(
    State(state): State<DeleteTransactionState>,
    Extension(user_id): Extension<UserId>,
    Path(transaction_id): Path<DatabaseId>,
) -> Response {
    delete(&state, user_id, TransactionKind::Expense, transaction_id)
}

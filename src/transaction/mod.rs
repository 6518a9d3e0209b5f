//! Incomes and expenses.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Database functions for storing, querying, and managing transactions
//! - The income and expense endpoints, which share their logic and differ only
//!   in the [TransactionKind] they are scoped to

mod budget_endpoint;
mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod form;
mod list_endpoint;

pub use budget_endpoint::get_remaining_budget;
pub use core::{
    Transaction, TransactionKind, create_transaction_table, get_transactions,
    get_transactions_in_date_range,
};
pub use create_endpoint::{create_expense, create_income};
pub use delete_endpoint::{delete_expense, delete_income};
pub use edit_endpoint::{edit_expense, edit_income};
pub use list_endpoint::{get_expense, get_income, list_expenses, list_incomes};

#[cfg(test)]
pub use core::{TransactionBuilder, create_transaction, get_transaction};

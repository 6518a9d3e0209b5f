//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, ops::RangeInclusive, str::FromStr};

use rusqlite::{
    Connection, Row, params,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{Error, database_id::DatabaseId, user::UserId};

// ============================================================================
// MODELS
// ============================================================================

/// Whether money was earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money earned, e.g. a salary.
    Income,
    /// Money spent, e.g. groceries.
    Expense,
}

impl TransactionKind {
    /// The name used in JSON and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    /// The payment method used when a new transaction does not specify one.
    pub fn default_payment_method(&self) -> PaymentMethod {
        match self {
            TransactionKind::Income => PaymentMethod::Bank,
            TransactionKind::Expense => PaymentMethod::Cash,
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(format!("unknown transaction type \"{other}\"")),
        }
    }
}

impl ToSql for TransactionKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for TransactionKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: String| FromSqlError::Other(error.into()))
    }
}

/// How a transaction was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Cash.
    Cash,
    /// A debit or credit card.
    Card,
    /// A Unified Payments Interface transfer.
    Upi,
    /// Internet banking.
    Netbanking,
    /// A bank transfer or direct deposit.
    Bank,
    /// A cheque.
    Check,
    /// Anything else.
    Other,
}

impl PaymentMethod {
    /// The name used in JSON and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Upi => "upi",
            PaymentMethod::Netbanking => "netbanking",
            PaymentMethod::Bank => "bank",
            PaymentMethod::Check => "check",
            PaymentMethod::Other => "other",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "upi" => Ok(PaymentMethod::Upi),
            "netbanking" => Ok(PaymentMethod::Netbanking),
            "bank" => Ok(PaymentMethod::Bank),
            "check" => Ok(PaymentMethod::Check),
            "other" => Ok(PaymentMethod::Other),
            other => Err(format!("unknown payment method \"{other}\"")),
        }
    }
}

impl ToSql for PaymentMethod {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for PaymentMethod {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: String| FromSqlError::Other(error.into()))
    }
}

/// The frequency used when a new transaction does not specify one.
pub const DEFAULT_FREQUENCY: &str = "one-time";

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: DatabaseId,
    /// The user that recorded the transaction.
    pub user_id: UserId,
    /// A short name for the transaction, e.g. "Rent".
    pub title: String,
    /// The amount of money spent or earned, always positive.
    pub amount: f64,
    /// Whether the money was earned or spent.
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// A free text category, e.g. "Groceries".
    pub category: String,
    /// A longer description of what the transaction was for.
    pub description: String,
    /// When the transaction happened.
    pub date: Date,
    /// How the transaction was paid.
    pub payment_method: PaymentMethod,
    /// Whether the transaction repeats.
    pub recurring: bool,
    /// Where an income came from, e.g. an employer.
    pub source: String,
    /// How often the transaction repeats, e.g. "monthly".
    pub frequency: String,
    /// Whether an income is tax deductible.
    pub tax_deductible: bool,
    /// When the transaction was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the transaction was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        kind: TransactionKind,
        title: &str,
        amount: f64,
        category: &str,
        date: Date,
    ) -> TransactionBuilder {
        TransactionBuilder {
            kind,
            title: title.to_owned(),
            amount,
            category: category.to_owned(),
            date,
            description: String::new(),
            payment_method: kind.default_payment_method(),
            recurring: false,
            source: String::new(),
            frequency: DEFAULT_FREQUENCY.to_owned(),
            tax_deductible: false,
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// The optional fields start with the defaults for `kind`. Pass the builder
/// to [create_transaction] to save it.
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// Whether the money was earned or spent.
    pub kind: TransactionKind,
    /// A short name for the transaction.
    pub title: String,
    /// The amount of money, must be greater than zero.
    pub amount: f64,
    /// A free text category.
    pub category: String,
    /// When the transaction happened.
    pub date: Date,
    /// A longer description, empty by default.
    pub description: String,
    /// Defaults to [PaymentMethod::Bank] for incomes and [PaymentMethod::Cash] for expenses.
    pub payment_method: PaymentMethod,
    /// Defaults to false.
    pub recurring: bool,
    /// Where an income came from, empty by default.
    pub source: String,
    /// Defaults to [DEFAULT_FREQUENCY].
    pub frequency: String,
    /// Defaults to false.
    pub tax_deductible: bool,
}

impl TransactionBuilder {
    /// Set the description.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }

    /// Set the payment method.
    pub fn payment_method(mut self, payment_method: PaymentMethod) -> Self {
        self.payment_method = payment_method;
        self
    }

    /// Set whether the transaction repeats.
    pub fn recurring(mut self, recurring: bool) -> Self {
        self.recurring = recurring;
        self
    }

    /// Set where an income came from.
    pub fn source(mut self, source: &str) -> Self {
        self.source = source.to_owned();
        self
    }

    /// Set how often the transaction repeats.
    pub fn frequency(mut self, frequency: &str) -> Self {
        self.frequency = frequency.to_owned();
        self
    }

    /// Set whether an income is tax deductible.
    pub fn tax_deductible(mut self, tax_deductible: bool) -> Self {
        self.tax_deductible = tax_deductible;
        self
    }
}

/// Changes to a transaction. `None` fields are left unchanged.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TransactionUpdate {
    /// A new title.
    pub title: Option<String>,
    /// A new amount, must be greater than zero.
    pub amount: Option<f64>,
    /// A new category.
    pub category: Option<String>,
    /// A new description.
    pub description: Option<String>,
    /// A new date.
    pub date: Option<Date>,
    /// A new payment method.
    pub payment_method: Option<PaymentMethod>,
    /// Whether the transaction repeats.
    pub recurring: Option<bool>,
    /// A new source.
    pub source: Option<String>,
    /// A new frequency.
    pub frequency: Option<String>,
    /// Whether an income is tax deductible.
    pub tax_deductible: Option<bool>,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const TRANSACTION_COLUMNS: &str = "id, user_id, title, amount, kind, category, description, \
    date, payment_method, recurring, source, frequency, tax_deductible, created_at, updated_at";

/// Create a new transaction for `user_id` in the database from a builder.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `user_id` does not refer to a registered user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    user_id: UserId,
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let now = OffsetDateTime::now_utc();

    connection
        .prepare(&format!(
            "INSERT INTO \"transaction\" (user_id, title, amount, kind, category, description,
                date, payment_method, recurring, source, frequency, tax_deductible,
                created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            params![
                user_id.as_i64(),
                builder.title,
                builder.amount,
                builder.kind,
                builder.category,
                builder.description,
                builder.date,
                builder.payment_method,
                builder.recurring,
                builder.source,
                builder.frequency,
                builder.tax_deductible,
                now,
            ],
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::NotFound,
            error => error.into(),
        })
}

/// Retrieve the transaction `id` of `kind` that belongs to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction of `kind` owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    id: DatabaseId,
    user_id: UserId,
    kind: TransactionKind,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE id = ?1 AND user_id = ?2 AND kind = ?3"
        ))?
        .query_row(params![id, user_id.as_i64(), kind], map_transaction_row)?;

    Ok(transaction)
}

/// Get the transactions of `user_id`, newest first.
///
/// If `kind` is `None`, both incomes and expenses are returned.
/// At most `limit` transactions are returned if `limit` is given.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn get_transactions(
    user_id: UserId,
    kind: Option<TransactionKind>,
    limit: Option<u32>,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE user_id = ?1 AND (?2 IS NULL OR kind = ?2)
             ORDER BY date DESC, id DESC
             LIMIT ?3"
        ))?
        .query_map(
            params![user_id.as_i64(), kind, limit.map_or(-1, i64::from)],
            map_transaction_row,
        )?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Get the transactions of `user_id` dated within `date_range`, both ends included.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn get_transactions_in_date_range(
    user_id: UserId,
    date_range: RangeInclusive<Date>,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3
             ORDER BY date DESC, id DESC"
        ))?
        .query_map(
            params![user_id.as_i64(), date_range.start(), date_range.end()],
            map_transaction_row,
        )?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Sum the amounts of the transactions of `kind` of `user_id` dated within `date_range`.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn sum_transactions_in_date_range(
    user_id: UserId,
    kind: TransactionKind,
    date_range: RangeInclusive<Date>,
    connection: &Connection,
) -> Result<f64, Error> {
    connection
        .query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM \"transaction\"
             WHERE user_id = ?1 AND kind = ?2 AND date BETWEEN ?3 AND ?4",
            params![
                user_id.as_i64(),
                kind,
                date_range.start(),
                date_range.end()
            ],
            |row| row.get(0),
        )
        .map_err(Error::from)
}

/// Apply `update` to the transaction `id` of `kind` that belongs to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction of `kind` owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_transaction(
    id: DatabaseId,
    user_id: UserId,
    kind: TransactionKind,
    update: &TransactionUpdate,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "UPDATE \"transaction\" SET
                title = COALESCE(?1, title),
                amount = COALESCE(?2, amount),
                category = COALESCE(?3, category),
                description = COALESCE(?4, description),
                date = COALESCE(?5, date),
                payment_method = COALESCE(?6, payment_method),
                recurring = COALESCE(?7, recurring),
                source = COALESCE(?8, source),
                frequency = COALESCE(?9, frequency),
                tax_deductible = COALESCE(?10, tax_deductible),
                updated_at = ?11
             WHERE id = ?12 AND user_id = ?13 AND kind = ?14
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            params![
                update.title,
                update.amount,
                update.category,
                update.description,
                update.date,
                update.payment_method,
                update.recurring,
                update.source,
                update.frequency,
                update.tax_deductible,
                OffsetDateTime::now_utc(),
                id,
                user_id.as_i64(),
                kind,
            ],
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Delete the transaction `id` of `kind` that belongs to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction of `kind` owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_transaction(
    id: DatabaseId,
    user_id: UserId,
    kind: TransactionKind,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2 AND kind = ?3",
        params![id, user_id.as_i64(), kind],
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                amount REAL NOT NULL CHECK (amount > 0),
                kind TEXT NOT NULL CHECK (kind IN ('income', 'expense')),
                category TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                date TEXT NOT NULL,
                payment_method TEXT NOT NULL,
                recurring INTEGER NOT NULL DEFAULT 0,
                source TEXT NOT NULL DEFAULT '',
                frequency TEXT NOT NULL DEFAULT 'one-time',
                tax_deductible INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Used by the transaction lists and the monthly summary.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction, the columns must be in the order of [TRANSACTION_COLUMNS].
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: UserId::new(row.get(1)?),
        title: row.get(2)?,
        amount: row.get(3)?,
        kind: row.get(4)?,
        category: row.get(5)?,
        description: row.get(6)?,
        date: row.get(7)?,
        payment_method: row.get(8)?,
        recurring: row.get(9)?,
        source: row.get(10)?,
        frequency: row.get(11)?,
        tax_deductible: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================

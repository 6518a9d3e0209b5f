//! The request body shared by the income and expense endpoints.

use serde::Deserialize;
use time::Date;

use crate::{
    Error, amount, date_format,
    transaction::core::{
        PaymentMethod, Transaction, TransactionBuilder, TransactionKind, TransactionUpdate,
    },
};

/// The JSON body for creating or editing a transaction.
///
/// Every field is optional here so that creating and editing can share the
/// type. Expenses ignore `source`, `frequency` and `taxDeductible`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionForm {
    /// A short name for the transaction.
    pub title: Option<String>,
    /// The amount, as a number or a numeric string.
    #[serde(default, deserialize_with = "amount::deserialize_optional")]
    pub amount: Option<f64>,
    /// A free text category.
    pub category: Option<String>,
    /// A longer description.
    pub description: Option<String>,
    /// When the transaction happened.
    #[serde(default, deserialize_with = "date_format::deserialize_optional")]
    pub date: Option<Date>,
    /// How the transaction was paid.
    pub payment_method: Option<PaymentMethod>,
    /// Whether the transaction repeats.
    pub recurring: Option<bool>,
    /// Where an income came from.
    pub source: Option<String>,
    /// How often an income repeats.
    pub frequency: Option<String>,
    /// Whether an income is tax deductible.
    pub tax_deductible: Option<bool>,
}

const MISSING_FIELDS: &str = "Title, amount, and category are required";

fn non_empty(text: Option<String>) -> Option<String> {
    text.map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}

fn check_amount(amount: f64) -> Result<f64, Error> {
    if amount.is_finite() && amount > 0.0 {
        Ok(amount)
    } else {
        Err(Error::NonPositiveAmount)
    }
}

impl TransactionForm {
    /// Validate the form for a new transaction of `kind`.
    ///
    /// `today` is used when the form has no date.
    ///
    /// # Errors
    /// Returns a:
    /// - [Error::MissingFields] if the title, amount or category is missing,
    /// - or [Error::NonPositiveAmount] if the amount is zero or less.
    pub fn into_builder(
        self,
        kind: TransactionKind,
        today: Date,
    ) -> Result<TransactionBuilder, Error> {
        let (Some(title), Some(amount), Some(category)) = (
            non_empty(self.title),
            self.amount,
            non_empty(self.category),
        ) else {
            return Err(Error::MissingFields(MISSING_FIELDS));
        };

        let amount = check_amount(amount)?;

        let date = self.date.unwrap_or(today);
        let mut builder = Transaction::build(kind, &title, amount, &category, date)
            .description(self.description.as_deref().unwrap_or_default())
            .recurring(self.recurring.unwrap_or(false));

        if let Some(payment_method) = self.payment_method {
            builder = builder.payment_method(payment_method);
        }

        if kind == TransactionKind::Income {
            builder = builder
                .source(self.source.as_deref().unwrap_or_default())
                .tax_deductible(self.tax_deductible.unwrap_or(false));

            if let Some(frequency) = non_empty(self.frequency) {
                builder = builder.frequency(&frequency);
            }
        }

        Ok(builder)
    }

    /// Validate the form as changes to a transaction of `kind`.
    ///
    /// # Errors
    /// Returns a:
    /// - [Error::InvalidField] if the title or category is blank,
    /// - or [Error::NonPositiveAmount] if the amount is zero or less.
    pub fn into_update(self, kind: TransactionKind) -> Result<TransactionUpdate, Error> {
        let title = match self.title {
            Some(title) if title.trim().is_empty() => {
                return Err(Error::InvalidField("Title cannot be empty".to_owned()));
            }
            title => title.map(|title| title.trim().to_owned()),
        };

        let category = match self.category {
            Some(category) if category.trim().is_empty() => {
                return Err(Error::InvalidField("Category cannot be empty".to_owned()));
            }
            category => category.map(|category| category.trim().to_owned()),
        };

        let amount = self.amount.map(check_amount).transpose()?;

        let mut update = TransactionUpdate {
            title,
            amount,
            category,
            description: self.description,
            date: self.date,
            payment_method: self.payment_method,
            recurring: self.recurring,
            ..Default::default()
        };

        if kind == TransactionKind::Income {
            update.source = self.source;
            update.frequency = self.frequency;
            update.tax_deductible = self.tax_deductible;
        }

        Ok(update)
    }
}

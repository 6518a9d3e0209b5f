//! Monthly totals for the dashboard summary.
//!
//! Provides a single pass over a month of transactions that sums incomes and
//! expenses and groups expenses by category, and the budget figures derived
//! from those totals.

use std::collections::HashMap;

use serde::Serialize;

use crate::transaction::{Transaction, TransactionKind};

/// The total spent in one expense category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    /// The expense category.
    pub category: String,
    /// The sum of the expenses in the category.
    pub amount: f64,
}

/// The sums of a set of transactions.
#[derive(Debug, Default, Clone, PartialEq)]
pub(super) struct Totals {
    pub income: f64,
    pub expenses: f64,
    /// Expense totals by category, largest first.
    pub category_breakdown: Vec<CategoryTotal>,
}

/// Sum incomes and expenses and group the expenses by category.
///
/// Categories with equal totals are ordered by name so the output is stable.
pub(super) fn aggregate(transactions: &[Transaction]) -> Totals {
    let mut income = 0.0;
    let mut expenses = 0.0;
    let mut by_category: HashMap<&str, f64> = HashMap::new();

    for transaction in transactions {
        match transaction.kind {
            TransactionKind::Income => income += transaction.amount,
            TransactionKind::Expense => {
                expenses += transaction.amount;
                *by_category
                    .entry(transaction.category.as_str())
                    .or_insert(0.0) += transaction.amount;
            }
        }
    }

    let mut category_breakdown: Vec<_> = by_category
        .into_iter()
        .map(|(category, amount)| CategoryTotal {
            category: category.to_owned(),
            amount,
        })
        .collect();
    category_breakdown.sort_by(|a, b| {
        b.amount
            .total_cmp(&a.amount)
            .then_with(|| a.category.cmp(&b.category))
    });

    Totals {
        income,
        expenses,
        category_breakdown,
    }
}

/// Budget figures for a month.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct BudgetFigures {
    /// Budget plus income minus expenses.
    pub remaining_credits: f64,
    /// Income minus expenses.
    pub net_income: f64,
    /// Expenses as a percentage of budget plus income.
    pub expense_percentage: f64,
    /// Income as a percentage of budget plus income.
    pub income_percentage: f64,
}

impl BudgetFigures {
    pub fn new(monthly_budget: f64, totals: &Totals) -> Self {
        let total_available = monthly_budget + totals.income;
        let percentage_of_available = |amount: f64| {
            if total_available > 0.0 {
                amount / total_available * 100.0
            } else {
                0.0
            }
        };

        Self {
            remaining_credits: total_available - totals.expenses,
            net_income: totals.income - totals.expenses,
            expense_percentage: percentage_of_available(totals.expenses),
            income_percentage: percentage_of_available(totals.income),
        }
    }
}

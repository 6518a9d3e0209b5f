//! Dashboard module
//!
//! Summarises the current month: how much was earned and spent, where the
//! money went, and how much of the budget is left.

mod aggregation;
mod handlers;
mod month;

pub use handlers::{get_dashboard_summary, get_dashboard_transactions};
pub use month::month_containing;

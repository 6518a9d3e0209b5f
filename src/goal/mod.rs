//! Savings goals and their progress.

mod core;
mod create_endpoint;
mod edit_endpoint;
mod form;
mod list_endpoint;

pub use core::{Goal, GoalStatus, create_goal_table, get_goals};
pub use create_endpoint::create_goal_endpoint;
pub use edit_endpoint::{delete_goal_endpoint, edit_goal_endpoint};
pub use list_endpoint::{get_goal_endpoint, list_goals};

#[cfg(test)]
pub use core::{DEFAULT_CATEGORY, NewGoal, Priority, create_goal};

//! The savings goal model and its database functions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, params,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{Error, database_id::DatabaseId, user::UserId};

/// How important a goal is to the user.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Nice to have.
    Low,
    /// The default.
    #[default]
    Medium,
    /// Most important.
    High,
}

impl Priority {
    /// The lowercase name stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!("unknown priority \"{other}\"")),
        }
    }
}

/// Whether a goal has been reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    /// Less than the target has been saved.
    Active,
    /// The target has been saved.
    Completed,
}

impl GoalStatus {
    /// The status for a goal that is `progress` percent complete.
    pub fn from_progress(progress: f64) -> Self {
        if progress >= 100.0 {
            GoalStatus::Completed
        } else {
            GoalStatus::Active
        }
    }

    /// The lowercase name stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::Active => "active",
            GoalStatus::Completed => "completed",
        }
    }
}

impl Display for GoalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GoalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(GoalStatus::Active),
            "completed" => Ok(GoalStatus::Completed),
            other => Err(format!("unknown goal status \"{other}\"")),
        }
    }
}

macro_rules! text_column {
    ($type:ty) => {
        impl ToSql for $type {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $type {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|error: String| FromSqlError::Other(error.into()))
            }
        }
    };
}

text_column!(Priority);
text_column!(GoalStatus);

/// How far `current_amount` is towards `target_amount` as a percentage.
///
/// A goal with no target has no progress.
pub fn progress_of(current_amount: f64, target_amount: f64) -> f64 {
    if target_amount > 0.0 {
        current_amount / target_amount * 100.0
    } else {
        0.0
    }
}

/// An amount of money the user is saving towards by a deadline.
///
/// `progress` and `status` are derived from the amounts every time a goal is
/// saved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    /// The ID of the goal.
    pub id: DatabaseId,
    /// The user saving towards the goal.
    pub user_id: UserId,
    /// What the user is saving for.
    pub title: String,
    /// How much the user wants to save.
    pub target_amount: f64,
    /// How much the user has saved so far.
    pub current_amount: f64,
    /// A free text category, e.g. "Savings".
    pub category: String,
    /// When the user wants to reach the target.
    pub deadline: Date,
    /// How important the goal is.
    pub priority: Priority,
    /// The percentage of the target saved so far.
    pub progress: f64,
    /// Whether the target has been reached.
    pub status: GoalStatus,
    /// When the goal was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the goal was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The category of goals created without one.
pub const DEFAULT_CATEGORY: &str = "Savings";

/// The data for a goal that has not been saved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGoal {
    /// What the user is saving for.
    pub title: String,
    /// How much the user wants to save.
    pub target_amount: f64,
    /// How much the user has already saved.
    pub current_amount: f64,
    /// A free text category.
    pub category: String,
    /// When the user wants to reach the target.
    pub deadline: Date,
    /// How important the goal is.
    pub priority: Priority,
}

/// Changes to a goal. `None` fields are left unchanged.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct GoalUpdate {
    /// A new title.
    pub title: Option<String>,
    /// A new target amount.
    pub target_amount: Option<f64>,
    /// A new saved amount.
    pub current_amount: Option<f64>,
    /// A new category.
    pub category: Option<String>,
    /// A new deadline.
    pub deadline: Option<Date>,
    /// A new priority.
    pub priority: Option<Priority>,
}

const GOAL_COLUMNS: &str = "id, user_id, title, target_amount, current_amount, category, \
    deadline, priority, progress, status, created_at, updated_at";

/// Save a new goal for `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `user_id` does not refer to a registered user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_goal(
    user_id: UserId,
    goal: NewGoal,
    connection: &Connection,
) -> Result<Goal, Error> {
    let now = OffsetDateTime::now_utc();
    let progress = progress_of(goal.current_amount, goal.target_amount);

    connection
        .prepare(&format!(
            "INSERT INTO goal (user_id, title, target_amount, current_amount, category,
                deadline, priority, progress, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
             RETURNING {GOAL_COLUMNS}"
        ))?
        .query_row(
            params![
                user_id.as_i64(),
                goal.title,
                goal.target_amount,
                goal.current_amount,
                goal.category,
                goal.deadline,
                goal.priority,
                progress,
                GoalStatus::from_progress(progress),
                now,
            ],
            map_goal_row,
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

/// Retrieve the goal `id` that belongs to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a goal owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_goal(id: DatabaseId, user_id: UserId, connection: &Connection) -> Result<Goal, Error> {
    let goal = connection
        .prepare(&format!(
            "SELECT {GOAL_COLUMNS} FROM goal WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_row(params![id, user_id.as_i64()], map_goal_row)?;

    Ok(goal)
}

/// Get the goals of `user_id`, most recently created first.
///
/// Only goals with `status` are returned if it is given.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn get_goals(
    user_id: UserId,
    status: Option<GoalStatus>,
    connection: &Connection,
) -> Result<Vec<Goal>, Error> {
    connection
        .prepare(&format!(
            "SELECT {GOAL_COLUMNS} FROM goal
             WHERE user_id = ?1 AND (?2 IS NULL OR status = ?2)
             ORDER BY created_at DESC, id DESC"
        ))?
        .query_map(params![user_id.as_i64(), status], map_goal_row)?
        .map(|maybe_goal| maybe_goal.map_err(Error::from))
        .collect()
}

/// Apply `update` to the goal `id` of `user_id` and recompute its progress.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a goal owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_goal(
    id: DatabaseId,
    user_id: UserId,
    update: &GoalUpdate,
    connection: &Connection,
) -> Result<Goal, Error> {
    let goal = get_goal(id, user_id, connection)?;

    let target_amount = update.target_amount.unwrap_or(goal.target_amount);
    let current_amount = update.current_amount.unwrap_or(goal.current_amount);
    let progress = progress_of(current_amount, target_amount);

    let goal = connection
        .prepare(&format!(
            "UPDATE goal SET
                title = COALESCE(?1, title),
                target_amount = ?2,
                current_amount = ?3,
                category = COALESCE(?4, category),
                deadline = COALESCE(?5, deadline),
                priority = COALESCE(?6, priority),
                progress = ?7,
                status = ?8,
                updated_at = ?9
             WHERE id = ?10 AND user_id = ?11
             RETURNING {GOAL_COLUMNS}"
        ))?
        .query_row(
            params![
                update.title,
                target_amount,
                current_amount,
                update.category,
                update.deadline,
                update.priority,
                progress,
                GoalStatus::from_progress(progress),
                OffsetDateTime::now_utc(),
                id,
                user_id.as_i64(),
            ],
            map_goal_row,
        )?;

    Ok(goal)
}

/// Delete the goal `id` of `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a goal owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_goal(id: DatabaseId, user_id: UserId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM goal WHERE id = ?1 AND user_id = ?2",
        params![id, user_id.as_i64()],
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

/// Create the goal table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_goal_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS goal (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                target_amount REAL NOT NULL CHECK (target_amount >= 0),
                current_amount REAL NOT NULL DEFAULT 0 CHECK (current_amount >= 0),
                category TEXT NOT NULL DEFAULT 'Savings',
                deadline TEXT NOT NULL,
                priority TEXT NOT NULL DEFAULT 'medium',
                progress REAL NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'active',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_goal_user_created ON goal(user_id, created_at)",
        (),
    )?;

    Ok(())
}

/// Map a database row to a [Goal].
///
/// # Errors
/// Returns an error if a column is missing or has an unexpected type.
pub fn map_goal_row(row: &Row) -> Result<Goal, rusqlite::Error> {
    Ok(Goal {
        id: row.get(0)?,
        user_id: UserId::new(row.get(1)?),
        title: row.get(2)?,
        target_amount: row.get(3)?,
        current_amount: row.get(4)?,
        category: row.get(5)?,
        deadline: row.get(6)?,
        priority: row.get(7)?,
        progress: row.get(8)?,
        status: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

use serde::Deserialize;
use time::Date;

use crate::{
    Error, amount, date_format,
    goal::core::{DEFAULT_CATEGORY, GoalUpdate, NewGoal, Priority},
};

/// The JSON body for creating or editing a goal.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalForm {
    title: Option<String>,
    #[serde(default, deserialize_with = "amount::deserialize_optional")]
    target_amount: Option<f64>,
    #[serde(default, deserialize_with = "amount::deserialize_optional")]
    current_amount: Option<f64>,
    category: Option<String>,
    #[serde(default, deserialize_with = "date_format::deserialize_optional")]
    deadline: Option<Date>,
    priority: Option<Priority>,
}

fn check_target(target_amount: f64) -> Result<f64, Error> {
    if target_amount.is_finite() && target_amount > 0.0 {
        Ok(target_amount)
    } else {
        Err(Error::InvalidField(
            "Target amount must be greater than 0".to_owned(),
        ))
    }
}

fn check_current(current_amount: f64) -> Result<f64, Error> {
    if current_amount.is_finite() && current_amount >= 0.0 {
        Ok(current_amount)
    } else {
        Err(Error::InvalidField(
            "Current amount cannot be negative".to_owned(),
        ))
    }
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}

impl GoalForm {
    /// Validate the form for a new goal.
    ///
    /// # Errors
    /// Returns a:
    /// - [Error::MissingFields] if the title, target amount or deadline is missing,
    /// - or [Error::InvalidField] if an amount is out of range.
    pub fn into_new_goal(self) -> Result<NewGoal, Error> {
        let (Some(title), Some(target_amount), Some(deadline)) =
            (non_empty(self.title), self.target_amount, self.deadline)
        else {
            return Err(Error::MissingFields(
                "Title, targetAmount, and deadline are required",
            ));
        };

        Ok(NewGoal {
            title,
            target_amount: check_target(target_amount)?,
            current_amount: check_current(self.current_amount.unwrap_or(0.0))?,
            category: non_empty(self.category).unwrap_or_else(|| DEFAULT_CATEGORY.to_owned()),
            deadline,
            priority: self.priority.unwrap_or_default(),
        })
    }

    /// Validate the form as changes to a goal.
    ///
    /// Blank text fields are ignored.
    ///
    /// # Errors
    /// Returns an [Error::InvalidField] if an amount is out of range.
    pub fn into_update(self) -> Result<GoalUpdate, Error> {
        Ok(GoalUpdate {
            title: non_empty(self.title),
            target_amount: self.target_amount.map(check_target).transpose()?,
            current_amount: self.current_amount.map(check_current).transpose()?,
            category: non_empty(self.category),
            deadline: self.deadline,
            priority: self.priority,
        })
    }
}

//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/goals/{goal_id}', use [format_endpoint].

/// The root route which reports that the API is running.
pub const ROOT: &str = "/";

/// The route for registering a new user.
pub const SIGN_UP: &str = "/api/auth/signup";
/// The route for logging in and receiving a bearer token.
pub const LOG_IN: &str = "/api/auth/login";
/// The route for requesting a password reset OTP by email.
pub const FORGOT_PASSWORD: &str = "/api/auth/forgot-password";
/// The route for setting a new password with an OTP.
pub const RESET_PASSWORD: &str = "/api/auth/reset-password";
/// The route for sending a test email.
pub const TEST_EMAIL: &str = "/api/auth/test-email";
/// A route that only reports who the caller is, for checking tokens.
pub const PROTECTED: &str = "/api/protected";

/// The route to access a user's profile.
pub const USER: &str = "/api/users/{user_id}";
/// The route to change a user's password.
pub const USER_PASSWORD: &str = "/api/users/update-password/{user_id}";

/// The route to access incomes.
pub const INCOMES: &str = "/api/incomes";
/// The route to access a single income.
pub const INCOME: &str = "/api/incomes/{transaction_id}";
/// The route to access expenses.
pub const EXPENSES: &str = "/api/expenses";
/// The route to access a single expense.
pub const EXPENSE: &str = "/api/expenses/{transaction_id}";
/// The route for the remaining budget of the current month.
pub const REMAINING_BUDGET: &str = "/api/expenses/budget/remaining";

/// The route to access savings goals.
pub const GOALS: &str = "/api/goals";
/// The route to access a single savings goal.
pub const GOAL: &str = "/api/goals/{goal_id}";

/// The route for the monthly summary.
pub const DASHBOARD_SUMMARY: &str = "/api/dashboard/summary";
/// The route for all transactions of both kinds.
pub const DASHBOARD_TRANSACTIONS: &str = "/api/dashboard/transactions";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/api/goals/{goal_id}', '{goal_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
#[cfg(test)]
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|end| param_start + end + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

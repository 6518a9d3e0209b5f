use std::str::FromStr;

use email_address::EmailAddress;
use time::{OffsetDateTime, macros::date};

use crate::{
    AppState, PasswordHash,
    auth::encode_jwt,
    goal::{DEFAULT_CATEGORY, Goal, NewGoal, Priority, create_goal},
    transaction::{Transaction, TransactionBuilder, create_transaction},
    user::{NewUser, ProfileUpdate, User, UserId, create_user, update_user_profile},
};

/// The password of every user made with [must_create_user].
pub(crate) const TEST_PASSWORD: &str = "averysafeandsecurepassword";

pub(crate) fn must_create_user(state: &AppState, name: &str, email: &str) -> User {
    let password_hash =
        PasswordHash::from_raw_password(TEST_PASSWORD, &[], 4).expect("Could not hash password.");
    let connection = state.db_connection.lock().unwrap();

    create_user(
        NewUser {
            name: name.to_owned(),
            email: EmailAddress::from_str(email).expect("Invalid test email."),
            password_hash,
            phone: None,
            join_date: OffsetDateTime::now_utc(),
        },
        &connection,
    )
    .expect("Could not create user.")
}

/// Get a bearer token for `user_id`.
pub(crate) fn must_log_in(state: &AppState, user_id: UserId) -> String {
    encode_jwt(user_id, &state.jwt_keys, state.token_duration).expect("Could not create token.")
}

pub(crate) fn must_set_monthly_budget(state: &AppState, user_id: UserId, monthly_budget: f64) {
    let connection = state.db_connection.lock().unwrap();

    update_user_profile(
        user_id,
        &ProfileUpdate {
            monthly_budget: Some(monthly_budget),
            ..Default::default()
        },
        &connection,
    )
    .expect("Could not set monthly budget.");
}

pub(crate) fn must_set_timezone(state: &AppState, user_id: UserId, timezone: &str) {
    let connection = state.db_connection.lock().unwrap();

    update_user_profile(
        user_id,
        &ProfileUpdate {
            timezone: Some(timezone.to_owned()),
            ..Default::default()
        },
        &connection,
    )
    .expect("Could not set timezone.");
}

pub(crate) fn must_create_transaction(
    state: &AppState,
    user_id: UserId,
    builder: TransactionBuilder,
) -> Transaction {
    let connection = state.db_connection.lock().unwrap();

    create_transaction(user_id, builder, &connection).expect("Could not create transaction.")
}

/// Create a goal due on 2026-12-01.
pub(crate) fn must_create_goal(
    state: &AppState,
    user_id: UserId,
    title: &str,
    target_amount: f64,
    current_amount: f64,
) -> Goal {
    let connection = state.db_connection.lock().unwrap();

    create_goal(
        user_id,
        NewGoal {
            title: title.to_owned(),
            target_amount,
            current_amount,
            category: DEFAULT_CATEGORY.to_owned(),
            deadline: date!(2026 - 12 - 01),
            priority: Priority::Medium,
        },
        &connection,
    )
    .expect("Could not create goal.")
}

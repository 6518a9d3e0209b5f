#![allow(missing_docs)]

pub(crate) mod app;
pub(crate) mod fixtures;
pub(crate) mod http;

pub(crate) use app::{
    TestApp, must_create_test_app, must_create_test_app_in, must_create_test_server,
    must_create_test_state,
};
pub(crate) use fixtures::{
    TEST_PASSWORD, must_create_goal, must_create_transaction, must_create_user, must_log_in,
    must_set_monthly_budget, must_set_timezone,
};
pub(crate) use http::assert_msg;

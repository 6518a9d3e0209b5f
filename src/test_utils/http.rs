use axum::http::StatusCode;
use axum_test::TestResponse;
use serde_json::{Value, json};

/// Assert that `response` has `status` and a `{"msg": ...}` body.
#[track_caller]
pub(crate) fn assert_msg(response: &TestResponse, status: StatusCode, msg: &str) {
    response.assert_status(status);
    assert_eq!(response.json::<Value>(), json!({ "msg": msg }));
}

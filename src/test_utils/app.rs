use std::sync::Arc;

use axum_test::TestServer;
use rusqlite::Connection;

use crate::{
    AppState, build_router,
    mail::{Mailer, RecordingMailer},
};

/// A server backed by an in-memory database that records the emails it sends.
pub(crate) struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub mailer: RecordingMailer,
}

pub(crate) fn must_create_test_state(mailer: Arc<dyn Mailer>) -> AppState {
    let connection = Connection::open_in_memory().expect("Could not open database in memory.");

    AppState::new(
        connection,
        "test-secret",
        "Etc/UTC",
        mailer,
        "http://localhost:5173",
    )
    .expect("Could not create app state.")
    .with_password_cost(4)
}

pub(crate) fn must_create_test_server(state: AppState) -> TestServer {
    TestServer::try_new(build_router(state)).expect("Could not create test server.")
}

pub(crate) fn must_create_test_app() -> TestApp {
    must_create_test_app_in("Etc/UTC")
}

/// Create a test app whose server runs in `local_timezone`.
pub(crate) fn must_create_test_app_in(local_timezone: &str) -> TestApp {
    let mailer = RecordingMailer::default();
    let mut state = must_create_test_state(Arc::new(mailer.clone()));
    state.local_timezone = local_timezone.to_owned();
    let server = must_create_test_server(state.clone());

    TestApp {
        server,
        state,
        mailer,
    }
}

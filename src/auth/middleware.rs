//! Authentication middleware that validates bearer tokens.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use jsonwebtoken::DecodingKey;

use crate::{AppState, Error, auth::token::decode_jwt};

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The key used to verify bearer tokens.
    pub decoding_key: DecodingKey,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            decoding_key: state.jwt_keys.decoding_key().clone(),
        }
    }
}

/// Middleware function that checks for a valid bearer token in the
/// `Authorization` header.
///
/// If the token is valid, the user ID is placed into the request extensions
/// and the request is executed normally, otherwise a 401 response is returned.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserId>` to receive the user ID.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    let bearer =
        match TypedHeader::<Authorization<Bearer>>::from_request_parts(&mut parts, &state).await {
            Ok(TypedHeader(Authorization(bearer))) => bearer,
            Err(error) => {
                tracing::debug!("Missing or malformed authorization header: {error}");
                return Error::Unauthorized.into_response();
            }
        };

    let user_id = match decode_jwt(bearer.token(), &state.decoding_key)
        .and_then(|claims| claims.user_id())
    {
        Ok(user_id) => user_id,
        Err(error) => return error.into_response(),
    };

    parts.extensions.insert(user_id);
    let request = Request::from_parts(parts, body);

    next.run(request).await
}

#[cfg(test)]
mod auth_guard_tests {
    use axum::{Extension, Json, Router, http::StatusCode, middleware, routing::get};
    use axum_test::TestServer;
    use serde_json::{Value, json};
    use time::Duration;

    use crate::{
        auth::{
            middleware::{AuthState, auth_guard},
            token::{DEFAULT_TOKEN_DURATION, JwtKeys, encode_jwt},
        },
        user::UserId,
    };

    async fn whoami(Extension(user_id): Extension<UserId>) -> Json<Value> {
        Json(json!({ "id": user_id }))
    }

    const TEST_PROTECTED_ROUTE: &str = "/protected";

    fn get_test_server(keys: &JwtKeys) -> TestServer {
        let state = AuthState {
            decoding_key: keys.decoding_key().clone(),
        };

        let app = Router::new()
            .route(TEST_PROTECTED_ROUTE, get(whoami))
            .route_layer(middleware::from_fn_with_state(state, auth_guard));

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn get_protected_route_with_valid_token() {
        let keys = JwtKeys::from_secret("nafstenoas");
        let server = get_test_server(&keys);
        let token = encode_jwt(UserId::new(7), &keys, DEFAULT_TOKEN_DURATION).unwrap();

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .authorization_bearer(token)
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>(), json!({ "id": 7 }));
    }

    #[tokio::test]
    async fn get_protected_route_with_missing_header() {
        let server = get_test_server(&JwtKeys::from_secret("nafstenoas"));

        server
            .get(TEST_PROTECTED_ROUTE)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn get_protected_route_with_empty_token() {
        let server = get_test_server(&JwtKeys::from_secret("nafstenoas"));

        server
            .get(TEST_PROTECTED_ROUTE)
            .authorization_bearer("")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn get_protected_route_with_expired_token() {
        let keys = JwtKeys::from_secret("nafstenoas");
        let server = get_test_server(&keys);
        let token = encode_jwt(UserId::new(7), &keys, Duration::hours(-2)).unwrap();

        server
            .get(TEST_PROTECTED_ROUTE)
            .authorization_bearer(token)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn get_protected_route_with_token_from_other_secret() {
        let server = get_test_server(&JwtKeys::from_secret("nafstenoas"));
        let token = encode_jwt(
            UserId::new(7),
            &JwtKeys::from_secret("someoneelse"),
            DEFAULT_TOKEN_DURATION,
        )
        .unwrap();

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .authorization_bearer(token)
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.json::<Value>(), json!({ "msg": "Unauthorized" }));
    }
}

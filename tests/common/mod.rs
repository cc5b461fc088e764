//! Common test utilities and fixtures for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::Router;
use chrono::Duration;
use http_body_util::BodyExt;
use serde_json::json;
use tower::ServiceExt;

use admin_auth::auth::{CredentialHasher, JwtConfig, TokenService};
use admin_auth::infra::InMemoryPrincipalStore;
use admin_auth::server::{build_app, AppState};

/// Signing key used by every test app
pub const TEST_SECRET: &[u8] = b"integration-test-signing-key-0123456789";

/// Fully wired application over an in-memory store
pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryPrincipalStore>,
    pub tokens: Arc<TokenService>,
}

/// Hasher with a low work factor so tests stay fast
pub fn fast_hasher() -> CredentialHasher {
    CredentialHasher::with_cost(1024, 1).unwrap()
}

pub fn token_service(lifetime: Duration) -> TokenService {
    TokenService::new(&JwtConfig::new(TEST_SECRET, lifetime)).unwrap()
}

pub fn test_app() -> TestApp {
    test_app_with_lifetime(Duration::hours(1))
}

pub fn test_app_with_lifetime(lifetime: Duration) -> TestApp {
    let store = Arc::new(InMemoryPrincipalStore::new());
    let state = AppState::new(store.clone(), fast_hasher(), token_service(lifetime));
    let tokens = state.tokens.clone();

    TestApp {
        router: build_app(state),
        store,
        tokens,
    }
}

/// Send a request and return status, headers and JSON body.
pub async fn send_request(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
    bearer: Option<&str>,
) -> (StatusCode, HeaderMap, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);

    if body.is_some() {
        builder = builder.header("content-type", "application/json");
    }

    if let Some(token) = bearer {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    let body = match body {
        Some(b) => Body::from(serde_json::to_vec(&b).unwrap()),
        None => Body::empty(),
    };

    send_raw(app, builder.body(body).unwrap()).await
}

/// Send a pre-built request.
pub async fn send_raw(
    app: &Router,
    request: Request<Body>,
) -> (StatusCode, HeaderMap, serde_json::Value) {
    let response = app
        .clone()
        .into_service::<Body>()
        .oneshot(request)
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec();

    let json = if bytes.is_empty() {
        json!({})
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| json!({ "raw": String::from_utf8_lossy(&bytes) }))
    };

    (status, headers, json)
}

/// Register an administrator through the API.
pub async fn register(app: &Router, identity_key: &str, display_name: &str, secret: &str) -> (StatusCode, serde_json::Value) {
    let (status, _, body) = send_request(
        app,
        Method::POST,
        "/auth/register",
        Some(json!({
            "identityKey": identity_key,
            "displayName": display_name,
            "secret": secret,
        })),
        None,
    )
    .await;
    (status, body)
}

/// Log in through the API.
pub async fn login(app: &Router, identity_key: &str, secret: &str) -> (StatusCode, serde_json::Value) {
    let (status, _, body) = send_request(
        app,
        Method::POST,
        "/auth/login",
        Some(json!({
            "identityKey": identity_key,
            "secret": secret,
        })),
        None,
    )
    .await;
    (status, body)
}

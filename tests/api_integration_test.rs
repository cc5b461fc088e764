//! REST API integration tests for admin-auth.
//!
//! These drive the full router (request gate, handlers, error mapping) over
//! the in-memory principal store.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use chrono::Duration;

use admin_auth::infra::PrincipalStore;

use common::*;

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_register_returns_principal_view() {
    let app = test_app();

    let (status, body) = register(&app.router, "a@x.com", "Ana", "s3cret").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["identityKey"], "a@x.com");
    assert_eq!(body["displayName"], "Ana");
    assert!(body["id"].is_string());
    assert!(body.get("secret").is_none());
    assert!(body.get("secretHash").is_none());
}

#[tokio::test]
async fn test_register_duplicate_is_bad_request() {
    let app = test_app();

    let (status, _) = register(&app.router, "a@x.com", "Ana", "s3cret").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = register(&app.router, "a@x.com", "Imposter", "other").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "DUPLICATE_IDENTITY");
    assert_eq!(app.store.len().await, 1);
}

#[tokio::test]
async fn test_register_invalid_email_is_rejected() {
    let app = test_app();

    let (status, body) = register(&app.router, "not-an-email", "Ana", "s3cret").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_FIELD_VALUE");
    assert_eq!(body["error"]["details"]["field"], "identityKey");
    assert!(app.store.is_empty().await);
}

#[tokio::test]
async fn test_register_malformed_body_is_rejected() {
    let app = test_app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/auth/register")
        .header("content-type", "application/json")
        .body(Body::from("{\"identityKey\": "))
        .unwrap();

    let (status, headers, body) = send_raw(&app.router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(headers["x-error-code"], "INVALID_REQUEST_BODY");
    assert_eq!(body["error"]["code"], "INVALID_REQUEST_BODY");
}

#[tokio::test]
async fn test_stored_hash_is_not_the_secret() {
    let app = test_app();
    register(&app.router, "a@x.com", "Ana", "s3cret").await;

    let stored = app
        .store
        .find_by_identity_key("a@x.com")
        .await
        .unwrap()
        .unwrap();

    assert_ne!(stored.secret_hash, "s3cret");
    assert!(!stored.secret_hash.contains("s3cret"));
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_response_shape() {
    let app = test_app();
    let (_, registered) = register(&app.router, "a@x.com", "Ana", "s3cret").await;

    let (status, body) = login(&app.router, "a@x.com", "s3cret").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token"].as_str().unwrap().split('.').count(), 3);
    assert_eq!(body["principal"]["id"], registered["id"]);
    assert_eq!(body["principal"]["identityKey"], "a@x.com");
    assert_eq!(body["principal"]["displayName"], "Ana");
    assert_eq!(body["expiresInMs"], 3_600_000);
}

#[tokio::test]
async fn test_login_token_validates_to_subject() {
    let app = test_app();
    register(&app.router, "a@x.com", "Ana", "s3cret").await;

    let (_, body) = login(&app.router, "a@x.com", "s3cret").await;
    let token = body["token"].as_str().unwrap();

    assert_eq!(app.tokens.validate(token).unwrap(), "a@x.com");
}

#[tokio::test]
async fn test_wrong_secret_and_unknown_key_look_identical() {
    let app = test_app();
    register(&app.router, "a@x.com", "Ana", "s3cret").await;

    let (wrong_status, wrong_body) = login(&app.router, "a@x.com", "wrong").await;
    let (unknown_status, unknown_body) = login(&app.router, "b@x.com", "s3cret").await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
    assert!(wrong_body.get("token").is_none());
}

// ============================================================================
// End-to-end scenarios
// ============================================================================

/// Register, log in, call a protected endpoint with the token.
#[tokio::test]
async fn test_scenario_register_login_access() {
    let app = test_app();

    let (status, _) = register(&app.router, "a@x.com", "Ana", "s3cret").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = login(&app.router, "a@x.com", "s3cret").await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, _, me) =
        send_request(&app.router, Method::GET, "/admin/me", None, Some(&token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["identityKey"], "a@x.com");
    assert_eq!(me["displayName"], "Ana");
}

/// Login with a wrong secret yields invalid credentials and no token.
#[tokio::test]
async fn test_scenario_wrong_secret() {
    let app = test_app();
    register(&app.router, "a@x.com", "Ana", "s3cret").await;

    let (status, body) = login(&app.router, "a@x.com", "wrong").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");
    assert!(body.get("token").is_none());
}

/// A zero-lifetime token is rejected once any time has passed.
#[tokio::test]
async fn test_scenario_zero_lifetime_token_expires() {
    let app = test_app_with_lifetime(Duration::zero());
    register(&app.router, "a@x.com", "Ana", "s3cret").await;

    let (status, body) = login(&app.router, "a@x.com", "s3cret").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["expiresInMs"], 0);
    let token = body["token"].as_str().unwrap().to_string();

    tokio::time::sleep(std::time::Duration::from_millis(1)).await;

    assert_eq!(
        app.tokens.validate(&token),
        Err(admin_auth::TokenError::Expired)
    );

    let (status, headers, _) =
        send_request(&app.router, Method::GET, "/admin/me", None, Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(headers["x-error-code"], "INVALID_TOKEN");
}

/// No Authorization header: the gate lets the request through and the
/// handler rejects it.
#[tokio::test]
async fn test_scenario_missing_header_is_unauthorized() {
    let app = test_app();

    let (status, headers, body) =
        send_request(&app.router, Method::GET, "/admin/me", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(headers["x-error-code"], "AUTH_REQUIRED");
    assert_eq!(body["error"]["code"], "AUTH_REQUIRED");
}

// ============================================================================
// Gate behaviour
// ============================================================================

#[tokio::test]
async fn test_tampered_token_is_unauthorized() {
    let app = test_app();
    register(&app.router, "a@x.com", "Ana", "s3cret").await;
    let (_, body) = login(&app.router, "a@x.com", "s3cret").await;
    let token = body["token"].as_str().unwrap();

    let (header, rest) = token.split_once('.').unwrap();
    let (_, signature) = rest.split_once('.').unwrap();
    let forged_payload = "eyJzdWIiOiJldmVAeC5jb20iLCJpYXQiOjAsImV4cCI6OTk5OTk5OTk5OX0";
    let forged = format!("{header}.{forged_payload}.{signature}");

    let (status, _, body) =
        send_request(&app.router, Method::GET, "/admin/me", None, Some(&forged)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_invalid_token_messages_are_uniform() {
    let app = test_app_with_lifetime(Duration::zero());
    register(&app.router, "a@x.com", "Ana", "s3cret").await;
    let (_, body) = login(&app.router, "a@x.com", "s3cret").await;
    let expired = body["token"].as_str().unwrap().to_string();
    tokio::time::sleep(std::time::Duration::from_millis(1)).await;

    let (_, _, expired_body) =
        send_request(&app.router, Method::GET, "/admin/me", None, Some(&expired)).await;
    let (_, _, malformed_body) =
        send_request(&app.router, Method::GET, "/admin/me", None, Some("garbage")).await;

    assert_eq!(expired_body, malformed_body);
}

#[tokio::test]
async fn test_deleted_principal_token_is_unauthenticated() {
    let app = test_app();
    register(&app.router, "a@x.com", "Ana", "s3cret").await;
    let (_, body) = login(&app.router, "a@x.com", "s3cret").await;
    let token = body["token"].as_str().unwrap().to_string();

    app.store.remove("a@x.com").await;

    let (status, _, body) =
        send_request(&app.router, Method::GET, "/admin/me", None, Some(&token)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "AUTH_REQUIRED");
}

#[tokio::test]
async fn test_non_bearer_scheme_is_unauthenticated() {
    let app = test_app();

    let request = Request::builder()
        .method(Method::GET)
        .uri("/admin/me")
        .header("authorization", "Basic YTpi")
        .body(Body::empty())
        .unwrap();

    let (status, _, body) = send_raw(&app.router, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "AUTH_REQUIRED");
}

#[tokio::test]
async fn test_public_paths_ignore_bad_tokens() {
    let app = test_app();

    let (status, _, docs) =
        send_request(&app.router, Method::GET, "/v3/api-docs", None, Some("garbage")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(docs["paths"]["/auth/login"].is_object());

    let (status, _, health) =
        send_request(&app.router, Method::GET, "/health", None, Some("garbage")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");

    register(&app.router, "a@x.com", "Ana", "s3cret").await;
    let (status, _, _) = send_request(
        &app.router,
        Method::POST,
        "/auth/login",
        Some(serde_json::json!({ "identityKey": "a@x.com", "secret": "s3cret" })),
        Some("garbage"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_concurrent_api_registration_keeps_one_record() {
    let app = test_app();

    let mut handles = Vec::new();
    for i in 0..6 {
        let router = app.router.clone();
        handles.push(tokio::spawn(async move {
            register(&router, "race@x.com", &format!("Racer {i}"), "s3cret")
                .await
                .0
        }));
    }

    let mut statuses = Vec::new();
    for handle in handles {
        statuses.push(handle.await.unwrap());
    }

    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::OK).count(), 1);
    assert_eq!(
        statuses
            .iter()
            .filter(|s| **s == StatusCode::BAD_REQUEST)
            .count(),
        5
    );
    assert_eq!(app.store.len().await, 1);
}

mod common;

use auth_service::services::RevocationStore;
use axum::http::{Method, StatusCode};
use chrono::Utc;
use common::spawn_app;

#[tokio::test]
async fn test_public_paths_pass_without_token_in_both_url_forms() {
    let rig = spawn_app(Some("/api"));

    for uri in [
        "/health",
        "/api/health",
        "/.well-known/openapi.json",
        "/api/.well-known/openapi.json",
    ] {
        let (status, _) = rig.request(Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
    }

    // Public POST routes must reach the handler (and fail on their own
    // terms), not bounce off the gate with 401.
    let (status, _) = rig
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(serde_json::json!({ "email": "nobody@example.com", "password": "wrong-pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, body) = rig
        .request(
            Method::POST,
            "/auth/introspect",
            None,
            Some(serde_json::json!({ "token": "garbage" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active"], false);
}

#[tokio::test]
async fn test_protected_path_without_token_is_401() {
    let rig = spawn_app(None);
    let (status, _) = rig.request(Method::GET, "/users/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_path_with_malformed_token_is_401() {
    let rig = spawn_app(None);
    let (status, _) = rig
        .request(Method::GET, "/users/me", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_valid_token_reaches_handler_with_identity() {
    let rig = spawn_app(Some("/api"));
    let tokens = rig.signed_in_user("exporter@example.com", "password123").await;

    for uri in ["/users/me", "/api/users/me"] {
        let (status, body) = rig
            .request(Method::GET, uri, Some(&tokens.access_token), None)
            .await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body["email"], "exporter@example.com");
        assert!(body.get("password_hash").is_none());
    }
}

#[tokio::test]
async fn test_revoked_token_is_rejected_by_the_gate() {
    let rig = spawn_app(None);
    let tokens = rig.signed_in_user("exporter@example.com", "password123").await;

    let (status, _) = rig
        .request(Method::GET, "/users/me", Some(&tokens.access_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let claims = rig.jwt.validate_access_token(&tokens.access_token).unwrap();
    rig.revocations
        .revoke_token(&claims.jti, Utc::now() + chrono::Duration::hours(1))
        .await
        .unwrap();

    let (status, _) = rig
        .request(Method::GET, "/users/me", Some(&tokens.access_token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_revocation_store_outage_fails_closed_with_503() {
    let rig = spawn_app(None);
    let tokens = rig.signed_in_user("exporter@example.com", "password123").await;

    rig.revocations.set_unavailable(true);

    // The gate must not let the request through on an unanswerable
    // revocation check, and must not misreport it as a credential problem.
    let (status, _) = rig
        .request(Method::GET, "/users/me", Some(&tokens.access_token), None)
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    rig.revocations.set_unavailable(false);
    let (status, _) = rig
        .request(Method::GET, "/users/me", Some(&tokens.access_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_trailing_slash_does_not_change_classification() {
    let rig = spawn_app(None);

    // The router itself does not match "/health/", but the gate must still
    // classify it as public: no 401, just an unmatched route.
    let (status, _) = rig.request(Method::GET, "/health/", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // And a protected path keeps its protection with a trailing slash.
    let (status, _) = rig.request(Method::GET, "/users/me/", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

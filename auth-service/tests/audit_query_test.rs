mod common;

use auth_service::models::{Role, User};
use auth_service::services::CredentialStore;
use axum::http::{Method, StatusCode};
use common::spawn_app;

async fn admin_token(rig: &common::TestApp) -> String {
    let hash = auth_service::utils::hash_password(&auth_service::utils::Password::new(
        "admin-pass-123".to_string(),
    ))
    .unwrap();
    let admin = User::new(
        "admin@example.com".to_string(),
        hash.into_string(),
        None,
        None,
        Role::Admin,
    );
    rig.users.insert(&admin).await.unwrap();

    rig.state
        .auth_service
        .login(
            serde_json::from_value(serde_json::json!({
                "email": "admin@example.com",
                "password": "admin-pass-123"
            }))
            .unwrap(),
            None,
        )
        .await
        .unwrap()
        .access_token
}

#[tokio::test]
async fn test_audit_query_is_admin_only() {
    let rig = spawn_app(None);
    let user_tokens = rig.signed_in_user("exporter@example.com", "password123").await;

    let (status, _) = rig
        .request(
            Method::GET,
            "/audit/events",
            Some(&user_tokens.access_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = admin_token(&rig).await;
    let (status, body) = rig
        .request(Method::GET, "/audit/events", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().is_some());
}

#[tokio::test]
async fn test_audit_query_filters_and_orders_newest_first() {
    let rig = spawn_app(None);
    // Two logins by the user, one by the admin.
    let user_tokens = rig.signed_in_user("exporter@example.com", "password123").await;
    let claims = rig.jwt.validate_access_token(&user_tokens.access_token).unwrap();
    rig.state
        .auth_service
        .login(
            serde_json::from_value(serde_json::json!({
                "email": "exporter@example.com",
                "password": "password123"
            }))
            .unwrap(),
            None,
        )
        .await
        .unwrap();

    let admin = admin_token(&rig).await;
    let uri = format!("/audit/events?actor_id={}&action=login", claims.sub);
    let (status, body) = rig.request(Method::GET, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);

    let events = body.as_array().unwrap();
    assert_eq!(events.len(), 2);
    assert!(events
        .iter()
        .all(|e| e["actor_id"] == claims.sub.as_str() && e["action"] == "login"));
    let first = chrono::DateTime::parse_from_rfc3339(events[0]["created_at"].as_str().unwrap())
        .unwrap();
    let second = chrono::DateTime::parse_from_rfc3339(events[1]["created_at"].as_str().unwrap())
        .unwrap();
    assert!(first >= second);
}

#[tokio::test]
async fn test_audit_query_limit_is_clamped() {
    let rig = spawn_app(None);
    let admin = admin_token(&rig).await;

    let (status, body) = rig
        .request(
            Method::GET,
            "/audit/events?limit=100000",
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().is_some());
}

mod common;

use auth_service::models::AuditAction;
use axum::http::{Method, StatusCode};
use chrono::Utc;
use common::spawn_app;

#[tokio::test]
async fn test_masked_read_discloses_nothing_and_writes_no_audit_event() {
    let rig = spawn_app(None);
    let tokens = rig.signed_in_user("exporter@example.com", "password123").await;
    rig.seed_shipment("ship_42", "12345678901234", "HDFC0001234");

    let (status, body) = rig
        .request(
            Method::GET,
            "/shipments/ship_42/bank-details",
            Some(&tokens.access_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bank_account"], "**********1234");
    assert_eq!(body["bank_ifsc"], "********234");

    let events = rig.audit_store.events();
    assert!(events.iter().all(|e| e.action != AuditAction::PiiUnmask));
}

#[tokio::test]
async fn test_unmask_writes_exactly_one_audit_event_before_responding() {
    let rig = spawn_app(None);
    let tokens = rig.signed_in_user("exporter@example.com", "password123").await;
    rig.seed_shipment("ship_42", "12345678901234", "HDFC0001234");

    let start = Utc::now();
    let (status, body) = rig
        .request(
            Method::GET,
            "/shipments/ship_42/bank-details/unmasked",
            Some(&tokens.access_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bank_account"], "12345678901234");
    assert_eq!(body["bank_ifsc"], "HDFC0001234");

    let claims = rig.jwt.validate_access_token(&tokens.access_token).unwrap();
    let events: Vec<_> = rig
        .audit_store
        .events()
        .into_iter()
        .filter(|e| e.action == AuditAction::PiiUnmask)
        .collect();
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.actor_id, claims.sub);
    assert_eq!(event.resource_type, "shipment");
    assert_eq!(event.resource_id, "ship_42");
    assert_eq!(event.accessed_fields, vec!["bank_account", "bank_ifsc"]);
    assert!(event.created_at >= start);
}

#[tokio::test]
async fn test_unmask_fails_closed_when_the_audit_write_fails() {
    let rig = spawn_app(None);
    let tokens = rig.signed_in_user("exporter@example.com", "password123").await;
    rig.seed_shipment("ship_42", "12345678901234", "HDFC0001234");
    rig.audit_store.set_fail_writes(true);

    let (status, body) = rig
        .request(
            Method::GET,
            "/shipments/ship_42/bank-details/unmasked",
            Some(&tokens.access_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(!body.to_string().contains("12345678901234"));
}

#[tokio::test]
async fn test_unmask_of_unknown_shipment_is_404_without_audit_event() {
    let rig = spawn_app(None);
    let tokens = rig.signed_in_user("exporter@example.com", "password123").await;

    let (status, _) = rig
        .request(
            Method::GET,
            "/shipments/missing/bank-details/unmasked",
            Some(&tokens.access_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let events = rig.audit_store.events();
    assert!(events.iter().all(|e| e.action != AuditAction::PiiUnmask));
}

//! Audit event model - tamper-evident record of sensitive access.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Audited actions. Closed set; `PiiUnmask` is the only action that carries
/// an accessed-fields list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    PiiUnmask,
    Login,
    Logout,
    PasswordChange,
    TokenRefresh,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::PiiUnmask => "pii_unmask",
            AuditAction::Login => "login",
            AuditAction::Logout => "logout",
            AuditAction::PasswordChange => "password_change",
            AuditAction::TokenRefresh => "token_refresh",
        }
    }
}

/// Append-only audit event. Never mutated or deleted by this core.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditEvent {
    #[serde(rename = "_id")]
    pub id: String,

    /// Subject that performed the action
    pub actor_id: String,

    pub action: AuditAction,

    pub resource_type: String,

    pub resource_id: String,

    /// Field names revealed, in response order. Empty except for pii_unmask.
    #[serde(default)]
    pub accessed_fields: Vec<String>,

    pub ip_address: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        actor_id: String,
        action: AuditAction,
        resource_type: String,
        resource_id: String,
        ip_address: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            actor_id,
            action,
            resource_type,
            resource_id,
            accessed_fields: Vec::new(),
            ip_address,
            created_at: Utc::now(),
        }
    }

    /// Event for an explicit PII disclosure, listing exactly the field names
    /// revealed in the response body, in order.
    pub fn pii_unmask(
        actor_id: String,
        resource_type: String,
        resource_id: String,
        accessed_fields: Vec<String>,
        ip_address: Option<String>,
    ) -> Self {
        let mut event = Self::new(
            actor_id,
            AuditAction::PiiUnmask,
            resource_type,
            resource_id,
            ip_address,
        );
        event.accessed_fields = accessed_fields;
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&AuditAction::PiiUnmask).unwrap(),
            "\"pii_unmask\""
        );
        assert_eq!(AuditAction::PasswordChange.as_str(), "password_change");
    }

    #[test]
    fn test_unmask_event_carries_ordered_fields() {
        let event = AuditEvent::pii_unmask(
            "user_1".to_string(),
            "shipment".to_string(),
            "ship_42".to_string(),
            vec!["bank_account".to_string(), "bank_ifsc".to_string()],
            Some("10.0.0.1".to_string()),
        );
        assert_eq!(event.action, AuditAction::PiiUnmask);
        assert_eq!(event.accessed_fields, vec!["bank_account", "bank_ifsc"]);
    }

    #[test]
    fn test_non_unmask_event_has_no_fields() {
        let event = AuditEvent::new(
            "user_1".to_string(),
            AuditAction::Login,
            "session".to_string(),
            "user_1".to_string(),
            None,
        );
        assert!(event.accessed_fields.is_empty());
    }
}

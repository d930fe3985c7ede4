use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::{audit::AuditQuery, ErrorResponse},
    middleware::AuthUser,
    models::{AuditEvent, Role},
    services::{AuditFilter, Page},
    AppState,
};

/// Query the audit trail, newest first. Admin only.
#[utoipa::path(
    get,
    path = "/audit/events",
    params(AuditQuery),
    responses(
        (status = 200, description = "Matching audit events, newest first", body = [AuditEvent]),
        (status = 401, description = "Invalid token", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    ),
    tag = "Audit",
    security(("bearer_auth" = []))
)]
pub async fn list_events(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<AuditQuery>,
) -> Result<impl IntoResponse, AppError> {
    state
        .auth_service
        .require_role(user.user_id(), Role::Admin)
        .await?;

    let filter = AuditFilter {
        actor_id: query.actor_id,
        action: query.action,
        resource_type: query.resource_type,
        resource_id: query.resource_id,
    };
    let page = Page::clamped(query.limit, query.offset);

    let events = state.audit.query(&filter, page).await?;
    Ok(Json(events))
}

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::{
    dtos::{auth::ChangePasswordRequest, ErrorResponse},
    middleware::{AuthUser, ClientIp},
    utils::ValidatedJson,
    AppState,
};

/// Change the caller's password.
///
/// Writes the subject watermark: every token issued before this instant is
/// invalidated, across all sessions.
#[utoipa::path(
    post,
    path = "/users/me/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed; prior sessions invalidated"),
        (status = 401, description = "Current password incorrect", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 503, description = "Backing store unavailable", body = ErrorResponse)
    ),
    tag = "User",
    security(("bearer_auth" = []))
)]
pub async fn change_password(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    AuthUser(user): AuthUser,
    ValidatedJson(req): ValidatedJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .auth_service
        .change_password(user.user_id(), req.current_password, req.new_password, ip)
        .await?;
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "message": "Password changed successfully"
        })),
    ))
}

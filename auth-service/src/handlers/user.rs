use axum::{extract::State, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::{dtos::ErrorResponse, middleware::AuthUser, models::SanitizedUser, AppState};

/// Get the caller's sanitized profile
#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "Current user profile", body = SanitizedUser),
        (status = 401, description = "Invalid token", body = ErrorResponse)
    ),
    tag = "User",
    security(("bearer_auth" = []))
)]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let profile = state.auth_service.find_user(user.user_id()).await?;
    Ok(Json(profile))
}

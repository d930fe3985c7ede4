use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::ErrorResponse,
    middleware::{AuthUser, ClientIp},
    models::{AuditEvent, BankDetails},
    AppState,
};

const UNMASKED_FIELDS: [&str; 2] = ["bank_account", "bank_ifsc"];

/// Get a shipment's counterpart bank details, masked
#[utoipa::path(
    get,
    path = "/shipments/{id}/bank-details",
    params(("id" = String, Path, description = "Shipment id")),
    responses(
        (status = 200, description = "Masked bank details", body = BankDetails),
        (status = 401, description = "Invalid token", body = ErrorResponse),
        (status = 404, description = "Shipment not found", body = ErrorResponse)
    ),
    tag = "Shipments",
    security(("bearer_auth" = []))
)]
pub async fn bank_details(
    State(state): State<AppState>,
    Path(shipment_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let record = state
        .shipments
        .find_bank_record(&shipment_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Shipment not found")))?;

    Ok(Json(record.buyer_bank.masked()))
}

/// Get a shipment's counterpart bank details, unmasked.
///
/// The pii_unmask audit event must be durably written before the unmasked
/// body is produced; if the write fails the caller gets 503 and no data.
#[utoipa::path(
    get,
    path = "/shipments/{id}/bank-details/unmasked",
    params(("id" = String, Path, description = "Shipment id")),
    responses(
        (status = 200, description = "Unmasked bank details", body = BankDetails),
        (status = 401, description = "Invalid token", body = ErrorResponse),
        (status = 404, description = "Shipment not found", body = ErrorResponse),
        (status = 503, description = "Audit trail unavailable", body = ErrorResponse)
    ),
    tag = "Shipments",
    security(("bearer_auth" = []))
)]
pub async fn bank_details_unmasked(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    AuthUser(user): AuthUser,
    Path(shipment_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let record = state
        .shipments
        .find_bank_record(&shipment_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Shipment not found")))?;

    // Audit first. Only after the write lands does the unmasked data leave
    // the process.
    state
        .audit
        .record_required(AuditEvent::pii_unmask(
            user.user_id().to_string(),
            "shipment".to_string(),
            shipment_id,
            UNMASKED_FIELDS.iter().map(|f| f.to_string()).collect(),
            ip,
        ))
        .await?;

    Ok(Json(record.buyer_bank))
}

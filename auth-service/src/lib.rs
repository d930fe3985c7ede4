pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Json, Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    security_headers::security_headers_middleware, tracing::request_id_middleware,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{openapi::security::SecurityScheme, Modify, OpenApi};

use crate::config::AuthConfig;
use crate::middleware::{request_gate, PathPolicy};
use crate::services::{
    AuditService, AuthService, CredentialStore, JwtService, RefreshTokenStore, RevocationStore,
    ShipmentDirectory,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::auth::registration::register,
        handlers::auth::session::login,
        handlers::auth::session::logout,
        handlers::auth::session::refresh,
        handlers::auth::session::introspect,
        handlers::auth::password::change_password,
        handlers::user::get_me,
        handlers::audit::list_events,
        handlers::pii::bank_details,
        handlers::pii::bank_details_unmasked,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::auth::RegisterRequest,
            dtos::auth::RegisterResponse,
            dtos::auth::LoginRequest,
            dtos::auth::LogoutRequest,
            dtos::auth::RefreshRequest,
            dtos::auth::IntrospectRequest,
            dtos::auth::IntrospectResponse,
            dtos::auth::ChangePasswordRequest,
            services::TokenResponse,
            models::Role,
            models::SanitizedUser,
            models::AuditAction,
            models::AuditEvent,
            models::BankDetails,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "User authentication and token lifecycle"),
        (name = "User", description = "User profile management"),
        (name = "Audit", description = "Access audit trail"),
        (name = "Shipments", description = "Shipment counterpart bank details"),
        (name = "Observability", description = "Service health"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: AuthConfig,
    pub jwt: JwtService,
    pub auth_service: AuthService,
    pub audit: AuditService,
    pub users: Arc<dyn CredentialStore>,
    pub refresh_tokens: Arc<dyn RefreshTokenStore>,
    pub revocations: Arc<dyn RevocationStore>,
    pub shipments: Arc<dyn ShipmentDirectory>,
    pub path_policy: PathPolicy,
}

pub fn build_router(state: AppState) -> Result<Router, AppError> {
    // One route table. Public vs protected is decided by the gate from the
    // canonical path rules, not by which sub-router a route landed in.
    let routes = Router::new()
        .route("/health", get(health_check))
        .route(
            "/.well-known/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/refresh", post(handlers::auth::refresh))
        .route("/auth/introspect", post(handlers::auth::introspect))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/users/me", get(handlers::user::get_me))
        .route(
            "/users/me/password",
            post(handlers::auth::change_password),
        )
        .route("/audit/events", get(handlers::audit::list_events))
        .route(
            "/shipments/:id/bank-details",
            get(handlers::pii::bank_details),
        )
        .route(
            "/shipments/:id/bank-details/unmasked",
            get(handlers::pii::bank_details_unmasked),
        );

    // When a mount prefix is configured the same routes answer under both
    // URL forms; the gate normalizes before classifying either way.
    let routes = match &state.config.routing.base_path {
        Some(base) => Router::new().merge(routes.clone()).nest(base, routes),
        None => routes,
    };

    let cors_origins = state
        .config
        .security
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!(origin = %origin, error = %e, "Invalid CORS origin, skipping");
                None
            }
        })
        .collect::<Vec<HeaderValue>>();

    let app = routes
        .layer(from_fn_with_state(state.clone(), request_gate))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(cors_origins)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        );

    Ok(app)
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 503, description = "A backing store is unavailable")
    ),
    tag = "Observability"
)]
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.users.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Credential store health check failed");
        e
    })?;
    state.refresh_tokens.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Refresh token store health check failed");
        e
    })?;
    state.revocations.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Revocation store health check failed");
        e
    })?;
    state.audit.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Audit store health check failed");
        e
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "checks": {
            "credentials": "up",
            "refresh_tokens": "up",
            "revocations": "up",
            "audit": "up"
        }
    })))
}

use axum::{
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use chrono::{DateTime, TimeZone, Utc};
use std::net::SocketAddr;

use crate::{
    dtos::ErrorResponse,
    middleware::path_policy::Access,
    services::{AccessTokenClaims, AuthError},
    AppState,
};
use service_core::error::AppError;

/// Authenticated identity attached to a request by the gate. Immutable:
/// fields are private and handlers only get read access.
#[derive(Debug, Clone)]
pub struct AuthContext {
    user_id: String,
    email: String,
    token_id: String,
    issued_at: DateTime<Utc>,
}

impl AuthContext {
    fn from_claims(claims: &AccessTokenClaims) -> Result<Self, AuthError> {
        let issued_at = Utc
            .timestamp_opt(claims.iat, 0)
            .single()
            .ok_or(AuthError::Invalid)?;
        Ok(Self {
            user_id: claims.sub.clone(),
            email: claims.email.clone(),
            token_id: claims.jti.clone(),
            issued_at,
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn token_id(&self) -> &str {
        &self.token_id
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }
}

/// Request gate: runs in front of every route.
///
/// Public paths pass through with no identity; protected paths must carry a
/// valid, unrevoked bearer token or are rejected before any handler runs.
/// Store failures reject with 503, never pass through.
pub async fn request_gate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if state.path_policy.classify(req.uri().path()) == Access::Public {
        return Ok(next.run(req).await);
    }

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    let token = match token {
        Some(token) => token,
        None => {
            return Err(AppError::Unauthorized(anyhow::anyhow!(
                "Missing or invalid Authorization header"
            )));
        }
    };

    let claims = state.auth_service.validate_access(token).await?;
    let context = AuthContext::from_claims(&claims)?;

    // Claims stay available for handlers that need the raw token metadata;
    // the context is the read-only identity handed to business code.
    req.extensions_mut().insert(claims);
    req.extensions_mut().insert(context);

    Ok(next.run(req).await)
}

/// Extractor for the authenticated identity on protected routes.
pub struct AuthUser(pub AuthContext);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let context = parts.extensions.get::<AuthContext>().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Identity context missing from request extensions".to_string(),
            }),
        ))?;

        Ok(AuthUser(context.clone()))
    }
}

/// Extractor for the raw access token claims (logout needs jti and exp).
pub struct AuthClaims(pub AccessTokenClaims);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthClaims
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts.extensions.get::<AccessTokenClaims>().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Auth claims missing from request extensions".to_string(),
            }),
        ))?;

        Ok(AuthClaims(claims.clone()))
    }
}

/// Best-effort caller network address: forwarded header first, then the
/// socket peer if the server was built with connect info.
pub struct ClientIp(pub Option<String>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(|value| value.trim().to_string());

        let ip = forwarded.or_else(|| {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        });

        Ok(ClientIp(ip))
    }
}

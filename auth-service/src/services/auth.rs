use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;

use crate::{
    dtos::auth::{IntrospectResponse, LoginRequest, RegisterRequest, RegisterResponse},
    models::{AuditAction, AuditEvent, RefreshToken, Role, SanitizedUser, User},
    services::{
        audit::AuditService,
        credentials::CredentialStore,
        error::AuthError,
        jwt::{AccessTokenClaims, JwtService, TokenResponse},
        refresh::{ClaimOutcome, RefreshTokenStore},
        revocation::RevocationStore,
    },
    utils::{hash_password, verify_password, Password, PasswordHashString},
};

/// Authentication core: issuance, validation, rotation, revocation.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn CredentialStore>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    revocations: Arc<dyn RevocationStore>,
    audit: AuditService,
    jwt: JwtService,
    refresh_token_expiry_days: i64,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn CredentialStore>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        revocations: Arc<dyn RevocationStore>,
        audit: AuditService,
        jwt: JwtService,
        refresh_token_expiry_days: i64,
    ) -> Self {
        Self {
            users,
            refresh_tokens,
            revocations,
            audit,
            jwt,
            refresh_token_expiry_days,
        }
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<RegisterResponse, AuthError> {
        if self.users.find_by_email(&req.email).await?.is_some() {
            return Err(AuthError::EmailAlreadyRegistered);
        }

        let password_hash = hash_password(&Password::new(req.password))
            .map_err(|e| AuthError::Internal(anyhow::anyhow!("Password hashing error: {}", e)))?;

        let user = User::new(
            req.email,
            password_hash.into_string(),
            req.name,
            req.company_id,
            Role::User,
        );

        self.users.insert(&user).await?;

        tracing::info!(user_id = %user.id, "User registered");

        Ok(RegisterResponse {
            user_id: user.id,
            message: "Registration successful".to_string(),
        })
    }

    pub async fn login(
        &self,
        req: LoginRequest,
        ip_address: Option<String>,
    ) -> Result<TokenResponse, AuthError> {
        // A missing user and a wrong password are indistinguishable to the
        // caller.
        let user = self
            .users
            .find_by_email(&req.email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(
            &Password::new(req.password),
            &PasswordHashString::new(user.password_hash.clone()),
        )
        .map_err(|_| AuthError::InvalidCredentials)?;

        let tokens = self.issue_token_pair(&user.id, &user.email).await?;

        self.audit
            .record_best_effort(AuditEvent::new(
                user.id.clone(),
                AuditAction::Login,
                "session".to_string(),
                user.id.clone(),
                ip_address,
            ))
            .await;

        Ok(tokens)
    }

    /// Validate an access token: signature, expiry, then the revocation
    /// store (watermark dominates the per-token check). Side-effect-free.
    pub async fn validate_access(&self, token: &str) -> Result<AccessTokenClaims, AuthError> {
        let claims = self.jwt.validate_access_token(token)?;
        let issued_at = timestamp_to_datetime(claims.iat)?;

        if self
            .revocations
            .is_revoked(&claims.jti, &claims.sub, issued_at)
            .await?
        {
            return Err(AuthError::Revoked);
        }

        Ok(claims)
    }

    /// Rotate a refresh token: one-time use, enforced by an atomic claim.
    ///
    /// Any presentation of a token that is missing or already used is
    /// treated as replay and revokes the subject's entire token family
    /// before the rejection is returned.
    pub async fn rotate_refresh(
        &self,
        refresh_token: &str,
        ip_address: Option<String>,
    ) -> Result<TokenResponse, AuthError> {
        let claims = self.jwt.validate_refresh_token(refresh_token)?;

        let record = match self.refresh_tokens.claim(&claims.jti).await? {
            ClaimOutcome::Claimed(record) => record,
            ClaimOutcome::AlreadyUsed(_) | ClaimOutcome::NotFound => {
                return Err(self.handle_replay(&claims.sub).await);
            }
        };

        // The claim matched on jti alone; the hash binds the presented
        // string to the stored record.
        if record.token_hash != RefreshToken::hash_token(refresh_token)
            || record.user_id != claims.sub
        {
            return Err(self.handle_replay(&claims.sub).await);
        }

        if record.is_expired() {
            return Err(AuthError::Expired);
        }

        let tokens = self.issue_token_pair(&claims.sub, &self.subject_email(&claims.sub).await?).await?;

        self.audit
            .record_best_effort(AuditEvent::new(
                claims.sub.clone(),
                AuditAction::TokenRefresh,
                "session".to_string(),
                claims.jti.clone(),
                ip_address,
            ))
            .await;

        Ok(tokens)
    }

    /// Logout one session: mark the presented refresh token used and revoke
    /// the presented access token's jti. Other sessions of the same subject
    /// stay valid.
    pub async fn logout(
        &self,
        refresh_token: String,
        access_claims: &AccessTokenClaims,
        ip_address: Option<String>,
    ) -> Result<(), AuthError> {
        let refresh_claims = self.jwt.validate_refresh_token(&refresh_token)?;
        if refresh_claims.sub != access_claims.sub {
            return Err(AuthError::Invalid);
        }

        // Idempotent: logging out an already-consumed session is fine.
        let _ = self.refresh_tokens.claim(&refresh_claims.jti).await?;

        let access_expires = timestamp_to_datetime(access_claims.exp)?;
        self.revocations
            .revoke_token(&access_claims.jti, access_expires)
            .await?;

        self.audit
            .record_best_effort(AuditEvent::new(
                access_claims.sub.clone(),
                AuditAction::Logout,
                "session".to_string(),
                access_claims.jti.clone(),
                ip_address,
            ))
            .await;

        tracing::info!(user_id = %access_claims.sub, "User logged out");
        Ok(())
    }

    /// Change password and invalidate every token issued before this
    /// instant via the subject watermark.
    pub async fn change_password(
        &self,
        user_id: &str,
        current_password: String,
        new_password: String,
        ip_address: Option<String>,
    ) -> Result<(), AuthError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        verify_password(
            &Password::new(current_password),
            &PasswordHashString::new(user.password_hash.clone()),
        )
        .map_err(|_| AuthError::InvalidCredentials)?;

        let new_hash = hash_password(&Password::new(new_password))
            .map_err(|e| AuthError::Internal(anyhow::anyhow!("Password hashing error: {}", e)))?;

        self.users
            .update_password_hash(user_id, new_hash.as_str())
            .await?;

        self.revocations
            .revoke_all_for_subject(user_id, Utc::now())
            .await?;

        self.audit
            .record_best_effort(AuditEvent::new(
                user_id.to_string(),
                AuditAction::PasswordChange,
                "user".to_string(),
                user_id.to_string(),
                ip_address,
            ))
            .await;

        tracing::info!(user_id = %user_id, "Password changed; prior sessions invalidated");
        Ok(())
    }

    /// Token introspection. Never errors; an unusable token is inactive.
    pub async fn introspect(&self, token: String) -> IntrospectResponse {
        match self.validate_access(&token).await {
            Ok(claims) => IntrospectResponse {
                active: true,
                sub: Some(claims.sub),
                email: Some(claims.email),
                exp: Some(claims.exp),
                iat: Some(claims.iat),
                jti: Some(claims.jti),
            },
            Err(_) => IntrospectResponse {
                active: false,
                sub: None,
                email: None,
                exp: None,
                iat: None,
                jti: None,
            },
        }
    }

    pub async fn find_user(&self, user_id: &str) -> Result<SanitizedUser, AuthError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        Ok(user.into())
    }

    pub async fn require_role(&self, user_id: &str, required: Role) -> Result<(), AuthError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        match (user.role, required) {
            (Role::Admin, _) => Ok(()),
            (Role::User, Role::User) => Ok(()),
            (Role::User, Role::Admin) => Err(AuthError::Forbidden),
        }
    }

    async fn issue_token_pair(
        &self,
        user_id: &str,
        email: &str,
    ) -> Result<TokenResponse, AuthError> {
        let (access_token, _claims) = self.jwt.generate_access_token(user_id, email)?;

        let refresh_token_id = uuid::Uuid::new_v4().to_string();
        let refresh_token_str = self
            .jwt
            .generate_refresh_token(user_id, &refresh_token_id)?;

        let refresh_token = RefreshToken::new_with_id(
            refresh_token_id,
            user_id.to_string(),
            &refresh_token_str,
            self.refresh_token_expiry_days,
        );

        // If this insert fails, neither token reaches the caller.
        self.refresh_tokens.insert(&refresh_token).await?;

        Ok(TokenResponse {
            access_token,
            refresh_token: refresh_token_str,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt.access_token_expiry_seconds(),
        })
    }

    async fn subject_email(&self, user_id: &str) -> Result<String, AuthError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        Ok(user.email)
    }

    /// Replay handling: fail closed by revoking the subject's whole token
    /// family before returning the rejection.
    async fn handle_replay(&self, subject: &str) -> AuthError {
        tracing::warn!(user_id = %subject, "Refresh token replay detected; revoking token family");
        match self
            .revocations
            .revoke_all_for_subject(subject, Utc::now())
            .await
        {
            Ok(()) => AuthError::ReplayDetected,
            // If the watermark cannot be written the rejection stands, but
            // the caller sees the store failure.
            Err(_) => AuthError::ServiceUnavailable,
        }
    }
}

fn timestamp_to_datetime(ts: i64) -> Result<DateTime<Utc>, AuthError> {
    Utc.timestamp_opt(ts, 0)
        .single()
        .ok_or(AuthError::Invalid)
}

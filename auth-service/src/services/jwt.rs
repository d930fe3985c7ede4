use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::services::error::AuthError;

/// JWT service for token generation and validation.
///
/// Signs with a process-wide symmetric secret (HS256); the secret and
/// algorithm come from the immutable configuration built at startup.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expiry_minutes: i64,
    refresh_token_expiry_days: i64,
}

/// Claims for access tokens (short-lived, stateless)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Email
    pub email: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// JWT ID (checked against the revocation store)
    pub jti: String,
}

/// Claims for refresh tokens (long-lived, stateful)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Token ID (matches the persisted record)
    pub jti: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// Token response returned to the client
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.signing_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.signing_secret.as_bytes()),
            access_token_expiry_minutes: config.access_token_expiry_minutes,
            refresh_token_expiry_days: config.refresh_token_expiry_days,
        }
    }

    /// Generate an access token for a user
    pub fn generate_access_token(
        &self,
        user_id: &str,
        email: &str,
    ) -> Result<(String, AccessTokenClaims), AuthError> {
        let now = Utc::now();
        let exp = now + Duration::minutes(self.access_token_expiry_minutes);

        let claims = AccessTokenClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let header = Header::new(Algorithm::HS256);
        let token = encode(&header, &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(anyhow::anyhow!("Failed to encode access token: {}", e)))?;

        Ok((token, claims))
    }

    /// Generate a refresh token for a user with a specific token id
    pub fn generate_refresh_token(
        &self,
        user_id: &str,
        token_id: &str,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now + Duration::days(self.refresh_token_expiry_days);

        let claims = RefreshTokenClaims {
            sub: user_id.to_string(),
            jti: token_id.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        let header = Header::new(Algorithm::HS256);
        let token = encode(&header, &claims, &self.encoding_key).map_err(|e| {
            AuthError::Internal(anyhow::anyhow!("Failed to encode refresh token: {}", e))
        })?;

        Ok(token)
    }

    /// Validate and decode an access token.
    ///
    /// Expiry failures map to `Expired`; everything else about the token
    /// itself (malformed, bad signature, wrong algorithm) maps to `Invalid`.
    pub fn validate_access_token(&self, token: &str) -> Result<AccessTokenClaims, AuthError> {
        let token_data = decode::<AccessTokenClaims>(token, &self.decoding_key, &validation())
            .map_err(classify_decode_error)?;

        Ok(token_data.claims)
    }

    /// Validate and decode a refresh token
    pub fn validate_refresh_token(&self, token: &str) -> Result<RefreshTokenClaims, AuthError> {
        let token_data = decode::<RefreshTokenClaims>(token, &self.decoding_key, &validation())
            .map_err(classify_decode_error)?;

        Ok(token_data.claims)
    }

    /// Get access token expiry in seconds (for client info)
    pub fn access_token_expiry_seconds(&self) -> i64 {
        self.access_token_expiry_minutes * 60
    }
}

/// HS256 with no expiry leeway: a token is dead at its own `exp` instant.
fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation
}

fn classify_decode_error(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
        _ => AuthError::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service(access_minutes: i64) -> JwtService {
        JwtService::new(&JwtConfig {
            signing_secret: "0123456789abcdef0123456789abcdef".to_string(),
            access_token_expiry_minutes: access_minutes,
            refresh_token_expiry_days: 30,
        })
    }

    #[test]
    fn test_access_token_generation_and_validation() {
        let service = test_service(1440);

        let (token, claims) = service
            .generate_access_token("user_123", "test@example.com")
            .unwrap();
        assert!(!token.is_empty());
        assert!(!claims.jti.is_empty());

        let decoded = service.validate_access_token(&token).unwrap();
        assert_eq!(decoded.sub, "user_123");
        assert_eq!(decoded.email, "test@example.com");
        assert_eq!(decoded.jti, claims.jti);
    }

    #[test]
    fn test_refresh_token_generation_and_validation() {
        let service = test_service(1440);

        let token = service
            .generate_refresh_token("user_123", "token_abc")
            .unwrap();

        let claims = service.validate_refresh_token(&token).unwrap();
        assert_eq!(claims.sub, "user_123");
        assert_eq!(claims.jti, "token_abc");
    }

    fn signed_access_token(exp: i64, iat: i64) -> String {
        let claims = AccessTokenClaims {
            sub: "user_123".to_string(),
            email: "test@example.com".to_string(),
            exp,
            iat,
            jti: "jti_1".to_string(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret("0123456789abcdef0123456789abcdef".as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_expired_token_is_expired_not_invalid() {
        let now = Utc::now();
        let token = signed_access_token(
            (now - Duration::seconds(5)).timestamp(),
            (now - Duration::minutes(10)).timestamp(),
        );

        let service = test_service(1440);
        let err = service.validate_access_token(&token).unwrap_err();
        assert!(matches!(err, AuthError::Expired));
    }

    #[test]
    fn test_no_grace_window_after_expiry() {
        // A well-signed token half a minute past its exp must not validate;
        // there is no acceptance window beyond the expiry instant.
        let now = Utc::now();
        let token = signed_access_token(
            (now - Duration::seconds(30)).timestamp(),
            (now - Duration::minutes(10)).timestamp(),
        );

        let service = test_service(1440);
        let err = service.validate_access_token(&token).unwrap_err();
        assert!(matches!(err, AuthError::Expired));
    }

    #[test]
    fn test_malformed_token_is_invalid() {
        let service = test_service(1440);
        let err = service.validate_access_token("not-a-jwt").unwrap_err();
        assert!(matches!(err, AuthError::Invalid));
    }

    #[test]
    fn test_tampered_signature_is_invalid() {
        let service = test_service(1440);
        let (token, _) = service
            .generate_access_token("user_123", "test@example.com")
            .unwrap();

        let other = JwtService::new(&JwtConfig {
            signing_secret: "ffffffffffffffffffffffffffffffff".to_string(),
            access_token_expiry_minutes: 1440,
            refresh_token_expiry_days: 30,
        });
        let err = other.validate_access_token(&token).unwrap_err();
        assert!(matches!(err, AuthError::Invalid));
    }

    #[test]
    fn test_wrong_algorithm_is_invalid_even_when_expired() {
        // Token signed with HS384 and an exp in the past: the algorithm
        // mismatch must win over the expiry.
        let now = Utc::now();
        let claims = AccessTokenClaims {
            sub: "user_123".to_string(),
            email: "test@example.com".to_string(),
            exp: (now - Duration::minutes(2)).timestamp(),
            iat: (now - Duration::minutes(10)).timestamp(),
            jti: "jti_1".to_string(),
        };
        let secret = "0123456789abcdef0123456789abcdef";
        let token = encode(
            &Header::new(Algorithm::HS384),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();

        let service = test_service(1440);
        let err = service.validate_access_token(&token).unwrap_err();
        assert!(matches!(err, AuthError::Invalid));
    }
}
